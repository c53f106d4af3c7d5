pub mod ai;
pub mod bom;
pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use bom::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.company.currency, "USD");
        assert_eq!(config.bom.high_cost_threshold, dec!(1.00));
        assert_eq!(config.bom.min_alternative_score, 0.85);
        assert_eq!(config.lifecycle.last_time_buy_warning_days, 90);
        assert_eq!(config.ai.provider, "disabled");
    }

    #[test]
    fn test_error_handling() {
        let error = SolderlineError::validation("test_field", "test message");
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(error.exit_code(), 65);

        let response = ErrorResponse::from(SolderlineError::not_found("snapshot rev-b"));
        assert_eq!(response.code, "NOT_FOUND");
        assert_eq!(response.error, "Not found: snapshot rev-b");
    }

    #[test]
    fn test_snapshot_error_conversion() {
        let error: SolderlineError =
            solderline_models::SnapshotError::DuplicateDesignators(vec!["R1".into()]).into();
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert!(error.to_string().contains("R1"));
    }
}
