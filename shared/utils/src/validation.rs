use crate::config::{AppConfig, BomConfig, CompanyProfile};
use crate::error::{SolderlineError, SolderlineResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

static CURRENCY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

/// File extensions accepted for BOM import
pub const BOM_FILE_TYPES: &[&str] = &["csv", "xlsx", "xls", "xml"];

pub fn validate_model<T: Validate>(model: &T) -> SolderlineResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(SolderlineError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match (&error.message, error.code.as_ref()) {
                (Some(message), _) => message.to_string(),
                (None, "length") => format!("Length validation failed for field '{}'", field),
                (None, "range") => format!("Value out of range for field '{}'", field),
                (None, "required") => format!("Field '{}' is required", field),
                (None, code) => format!("Validation failed for field '{}': {}", field, code),
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

pub fn validate_file_type(file_name: &str, allowed_types: &[&str]) -> SolderlineResult<()> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !allowed_types.contains(&extension.to_lowercase().as_str()) {
        return Err(SolderlineError::validation(
            "file_type",
            format!("File type '{}' not allowed. Allowed types: {}", extension, allowed_types.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_currency_code(code: &str) -> SolderlineResult<()> {
    if !CURRENCY_CODE.is_match(code) {
        return Err(SolderlineError::validation(
            "currency",
            format!("'{}' is not an ISO 4217 currency code", code),
        ));
    }
    Ok(())
}

pub fn validate_company_profile(profile: &CompanyProfile) -> SolderlineResult<()> {
    if profile.name.trim().is_empty() {
        return Err(SolderlineError::validation("company.name", "Company name is required"));
    }
    validate_currency_code(&profile.currency)
}

pub fn validate_bom_config(config: &BomConfig) -> SolderlineResult<()> {
    if config.high_cost_threshold < Decimal::ZERO {
        return Err(SolderlineError::validation(
            "bom.high_cost_threshold",
            "High cost threshold must not be negative",
        ));
    }
    if !(0.0..=1.0).contains(&config.min_alternative_score) {
        return Err(SolderlineError::validation(
            "bom.min_alternative_score",
            "Minimum alternative score must be between 0.0 and 1.0",
        ));
    }
    Ok(())
}

/// Checks the settings the BOM tooling cannot run without
pub fn validate_app_config(config: &AppConfig) -> SolderlineResult<()> {
    validate_company_profile(&config.company)?;
    validate_bom_config(&config.bom)?;
    if config.lifecycle.last_time_buy_warning_days < 0 {
        return Err(SolderlineError::validation(
            "lifecycle.last_time_buy_warning_days",
            "Warning window must not be negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use solderline_models::PartCatalogEntry;

    #[test]
    fn test_validate_file_type() {
        assert!(validate_file_type("board.csv", BOM_FILE_TYPES).is_ok());
        assert!(validate_file_type("board.XLSX", BOM_FILE_TYPES).is_ok());
        assert!(validate_file_type("board.pdf", BOM_FILE_TYPES).is_err());
    }

    #[test]
    fn test_validate_currency_code() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("usd").is_err());
        assert!(validate_currency_code("EURO").is_err());
    }

    #[test]
    fn test_validate_model_reports_messages() {
        let part = PartCatalogEntry::new("", "resistor", "0603", dec!(0.01));
        let err = validate_model(&part).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("Manufacturer part number"));
    }

    #[test]
    fn test_validate_bom_config() {
        let mut config = BomConfig::default();
        assert!(validate_bom_config(&config).is_ok());

        config.min_alternative_score = 1.2;
        assert!(validate_bom_config(&config).is_err());

        config.min_alternative_score = 0.85;
        config.high_cost_threshold = dec!(-1);
        assert!(validate_bom_config(&config).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_app_config(&AppConfig::default()).is_ok());
    }
}
