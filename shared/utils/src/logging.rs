use anyhow::{Context, Result};
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

// stdout carries command output, so logs default to stderr
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(&config.level));
    let writer = log_writer(config.file_path.as_deref())?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE).with_writer(writer))
            .init(),
        "compact" => registry
            .with(fmt::layer().compact().with_target(false).with_writer(writer))
            .init(),
        _ => registry
            .with(fmt::layer().with_span_events(FmtSpan::CLOSE).with_writer(writer))
            .init(),
    }

    tracing::debug!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn log_writer(file_path: Option<&str>) -> Result<BoxMakeWriter> {
    match file_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        None => Ok(BoxMakeWriter::new(std::io::stderr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_falls_back_to_info() {
        assert_eq!(default_filter("debug").to_string(), "debug");
        assert_eq!(default_filter("solderline_utils=trace").to_string(), "solderline_utils=trace");
        assert_eq!(default_filter("solderline=loud").to_string(), "info");
    }

    #[test]
    fn test_log_writer_reports_unopenable_file() {
        let err = log_writer(Some("/nonexistent-dir/solderline.log")).err().expect("open should fail");
        assert!(err.to_string().contains("solderline.log"));
        assert!(log_writer(None).is_ok());
    }
}
