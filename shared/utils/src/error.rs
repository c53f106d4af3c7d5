use serde::{Deserialize, Serialize};
use thiserror::Error;

use solderline_models::SnapshotError;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SolderlineError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("BOM parse error: {message}")]
    BomParse { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Unsupported capability: {provider} does not support {capability}")]
    UnsupportedCapability { provider: String, capability: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SolderlineError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn bom_parse(message: impl Into<String>) -> Self {
        Self::BomParse {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_capability(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::BomParse { .. } => "BOM_PARSE_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::UnsupportedCapability { .. } => "UNSUPPORTED_CAPABILITY",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Process exit status used by the command-line tools
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::BomParse { .. } => 65,
            Self::NotFound { .. } => 66,
            Self::Configuration { .. } => 78,
            Self::Database { .. } | Self::ExternalService { .. } => 69,
            Self::UnsupportedCapability { .. } | Self::Conflict { .. } | Self::Internal { .. } => 70,
        }
    }
}

pub type SolderlineResult<T> = Result<T, SolderlineError>;

/// Machine-readable error body printed by the command-line tools.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}

impl From<SolderlineError> for ErrorResponse {
    fn from(error: SolderlineError) -> Self {
        Self {
            code: error.error_code().to_string(),
            error: error.to_string(),
            details: None,
        }
    }
}

// Conversion from common error types
impl From<SnapshotError> for SolderlineError {
    fn from(error: SnapshotError) -> Self {
        match error {
            SnapshotError::DuplicateDesignators(_) => Self::validation("designator", error.to_string()),
            SnapshotError::UnknownDesignator(ref designator) => Self::not_found(format!("designator {}", designator)),
            SnapshotError::EmptyVersionLabel => Self::validation("version_label", error.to_string()),
        }
    }
}

impl From<sqlx::Error> for SolderlineError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string())
    }
}

impl From<reqwest::Error> for SolderlineError {
    fn from(error: reqwest::Error) -> Self {
        Self::external_service("HTTP Client", error.to_string())
    }
}

impl From<serde_json::Error> for SolderlineError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<csv::Error> for SolderlineError {
    fn from(error: csv::Error) -> Self {
        Self::bom_parse(error.to_string())
    }
}
