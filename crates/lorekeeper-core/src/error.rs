//! Error types for lorekeeper operations.
//!
//! Validation failures surface as typed errors the caller must handle.
//! "Not found" is never an error here: lookups and targeted mutations
//! report it through `Option`/`bool` results instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lorekeeper operations.
pub type LoreResult<T> = Result<T, LoreError>;

/// Main error type for all lorekeeper operations.
#[derive(Error, Debug)]
pub enum LoreError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// A lorefile or config file has an extension we cannot read or write.
    #[error("Unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Reading or writing a specific file failed.
    #[error("File error for {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Scheduler setup or lifecycle failure.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidTemplate,
    ValOutOfRange,
    ValNameTooLong,

    // Lorefile (FILE_xxx)
    FileUnsupported,
    FileInvalidShape,
    FileAccessFailed,

    // Database (DB_xxx)
    DbOperationFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidYaml,

    // Scheduler (SCHED_xxx)
    SchedulerFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidTemplate => "VAL_003",
            ErrorCode::ValOutOfRange => "VAL_004",
            ErrorCode::ValNameTooLong => "VAL_005",
            ErrorCode::FileUnsupported => "FILE_001",
            ErrorCode::FileInvalidShape => "FILE_002",
            ErrorCode::FileAccessFailed => "FILE_003",
            ErrorCode::DbOperationFailed => "DB_001",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidYaml => "PARSE_002",
            ErrorCode::SchedulerFailed => "SCHED_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl LoreError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error with an explicit code and suggestion.
    pub fn validation_with(
        code: ErrorCode,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a missing required field error.
    pub fn missing_field(field: &str) -> Self {
        Self::Validation {
            message: format!("missing required field '{}'", field),
            code: ErrorCode::ValMissingField,
            suggestion: Some(format!("Provide a non-empty '{}'", field)),
        }
    }

    /// Create a file access error for a path.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a scheduler error.
    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::Scheduler(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::UnsupportedFormat { .. } => ErrorCode::FileUnsupported,
            Self::FileAccess { .. } => ErrorCode::FileAccessFailed,
            Self::Yaml(_) => ErrorCode::ParseInvalidYaml,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            Self::Scheduler(_) => ErrorCode::SchedulerFailed,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::UnsupportedFormat { .. } => Some("Use a .json, .yaml or .yml file"),
            Self::Database { .. } => Some("Please check the storage path and its permissions"),
            _ => None,
        }
    }

    /// Whether the error came from caller input rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<rusqlite::Error> for LoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
