//! Error types module
//!
//! `AppError` is the error surfaced by the HTTP layer. Storage-level failures
//! are converted into it at the API boundary; read-path and cascade-delete
//! failures never reach it because the gateway absorbs them.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a slow backend
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage backend timed out: {0}")]
    StorageTimeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// How one error kind is presented to clients and logs.
#[derive(Debug, Clone, Copy)]
struct Presentation {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

const fn client_fault(status: u16, code: &'static str, action: &'static str) -> Presentation {
    Presentation {
        status,
        code,
        recoverable: false,
        action: Some(action),
        sensitive: false,
        level: LogLevel::Debug,
    }
}

impl AppError {
    fn presentation(&self) -> Presentation {
        match self {
            AppError::InvalidInput(_) => client_fault(
                400,
                "INVALID_INPUT",
                "Check request parameters and try again",
            ),
            AppError::BadRequest(_) => {
                client_fault(400, "BAD_REQUEST", "Check request format and parameters")
            }
            AppError::NotFound(_) => client_fault(404, "NOT_FOUND", "Verify the resource exists"),
            AppError::PayloadTooLarge(_) => client_fault(
                413,
                "PAYLOAD_TOO_LARGE",
                "Reduce file size and upload again",
            ),
            AppError::UnsupportedMediaType(_) => client_fault(
                415,
                "UNSUPPORTED_MEDIA_TYPE",
                "Upload an image or video in an accepted format",
            ),
            // Backend rejections carry provider responses; keep them out of client bodies.
            AppError::UploadFailed(_) => Presentation {
                status: 502,
                code: "UPLOAD_FAILED",
                recoverable: true,
                action: Some("Retry the upload after a short delay"),
                sensitive: true,
                level: LogLevel::Warn,
            },
            AppError::StorageTimeout(_) => Presentation {
                status: 504,
                code: "STORAGE_TIMEOUT",
                recoverable: true,
                action: Some("Retry after a short delay"),
                sensitive: false,
                level: LogLevel::Warn,
            },
            AppError::Configuration(_) => Presentation {
                status: 500,
                code: "CONFIGURATION_ERROR",
                recoverable: false,
                action: Some("Contact support if this error persists"),
                sensitive: true,
                level: LogLevel::Error,
            },
            AppError::Internal(_) | AppError::InternalWithSource { .. } => Presentation {
                status: 500,
                code: "INTERNAL_ERROR",
                recoverable: true,
                action: Some("Retry after a short delay"),
                sensitive: true,
                level: LogLevel::Error,
            },
        }
    }

    /// Variant name, exposed in non-production error bodies
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            AppError::UploadFailed(_) => "UploadFailed",
            AppError::StorageTimeout(_) => "StorageTimeout",
            AppError::Configuration(_) => "Configuration",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Display text followed by up to `MAX_CAUSES` source errors.
    pub fn detailed_message(&self) -> String {
        const MAX_CAUSES: usize = 5;

        let mut details = self.to_string();
        let mut causes = std::iter::successors(std::error::Error::source(self), |err| err.source());

        for cause in causes.by_ref().take(MAX_CAUSES) {
            details.push_str(&format!("\n  Caused by: {}", cause));
        }
        if causes.next().is_some() {
            details.push_str("\n  ... (truncated)");
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.presentation().status
    }

    fn error_code(&self) -> &'static str {
        self.presentation().code
    }

    fn is_recoverable(&self) -> bool {
        self.presentation().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.presentation().action
    }

    fn is_sensitive(&self) -> bool {
        self.presentation().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.presentation().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::UnsupportedMediaType(msg) => msg.clone(),
            AppError::UploadFailed(_) => "Upload failed".to_string(),
            AppError::StorageTimeout(_) => "Storage backend did not respond in time".to_string(),
            AppError::Configuration(_) => "Storage is not configured correctly".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }
}
