use std::collections::BTreeMap;

use thiserror::Error;

/// Field name -> message, ordered so rendering is stable.
pub type FieldErrors = BTreeMap<&'static str, String>;

pub const NO_RESPONSE_MESSAGE: &str = "No response from server";
pub const FALLBACK_SERVER_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No response from server: {0}")]
    NoResponse(#[source] reqwest::Error),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Failed to parse server response: {0}")]
    Parse(String),

    #[error("Validation failed on {}", .0.keys().copied().collect::<Vec<_>>().join(", "))]
    Validation(FieldErrors),

    #[error("{0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status of a server error; `None` for everything that never reached a server reply.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::NoResponse(_) => NO_RESPONSE_MESSAGE.to_string(),
            AppError::Server { message, .. } => message.clone(),
            AppError::Parse(msg) | AppError::Rejected(msg) | AppError::Config(msg) => msg.clone(),
            AppError::Validation(_) => self.to_string(),
        }
    }

    /// Text shown to the operator for a failed call.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Server { status, message } => match status {
                400 => format!("Invalid request: {}", message),
                401 => "Unauthorized access".to_string(),
                403 => "Access forbidden".to_string(),
                404 => format!("Not found: {}", message),
                500 => "Server error occurred".to_string(),
                _ => message.clone(),
            },
            AppError::NoResponse(_) => NO_RESPONSE_MESSAGE.to_string(),
            AppError::Parse(_) => "Request failed".to_string(),
            other => other.message(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
