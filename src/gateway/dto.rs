use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, FALLBACK_SERVER_MESSAGE};

/// `{ data, message?, success? }` envelope wrapped around every reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl<T> ApiResponse<T> {
    pub fn empty() -> Self {
        Self {
            data: None,
            message: None,
            success: None,
        }
    }

    pub fn with_data(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            success: Some(true),
        }
    }

    pub fn into_data(self) -> Result<T, AppError> {
        self.data
            .ok_or_else(|| AppError::Parse("response carried no data".to_string()))
    }
}

impl<T: Default> ApiResponse<T> {
    /// Collections tolerate a missing `data` field.
    pub fn data_or_default(self) -> T {
        self.data.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Message carried by a non-2xx body, or the generic fallback.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SERVER_MESSAGE.to_string())
}

/// Decodes a 2xx body. Bare payloads without an envelope are accepted as `data`.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<ApiResponse<T>, AppError> {
    if body.trim().is_empty() {
        return Ok(ApiResponse::empty());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("invalid JSON: {}", e)))?;

    let is_envelope = value
        .as_object()
        .map(|o| o.contains_key("data") || o.contains_key("success"))
        .unwrap_or(false);

    let envelope = if is_envelope {
        serde_json::from_value::<ApiResponse<T>>(value)
            .map_err(|e| AppError::Parse(e.to_string()))?
    } else {
        ApiResponse::with_data(serde_json::from_value::<T>(value).map_err(|e| AppError::Parse(e.to_string()))?)
    };

    if envelope.success == Some(false) {
        return Err(AppError::Server {
            status,
            message: envelope
                .message
                .unwrap_or_else(|| FALLBACK_SERVER_MESSAGE.to_string()),
        });
    }

    Ok(envelope)
}
