use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Timeout,
    Network,
    Decode,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 422 => Self::Validation,
            408 | 504 => Self::Timeout,
            _ => Self::Internal,
        }
    }

    /// Transport-level failures a user may fix by retrying.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Network)
    }
}

/// Single failure shape for every call against the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Decode, message)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}

/// Error body produced by the catalog server: `{"detail": ...}`.
///
/// `detail` is either a plain string or a list of validation entries
/// carrying a `msg` field.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            serde_json::Value::Array(entries) => {
                let parts: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(|msg| msg.as_str()))
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_to_codes() {
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(500), ErrorCode::Internal);
        assert_eq!(ErrorCode::from_status(408), ErrorCode::Timeout);
        assert_eq!(ErrorCode::from_status(504), ErrorCode::Timeout);
        assert!(ErrorCode::from_status(504).is_transient());
        assert_eq!(ErrorCode::from_status(502), ErrorCode::Internal);
        assert!(ErrorCode::Timeout.is_transient());
        assert!(!ErrorCode::NotFound.is_transient());
    }

    #[test]
    fn extracts_detail_from_string_and_validation_list() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"product not found"}"#).expect("body");
        assert_eq!(body.message().as_deref(), Some("product not found"));

        let body: ErrorBody = serde_json::from_str(
            r#"{"detail":[{"loc":["query","skip"],"msg":"value is not a valid integer"},{"msg":"limit too large"}]}"#,
        )
        .expect("body");
        assert_eq!(
            body.message().as_deref(),
            Some("value is not a valid integer; limit too large")
        );

        let body: ErrorBody = serde_json::from_str(r#"{"detail":""}"#).expect("body");
        assert_eq!(body.message(), None);
    }
}
