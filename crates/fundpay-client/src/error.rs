use fundpay_types::models::PaymentStatus;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server reported payment as {actual}, expected {expected}")]
    UnconfirmedStatus {
        expected: PaymentStatus,
        actual: PaymentStatus,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// The message the backend put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text for the user: the server's message verbatim when it sent one,
    /// otherwise the screen's generic fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = ClientError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Email exists".into()),
        };
        assert_eq!(err.user_message("Signup failed"), "Email exists");
        assert_eq!(err.to_string(), "server returned 400 Bad Request: Email exists");
    }

    #[test]
    fn fallback_without_server_message() {
        let err = ClientError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(err.user_message("Failed to load receipts"), "Failed to load receipts");

        let err = ClientError::Config("bad url".into());
        assert!(err.server_message().is_none());
    }
}
