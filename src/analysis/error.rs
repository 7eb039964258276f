// src/analysis/error.rs
use thiserror::Error;

/// The request never produced an HTTP response (DNS, TLS, refused, aborted).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(#[from] TransportError),
    #[error("server error: {status}")]
    Server { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AnalyzeError {
    /// Text shown to the user in the alert.
    pub fn user_message(&self) -> String {
        match self {
            AnalyzeError::Timeout => {
                "Request timed out. The backend server may be starting up (cold start). Please try again in 30 seconds.".to_string()
            }
            AnalyzeError::Connection(err) => format!("Failed to connect to the backend. {err}"),
            AnalyzeError::Server { status, .. } => format!("Failed to connect to the backend. Server error: {status}"),
            AnalyzeError::Decode(err) => format!("Failed to connect to the backend. Invalid response: {err}"),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AnalyzeError::Timeout)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("unsupported file type `{0}` (supports JPG, PNG, WEBP, MP4, AVI, MOV, WEBM)")]
    UnsupportedType(String),
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("file is empty")]
    Empty,
}
