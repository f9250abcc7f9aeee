use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors surfaced by every client operation.
///
/// Backend bodies are kept verbatim so callers can show the raw message
/// next to the name of the operation that failed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure: no response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Backend { status: StatusCode, body: String },

    /// The backend rejected the request as conflicting with existing state
    /// (bucket already exists, bucket not empty).
    #[error("conflict: {body}")]
    Conflict { body: String },

    /// Rejected locally before any request was issued.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A success response whose body could not be decoded.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local file access while uploading or downloading.
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Build an error from a non-success status and the raw response body.
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        } else {
            body
        };

        if status == StatusCode::CONFLICT {
            Self::Conflict { body }
        } else {
            Self::Backend { status, body }
        }
    }

    /// Shortcut for a client-side validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status carried by the error, if the backend produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Conflict { .. } => Some(StatusCode::CONFLICT),
            Self::Network(err) => err.status(),
            _ => None,
        }
    }

    /// Whether the request never reached (or never heard back from) the backend.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
