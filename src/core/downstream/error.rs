//! Downstream error classification

use thiserror::Error;

/// Failure talking to the pointage service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownstreamError {
    /// 400: the service refused the payload
    #[error("invalid data: {detail}")]
    Rejected { status: u16, detail: String },

    /// 404: the service route is not available
    #[error("pointage service unavailable")]
    Unavailable,

    /// Any other 4xx
    #[error("client error {status}: {detail}")]
    Client { status: u16, detail: String },

    /// 5xx
    #[error("pointage service internal error {status}: {detail}")]
    Server { status: u16, detail: String },

    /// Connection or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// No response within the configured deadline
    #[error("request timed out")]
    Timeout,

    /// Response body could not be decoded
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl DownstreamError {
    /// Map a non-success HTTP status and its body
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            400 => Self::Rejected { status, detail },
            404 => Self::Unavailable,
            500..=599 => Self::Server { status, detail },
            _ => Self::Client { status, detail },
        }
    }

    /// Whether another attempt may succeed
    ///
    /// Rejected payloads and other 4xx (except 404, 408 and 429) are
    /// permanent; everything else is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { .. } => false,
            Self::Client { status, .. } => matches!(status, 408 | 429),
            Self::Unavailable
            | Self::Server { .. }
            | Self::Transport(_)
            | Self::Timeout
            | Self::Decode(_) => true,
        }
    }
}

impl From<reqwest::Error> for DownstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
