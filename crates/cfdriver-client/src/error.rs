//! Errors raised while talking to the Cloud Controller.

use std::fmt;

/// Errors that can occur on a Cloud Controller call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status the caller does not accept.
    #[error("unexpected status {status}: {body}")]
    RemoteStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not the expected JSON document.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured endpoint or a server-provided link is not a valid URL.
    #[error("invalid url '{0}'")]
    Url(String),

    /// The session was cancelled before the call completed.
    #[error("request cancelled")]
    Cancelled,

    /// An asynchronous job finished in the FAILED state.
    #[error("job {guid} failed: {message}")]
    JobFailed { guid: String, message: String },

    /// An asynchronous job did not finish in time.
    #[error("job {guid} did not complete within {timeout_secs}s")]
    JobTimeout { guid: String, timeout_secs: u64 },
}

impl ClientError {
    #[must_use]
    pub fn remote_status(status: u16, body: impl Into<String>) -> Self {
        Self::RemoteStatus {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn job_failed(guid: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JobFailed {
            guid: guid.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` for a 404 answer.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` when retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => {
                e.is_connect() || e.is_timeout() || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::RemoteStatus { status, .. } => *status == 429 || (500..600).contains(status),
            Self::JobTimeout { .. } => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::RemoteStatus { .. } => ErrorCategory::Remote,
            Self::Decode(_) | Self::Url(_) => ErrorCategory::Protocol,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::JobFailed { .. } | Self::JobTimeout { .. } => ErrorCategory::Job,
        }
    }
}

/// Coarse grouping of client errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Transport,
    Remote,
    Protocol,
    Cancelled,
    Job,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Remote => write!(f, "remote"),
            Self::Protocol => write!(f, "protocol"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Job => write!(f, "job"),
        }
    }
}
