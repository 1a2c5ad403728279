//! Engine error type.

use std::fmt;

use cfdriver_client::ClientError;
use cfdriver_core::IdError;

/// Errors surfaced by reconcilers, resources and data sources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lookup matched nothing. The driver reports the resource as missing.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error(transparent)]
    MalformedId(#[from] IdError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// No session was configured when the call was made.
    #[error("client is nil")]
    ClientNil,

    /// The share call succeeded but reported no affected spaces.
    #[error("service instance {instance} could not be shared into space {space}")]
    ShareFailed { instance: String, space: String },

    #[error("invalid JSON in '{attribute}': {source}")]
    JsonDecode {
        attribute: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for '{attribute}': {message}")]
    InvalidAttribute { attribute: String, message: String },

    #[error("{kind} cannot be updated in place")]
    UpdateNotSupported { kind: String },

    #[error("unknown {category} kind '{kind}'")]
    UnknownKind { category: &'static str, kind: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn json_decode(attribute: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonDecode {
            attribute: attribute.into(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn update_not_supported(kind: impl Into<String>) -> Self {
        Self::UpdateNotSupported { kind: kind.into() }
    }

    /// Returns `true` for lookups that matched nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` when the host may retry the same call.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Client(e) => e.is_transient(),
            _ => false,
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MalformedId(_)
            | Self::JsonDecode { .. }
            | Self::InvalidAttribute { .. }
            | Self::UpdateNotSupported { .. }
            | Self::UnknownKind { .. } => ErrorCategory::Validation,
            Self::Client(ClientError::RemoteStatus { .. }) | Self::ShareFailed { .. } => {
                ErrorCategory::Remote
            }
            Self::Client(_) => ErrorCategory::Transport,
            Self::ClientNil => ErrorCategory::Internal,
        }
    }
}

/// Error categories reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Validation,
    Remote,
    Transport,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Remote => write!(f, "remote"),
            Self::Transport => write!(f, "transport"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(Error::ClientNil.to_string(), "client is nil");
        assert_eq!(
            Error::not_found("app", "web").to_string(),
            "app 'web' not found"
        );
        let err: Error = IdError::Malformed("bare".into()).into();
        assert_eq!(
            err.to_string(),
            "unable to parse id 'bare', expected format is '<guid>:<guid>'"
        );
    }

    #[test]
    fn test_classification() {
        let err: Error = ClientError::remote_status(502, "bad gateway").into();
        assert!(err.is_transient());
        assert_eq!(err.category(), ErrorCategory::Remote);

        let err: Error = ClientError::remote_status(422, "").into();
        assert!(!err.is_transient());

        assert!(Error::not_found("org", "x").is_not_found());
        assert_eq!(
            Error::update_not_supported("cloudfoundry_service_key").category(),
            ErrorCategory::Validation
        );
    }
}
