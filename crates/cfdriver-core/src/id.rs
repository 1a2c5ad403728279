//! Resource identifiers.
//!
//! Most resources are identified by the GUID the Cloud Controller assigned.
//! Link resources (route bindings, instance sharing) have no GUID of their own
//! and are identified by the pair of GUIDs they connect, written `parent:child`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Separator between the two halves of a composite id.
pub const ID_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("unable to parse id '{0}', expected format is '<guid>:<guid>'")]
    Malformed(String),
}

/// Returns `true` when `value` parses as a UUID.
pub fn is_guid(value: &str) -> bool {
    uuid::Uuid::parse_str(value).is_ok()
}

/// Two GUIDs joined into a single resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    pub parent: String,
    pub child: String,
}

impl CompositeId {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }

    /// Splits on the first separator. Both halves must be non-empty.
    pub fn parse(id: &str) -> Result<Self, IdError> {
        match id.split_once(ID_SEPARATOR) {
            Some((parent, child)) if !parent.is_empty() && !child.is_empty() => {
                Ok(Self::new(parent, child))
            }
            _ => Err(IdError::Malformed(id.to_string())),
        }
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.parent, ID_SEPARATOR, self.child)
    }
}

impl FromStr for CompositeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub fn compose_id(parent: &str, child: &str) -> String {
    CompositeId::new(parent, child).to_string()
}

pub fn parse_id(id: &str) -> Result<(String, String), IdError> {
    CompositeId::parse(id).map(|c| (c.parent, c.child))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_and_parse() {
        assert_eq!(compose_id("s1", "r1"), "s1:r1");
        assert_eq!(
            parse_id("s1:r1").unwrap(),
            ("s1".to_string(), "r1".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_bare_id() {
        assert_eq!(
            parse_id("bare").unwrap_err(),
            IdError::Malformed("bare".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_halves() {
        assert!(parse_id(":child").is_err());
        assert!(parse_id("parent:").is_err());
        assert!(parse_id(":").is_err());
        assert!(parse_id("").is_err());
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        let id = CompositeId::parse("a:b:c").unwrap();
        assert_eq!(id.parent, "a");
        assert_eq!(id.child, "b:c");
    }

    #[test]
    fn test_guid_round_trip() {
        let parent = "7d7f1e6a-0a87-4a5b-9a40-5c4ad4f8a001";
        let child = "1c1f6a3e-2b7b-4f7e-8c0f-2a9b3c7d8e02";
        let id: CompositeId = compose_id(parent, child).parse().unwrap();
        assert_eq!(id.parent, parent);
        assert_eq!(id.child, child);
        assert!(is_guid(&id.parent));
        assert!(is_guid(&id.child));
    }

    #[test]
    fn test_is_guid() {
        assert!(is_guid("7d7f1e6a-0a87-4a5b-9a40-5c4ad4f8a001"));
        assert!(!is_guid("my-app"));
        assert!(!is_guid(""));
    }

    #[test]
    fn test_error_message() {
        let err = parse_id("bare").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to parse id 'bare', expected format is '<guid>:<guid>'"
        );
    }
}
