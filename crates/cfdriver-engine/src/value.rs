//! Attribute values exchanged with the host.
//!
//! The host stores every declared attribute as one of six shapes: string,
//! int, bool, `string -> string` map, ordered string list or unordered int
//! set. JSON input is coerced into those shapes; `null` means "not set".

use std::collections::{BTreeMap, BTreeSet};

use cfdriver_core::scalar_to_string;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<String>),
    IntSet(BTreeSet<i64>),
    Map(BTreeMap<String, String>),
}

/// Attribute name to value.
pub type Attributes = BTreeMap<String, AttrValue>;

impl AttrValue {
    /// Coerces a JSON value. Returns `None` for `null`.
    pub fn from_json(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => return None,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::String(n.to_string()),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => {
                let ints: Option<BTreeSet<i64>> = items.iter().map(Value::as_i64).collect();
                match ints {
                    Some(set) if !items.is_empty() => Self::IntSet(set),
                    _ => Self::List(
                        items
                            .iter()
                            .filter(|v| !v.is_null())
                            .map(scalar_to_string)
                            .collect(),
                    ),
                }
            }
            Value::Object(members) => Self::Map(
                members
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                    .collect(),
            ),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Empty strings, lists, sets and maps are indistinguishable from an
    /// unset attribute.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::IntSet(set) => set.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::Bool(_) | Self::Int(_) => false,
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| serde::de::Error::custom("null attribute value"))
    }
}

/// Parses a JSON attribute map, dropping `null` entries.
pub fn attributes_from_json(value: &Value) -> Attributes {
    value
        .as_object()
        .map(|members| {
            members
                .iter()
                .filter_map(|(k, v)| AttrValue::from_json(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeSet<i64>> for AttrValue {
    fn from(v: BTreeSet<i64>) -> Self {
        Self::IntSet(v)
    }
}

impl From<BTreeMap<String, String>> for AttrValue {
    fn from(v: BTreeMap<String, String>) -> Self {
        Self::Map(v)
    }
}
