//! Tri-valued patch maps.
//!
//! A Cloud Controller PATCH of a string map distinguishes three cases per key:
//! present with a value (set), present with `null` (delete), and absent
//! (leave the server value alone). Labels, annotations and environment
//! variables all use this encoding.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchValue {
    Set(String),
    Delete,
}

impl PatchValue {
    pub fn as_set(&self) -> Option<&str> {
        match self {
            Self::Set(v) => Some(v),
            Self::Delete => None,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl Serialize for PatchValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(v) => serializer.serialize_str(v),
            Self::Delete => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for PatchValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(v) => Self::Set(v),
            None => Self::Delete,
        })
    }
}

/// Insertion-ordered so payloads list sets before tombstones.
pub type PatchMap = IndexMap<String, PatchValue>;

/// Builds the patch that moves a server map from `old` to `new`.
///
/// Every entry of `new` is emitted as a set; every key of `old` missing from
/// `new` is emitted as a delete.
pub fn diff_maps(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> PatchMap {
    let mut patch: PatchMap = new
        .iter()
        .map(|(k, v)| (k.clone(), PatchValue::Set(v.clone())))
        .collect();
    for key in old.keys() {
        if !new.contains_key(key) {
            patch.insert(key.clone(), PatchValue::Delete);
        }
    }
    patch
}
