//! Labels and annotations attached to v3 entities.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::patch::PatchMap;
use crate::version::ApiVersion;

/// Entity kinds that carry metadata, named after their v3 collection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Organizations,
    Spaces,
    Apps,
    Stacks,
    IsolationSegments,
    Buildpacks,
    ServiceBrokers,
}

impl MetadataKind {
    pub const ALL: [MetadataKind; 7] = [
        Self::Organizations,
        Self::Spaces,
        Self::Apps,
        Self::Stacks,
        Self::IsolationSegments,
        Self::Buildpacks,
        Self::ServiceBrokers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organizations => "organizations",
            Self::Spaces => "spaces",
            Self::Apps => "apps",
            Self::Stacks => "stacks",
            Self::IsolationSegments => "isolation_segments",
            Self::Buildpacks => "buildpacks",
            Self::ServiceBrokers => "service_brokers",
        }
    }

    /// First API version exposing metadata for this kind.
    pub fn minimum_version(&self) -> ApiVersion {
        match self {
            Self::ServiceBrokers => ApiVersion::new(3, 71, 0),
            _ => ApiVersion::new(3, 63, 0),
        }
    }

    /// `/v3/<kind>/<guid>`
    pub fn path(&self, guid: &str) -> String {
        format!("/v3/{}/{}", self.as_str(), guid)
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata as observed on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "non_null_entries")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "non_null_entries")]
    pub annotations: BTreeMap<String, String>,
}

// The controller may answer `"labels": null` or carry null-valued entries.
fn non_null_entries<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<String>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

/// Metadata section of a PATCH body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPatch {
    pub labels: PatchMap,
    pub annotations: PatchMap,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.annotations.is_empty()
    }
}

/// `{"metadata": {...}}` envelope used both for PATCH bodies and GET replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRequest<M> {
    pub metadata: M,
}
