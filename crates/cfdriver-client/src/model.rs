//! v3 resource documents.
//!
//! Only the fields the reconciler reads are modelled; unknown fields are
//! ignored and most fields default so that older controllers still decode.

use std::collections::BTreeMap;

use cfdriver_core::Metadata;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A v3 document living under `/v3/<COLLECTION>/<guid>`.
pub trait V3Resource: DeserializeOwned + Send {
    const COLLECTION: &'static str;

    fn guid(&self) -> &str;
}

macro_rules! v3_resource {
    ($ty:ty, $collection:literal) => {
        impl V3Resource for $ty {
            const COLLECTION: &'static str = $collection;

            fn guid(&self) -> &str {
                &self.guid
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidRef {
    pub guid: String,
}

impl GuidRef {
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }
}

/// To-one relationship, `{"data": {"guid": ...}}` or `{"data": null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToOne {
    pub data: Option<GuidRef>,
}

impl ToOne {
    pub fn to(guid: impl Into<String>) -> Self {
        Self {
            data: Some(GuidRef::new(guid)),
        }
    }
}

/// To-many relationship, `{"data": [{"guid": ...}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToMany {
    #[serde(default)]
    pub data: Vec<GuidRef>,
}

impl ToMany {
    pub fn of<I, S>(guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data: guids.into_iter().map(GuidRef::new).collect(),
        }
    }

    pub fn guids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|g| g.guid.as_str())
    }
}

/// Named to-one relationships of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relationships(pub BTreeMap<String, ToOne>);

impl Relationships {
    pub fn guid(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(|r| r.data.as_ref())
            .map(|g| g.guid.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub metadata: Metadata,
}
v3_resource!(Organization, "organizations");

#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub metadata: Metadata,
}
v3_resource!(Space, "spaces");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecycleData {
    #[serde(default)]
    pub buildpacks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lifecycle {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: LifecycleData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    pub lifecycle: Option<Lifecycle>,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub metadata: Metadata,
}
v3_resource!(App, "apps");

impl App {
    pub fn is_docker(&self) -> bool {
        self.lifecycle.as_ref().is_some_and(|l| l.kind == "docker")
    }

    pub fn buildpacks(&self) -> &[String] {
        self.lifecycle
            .as_ref()
            .map(|l| l.data.buildpacks.as_slice())
            .unwrap_or_default()
    }

    pub fn stack(&self) -> Option<&str> {
        self.lifecycle.as_ref().and_then(|l| l.data.stack.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthCheckData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: HealthCheckData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Process {
    pub guid: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub instances: i64,
    #[serde(default)]
    pub memory_in_mb: i64,
    #[serde(default)]
    pub disk_in_mb: i64,
    pub health_check: Option<HealthCheck>,
}
v3_resource!(Process, "processes");

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub name: String,
    pub enabled: bool,
}

/// `GET /v3/apps/:guid/environment_variables`. Values are arbitrary JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentVariables {
    #[serde(default)]
    pub var: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Droplet {
    pub guid: String,
    #[serde(default)]
    pub state: String,
}

/// An app package. Only docker packages are created here; their `data`
/// carries the image reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub guid: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: PackageData,
}
v3_resource!(Package, "packages");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageData {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceOffering {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub relationships: Relationships,
}
v3_resource!(ServiceOffering, "service_offerings");

#[derive(Debug, Clone, Deserialize)]
pub struct ServicePlan {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub relationships: Relationships,
}
v3_resource!(ServicePlan, "service_plans");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastOperation {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub syslog_drain_url: Option<String>,
    #[serde(default)]
    pub route_service_url: Option<String>,
    #[serde(default)]
    pub last_operation: Option<LastOperation>,
    #[serde(default)]
    pub relationships: Relationships,
}
v3_resource!(ServiceInstance, "service_instances");

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceCredentialBinding {
    pub guid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub relationships: Relationships,
}
v3_resource!(ServiceCredentialBinding, "service_credential_bindings");

/// `GET /v3/service_credential_bindings/:guid/details`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BindingDetails {
    #[serde(default)]
    pub credentials: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRouteBinding {
    pub guid: String,
    #[serde(default)]
    pub route_service_url: Option<String>,
    #[serde(default)]
    pub relationships: Relationships,
}
v3_resource!(ServiceRouteBinding, "service_route_bindings");

#[derive(Debug, Clone, Deserialize)]
pub struct IsolationSegment {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
}
v3_resource!(IsolationSegment, "isolation_segments");

#[derive(Debug, Clone, Deserialize)]
pub struct Stack {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}
v3_resource!(Stack, "stacks");

#[derive(Debug, Clone, Deserialize)]
pub struct Buildpack {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub metadata: Metadata,
}
v3_resource!(Buildpack, "buildpacks");

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceBroker {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub metadata: Metadata,
}
v3_resource!(ServiceBroker, "service_brokers");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_app_lifecycle_accessors() {
        let app: App = serde_json::from_value(json!({
            "guid": "a1",
            "name": "web",
            "state": "STARTED",
            "lifecycle": {"type": "buildpack", "data": {"buildpacks": ["go_buildpack"], "stack": "cflinuxfs4"}},
            "relationships": {"space": {"data": {"guid": "s1"}}}
        }))
        .unwrap();
        assert_eq!(app.buildpacks(), ["go_buildpack".to_string()]);
        assert_eq!(app.stack(), Some("cflinuxfs4"));
        assert_eq!(app.relationships.guid("space"), Some("s1"));
        assert!(app.metadata.labels.is_empty());
    }

    #[test]
    fn test_null_relationship() {
        let org: Organization = serde_json::from_value(json!({
            "guid": "o1",
            "name": "org",
            "relationships": {"quota": {"data": null}}
        }))
        .unwrap();
        assert_eq!(org.relationships.guid("quota"), None);
        assert_eq!(Organization::COLLECTION, "organizations");
    }

    #[test]
    fn test_to_many_serialization() {
        assert_eq!(
            serde_json::to_value(ToMany::of(["s1"])).unwrap(),
            json!({"data": [{"guid": "s1"}]})
        );
    }
}
