//! The generic resource driver.
//!
//! The host hands over one request at a time; the driver routes it to the
//! registered resource or data-source kind, runs the operation against the
//! session and folds the result into a [`Response`].

use std::collections::BTreeMap;
use std::sync::Arc;

use cfdriver_client::Session;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{Instrument, debug, info_span, warn};

use crate::error::{Error, Result};
use crate::resource::{DynDataSource, DynResource};
use crate::state::ResourceData;
use crate::value::{Attributes, attributes_from_json};
use crate::{data_sources, resources};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Resource(ResourceRequest),
    DataSource(DataSourceRequest),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRequest {
    pub kind: String,
    pub operation: Operation,
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_attributes")]
    pub prior: Attributes,
    #[serde(default, deserialize_with = "lenient_attributes")]
    pub desired: Attributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceRequest {
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_attributes")]
    pub attributes: Attributes,
}

// Host attribute maps may carry nulls for unset attributes.
fn lenient_attributes<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Attributes, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(attributes_from_json(&value))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    /// The resource no longer exists; the host should drop it from state.
    Missing,
    /// Retryable failure.
    Transient { message: String },
    Error { message: String, category: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: String,
    pub attributes: Attributes,
    pub outcome: Outcome,
}

impl Response {
    fn failure(id: String, attributes: Attributes, err: &Error) -> Self {
        let outcome = if err.is_transient() {
            Outcome::Transient {
                message: err.to_string(),
            }
        } else {
            Outcome::Error {
                message: err.to_string(),
                category: err.category().to_string(),
            }
        };
        Self {
            id,
            attributes,
            outcome,
        }
    }
}

/// Registry of resource and data-source kinds bound to an optional session.
pub struct Provider {
    session: Option<Arc<Session>>,
    resources: BTreeMap<&'static str, DynResource>,
    data_sources: BTreeMap<&'static str, DynDataSource>,
}

impl Provider {
    /// A provider with every built-in kind registered.
    pub fn new(session: Option<Arc<Session>>) -> Self {
        let mut provider = Self {
            session,
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        };
        for resource in resources::all() {
            provider.register_resource(resource);
        }
        for data_source in data_sources::all() {
            provider.register_data_source(data_source);
        }
        provider
    }

    pub fn register_resource(&mut self, resource: DynResource) {
        self.resources.insert(resource.kind(), resource);
    }

    pub fn register_data_source(&mut self, data_source: DynDataSource) {
        self.data_sources.insert(data_source.kind(), data_source);
    }

    pub fn resource_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    fn require_session(&self) -> Result<&Session> {
        self.session.as_deref().ok_or(Error::ClientNil)
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Resource(req) => self.apply(req).await,
            Request::DataSource(req) => self.read_data_source(req).await,
        }
    }

    /// Runs one resource operation.
    pub async fn apply(&self, request: ResourceRequest) -> Response {
        let span = info_span!(
            "resource",
            kind = %request.kind,
            operation = ?request.operation,
            id = %request.id,
        );
        self.apply_inner(request).instrument(span).await
    }

    async fn apply_inner(&self, request: ResourceRequest) -> Response {
        let ResourceRequest {
            kind,
            operation,
            id,
            prior,
            desired,
        } = request;

        let mut data = match operation {
            Operation::Import => ResourceData::for_import(id),
            Operation::Create => ResourceData::new("", prior, desired),
            Operation::Update => ResourceData::new(id, prior, desired),
            // Reads and deletes work from what is declared, falling back to
            // the recorded state.
            Operation::Read | Operation::Delete => {
                let current = if desired.is_empty() {
                    prior.clone()
                } else {
                    desired
                };
                ResourceData::new(id, prior, current)
            }
        };

        let result = self.dispatch(&kind, operation, &mut data).await;
        let (id, attributes) = data.into_parts();

        match result {
            Ok(()) if operation == Operation::Delete => Response {
                id: String::new(),
                attributes: Attributes::new(),
                outcome: Outcome::Ok,
            },
            Ok(()) if id.is_empty() => {
                debug!("resource is gone");
                Response {
                    id,
                    attributes: Attributes::new(),
                    outcome: Outcome::Missing,
                }
            }
            Ok(()) => Response {
                id,
                attributes,
                outcome: Outcome::Ok,
            },
            Err(err) if err.is_not_found() && operation != Operation::Create => {
                debug!(error = %err, "resource is gone");
                Response {
                    id: String::new(),
                    attributes: Attributes::new(),
                    outcome: Outcome::Missing,
                }
            }
            Err(err) => {
                warn!(error = %err, category = %err.category(), "operation failed");
                Response::failure(id, attributes, &err)
            }
        }
    }

    async fn dispatch(&self, kind: &str, operation: Operation, data: &mut ResourceData) -> Result<()> {
        let resource = self.resources.get(kind).ok_or_else(|| Error::UnknownKind {
            category: "resource",
            kind: kind.to_string(),
        })?;
        let session = self.require_session()?;
        match operation {
            Operation::Create => resource.create(session, data).await,
            Operation::Read => resource.read(session, data).await,
            Operation::Update => resource.update(session, data).await,
            Operation::Delete => resource.delete(session, data).await,
            Operation::Import => resource.import(session, data).await,
        }
    }

    /// Runs one data-source lookup. A lookup matching nothing is reported as
    /// missing, without an id.
    pub async fn read_data_source(&self, request: DataSourceRequest) -> Response {
        let span = info_span!("data_source", kind = %request.kind);
        async move {
            let mut data = ResourceData::from_attributes(request.attributes);
            let result = match self.data_sources.get(request.kind.as_str()) {
                Some(source) => match self.require_session() {
                    Ok(session) => source.read(session, &mut data).await,
                    Err(e) => Err(e),
                },
                None => Err(Error::UnknownKind {
                    category: "data source",
                    kind: request.kind.clone(),
                }),
            };

            match result {
                Ok(()) => {
                    let (id, attributes) = data.into_parts();
                    Response {
                        id,
                        attributes,
                        outcome: Outcome::Ok,
                    }
                }
                Err(err) if err.is_not_found() => {
                    debug!(error = %err, "data source matched nothing");
                    Response {
                        id: String::new(),
                        attributes: Attributes::new(),
                        outcome: Outcome::Missing,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "data source lookup failed");
                    let (_, attributes) = data.into_parts();
                    Response::failure(String::new(), attributes, &err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_session_is_client_nil() {
        let provider = Provider::new(None);
        let request: Request = serde_json::from_value(json!({
            "type": "resource",
            "kind": "cloudfoundry_org",
            "operation": "read",
            "id": "o1",
            "prior": {"name": "org", "quota": null}
        }))
        .unwrap();
        let response = provider.handle(request).await;
        assert_eq!(
            response.outcome,
            Outcome::Error {
                message: "client is nil".into(),
                category: "internal".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let provider = Provider::new(None);
        let response = provider
            .read_data_source(DataSourceRequest {
                kind: "cloudfoundry_nope".into(),
                attributes: Attributes::new(),
            })
            .await;
        assert!(matches!(
            response.outcome,
            Outcome::Error { ref message, .. } if message == "unknown data source kind 'cloudfoundry_nope'"
        ));
    }

    #[test]
    fn test_outcome_serialization() {
        let response = Response {
            id: "g".into(),
            attributes: Attributes::new(),
            outcome: Outcome::Transient {
                message: "unexpected status 503: down".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "id": "g",
                "attributes": {},
                "outcome": {"status": "transient", "message": "unexpected status 503: down"}
            })
        );
    }

    #[test]
    fn test_registers_every_kind() {
        let provider = Provider::new(None);
        assert_eq!(provider.resource_kinds().count(), 15);
        assert_eq!(provider.data_source_kinds().count(), 9);
    }
}
