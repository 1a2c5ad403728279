//! Managed resource kinds.

use std::sync::Arc;

use cfdriver_client::Session;
use cfdriver_client::model::V3Resource;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::resource::DynResource;
use crate::state::ResourceData;

pub mod app;
pub mod buildpack;
pub mod isolation_segment;
pub mod org;
pub mod route_binding;
pub mod service_access;
pub mod service_broker;
pub mod service_instance;
pub mod service_key;
pub mod sharing;
pub mod space;
pub mod stack;
pub mod user_provided_service;
pub mod users;

/// Every resource kind the driver manages.
pub fn all() -> Vec<DynResource> {
    vec![
        Arc::new(org::Org),
        Arc::new(users::org_users()),
        Arc::new(space::SpaceResource),
        Arc::new(users::space_users()),
        Arc::new(app::AppResource),
        Arc::new(service_instance::ServiceInstanceResource),
        Arc::new(user_provided_service::UserProvidedService),
        Arc::new(service_key::ServiceKey),
        Arc::new(route_binding::RouteServiceBinding),
        Arc::new(sharing::ServiceInstanceSharing),
        Arc::new(service_access::ServicePlanAccess),
        Arc::new(isolation_segment::IsolationSegmentResource),
        Arc::new(stack::StackResource),
        Arc::new(buildpack::BuildpackResource),
        Arc::new(service_broker::ServiceBrokerResource),
    ]
}

/// Fetches the resource behind `data.id()`, clearing the id when it is gone.
pub(crate) async fn fetch<T: V3Resource>(
    session: &Session,
    data: &mut ResourceData,
) -> Result<Option<T>> {
    let found = session.v3.get::<T>(data.id()).await?;
    if found.is_none() {
        data.clear_id();
    }
    Ok(found)
}

/// Parses a JSON-encoded string attribute such as `json_params`.
pub(crate) fn json_attribute(data: &ResourceData, key: &str) -> Result<Option<Value>> {
    match data.get_opt_str(key) {
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| Error::json_decode(key, e)),
        None => Ok(None),
    }
}

/// A required non-empty string attribute.
pub(crate) fn required<'a>(data: &'a ResourceData, key: &str) -> Result<&'a str> {
    data.get_opt_str(key)
        .ok_or_else(|| Error::invalid_attribute(key, "is required"))
}

/// `{"data": {"guid": ...}}`
pub(crate) fn to_one(guid: &str) -> Value {
    json!({ "data": { "guid": guid } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{AttrValue, Attributes};

    #[test]
    fn test_kinds_are_unique() {
        let kinds: std::collections::BTreeSet<&str> = all().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds.len(), all().len());
        assert!(kinds.contains("cloudfoundry_service_instance_sharing"));
    }

    #[test]
    fn test_json_attribute() {
        let attrs: Attributes = [(
            "json_params".to_string(),
            AttrValue::String("{not json".into()),
        )]
        .into();
        let data = ResourceData::from_attributes(attrs);
        let err = json_attribute(&data, "json_params").unwrap_err();
        assert!(matches!(err, Error::JsonDecode { ref attribute, .. } if attribute == "json_params"));
        assert!(json_attribute(&data, "missing").unwrap().is_none());
    }
}
