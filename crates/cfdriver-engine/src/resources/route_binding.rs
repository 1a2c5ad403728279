//! `cloudfoundry_route_service_binding`
//!
//! Identified by `<service_instance>:<route>`. The binding's own GUID is only
//! needed to delete it and is looked up each time.

use async_trait::async_trait;
use cfdriver_client::model::ServiceRouteBinding;
use cfdriver_client::{Query, Session};
use cfdriver_core::{CompositeId, compose_id};
use serde_json::json;

use super::{json_attribute, required, to_one};
use crate::error::Result;
use crate::resource::Resource;
use crate::state::ResourceData;

pub struct RouteServiceBinding;

async fn find_binding(
    session: &Session,
    id: &CompositeId,
) -> Result<Option<ServiceRouteBinding>> {
    let bindings = session
        .v3
        .list::<ServiceRouteBinding>(&Query::new().service_instance_guids(&id.parent))
        .await?;
    Ok(bindings
        .into_iter()
        .find(|b| b.relationships.guid("route") == Some(id.child.as_str())))
}

#[async_trait]
impl Resource for RouteServiceBinding {
    fn kind(&self) -> &'static str {
        "cloudfoundry_route_service_binding"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let instance = required(data, "service_instance")?.to_string();
        let route = required(data, "route")?.to_string();
        let mut body = json!({
            "relationships": {
                "service_instance": to_one(&instance),
                "route": to_one(&route),
            },
        });
        if let Some(params) = json_attribute(data, "json_params")? {
            body["parameters"] = params;
        }

        session
            .v3
            .create::<ServiceRouteBinding, _>(&body)
            .await?;
        data.set_id(compose_id(&instance, &route));
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let id = CompositeId::parse(data.id())?;
        if find_binding(session, &id).await?.is_none() {
            data.clear_id();
            return Ok(());
        }
        data.set("service_instance", id.parent);
        data.set("route", id.child);
        Ok(())
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let id = CompositeId::parse(data.id())?;
        if let Some(binding) = find_binding(session, &id).await? {
            session
                .v3
                .delete::<ServiceRouteBinding>(&binding.guid)
                .await?;
        }
        data.clear_id();
        Ok(())
    }

    async fn import(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        CompositeId::parse(data.id())?;
        self.read(session, data).await
    }
}
