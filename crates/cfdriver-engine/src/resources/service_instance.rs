//! `cloudfoundry_service_instance` (managed instances)
//!
//! Provisioning, updates and deprovisioning are asynchronous on most brokers;
//! the client waits for the job before the instance is read back.

use async_trait::async_trait;
use cfdriver_client::model::ServiceInstance;
use cfdriver_client::{Query, Session};
use serde_json::{Map, Value, json};

use super::{fetch, json_attribute, required, to_one};
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::state::ResourceData;

pub struct ServiceInstanceResource;

/// First instance called `name` in `space`.
pub async fn find_instance(session: &Session, name: &str, space: &str) -> Result<ServiceInstance> {
    session
        .v3
        .list::<ServiceInstance>(&Query::new().names(name).space_guids(space))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found("service instance", name))
}

#[async_trait]
impl Resource for ServiceInstanceResource {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service_instance"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let space = required(data, "space")?.to_string();
        let mut body = json!({
            "type": "managed",
            "name": name,
            "tags": data.get_list("tags"),
            "relationships": {
                "space": to_one(&space),
                "service_plan": to_one(required(data, "service_plan")?),
            },
        });
        if let Some(params) = json_attribute(data, "json_params")? {
            body["parameters"] = params;
        }

        let instance = match session.v3.create::<ServiceInstance, _>(&body).await? {
            Some(instance) => instance,
            None => find_instance(session, &name, &space).await?,
        };
        data.set_id(instance.guid);
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(instance) = fetch::<ServiceInstance>(session, data).await? else {
            return Ok(());
        };
        data.set("name", instance.name);
        data.set("tags", instance.tags);
        data.set(
            "space",
            instance.relationships.guid("space").unwrap_or_default(),
        );
        data.set(
            "service_plan",
            instance
                .relationships
                .guid("service_plan")
                .unwrap_or_default(),
        );
        Ok(())
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        if data.has_change("space") {
            return Err(Error::update_not_supported("cloudfoundry_service_instance space"));
        }

        let mut body = Map::new();
        if data.has_change("name") {
            body.insert("name".into(), json!(required(data, "name")?));
        }
        if data.has_change("tags") {
            body.insert("tags".into(), json!(data.get_list("tags")));
        }
        if data.has_change("json_params") {
            let params = json_attribute(data, "json_params")?.unwrap_or_else(|| json!({}));
            body.insert("parameters".into(), params);
        }
        if data.has_change("service_plan") {
            body.insert(
                "relationships".into(),
                json!({ "service_plan": to_one(required(data, "service_plan")?) }),
            );
        }
        if !body.is_empty() {
            session
                .v3
                .update::<ServiceInstance, _>(data.id(), &Value::Object(body))
                .await?;
        }
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<ServiceInstance>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}
