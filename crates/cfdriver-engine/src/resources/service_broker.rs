//! `cloudfoundry_service_broker`
//!
//! Registration and updates run as jobs. The broker password cannot be read
//! back, so the declared value is kept.

use async_trait::async_trait;
use cfdriver_client::model::ServiceBroker;
use cfdriver_client::{Query, Session};
use cfdriver_core::MetadataKind;
use serde_json::{Map, Value, json};

use super::{fetch, required, to_one};
use crate::error::{Error, Result};
use crate::metadata::{metadata_create, metadata_read, metadata_update};
use crate::resource::Resource;
use crate::state::ResourceData;

const METADATA: MetadataKind = MetadataKind::ServiceBrokers;

pub struct ServiceBrokerResource;

fn authentication(data: &ResourceData) -> Result<Value> {
    Ok(json!({
        "type": "basic",
        "credentials": {
            "username": required(data, "username")?,
            "password": required(data, "password")?,
        },
    }))
}

#[async_trait]
impl Resource for ServiceBrokerResource {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service_broker"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let mut body = json!({
            "name": name,
            "url": required(data, "url")?,
            "authentication": authentication(data)?,
        });
        if let Some(space) = data.get_opt_str("space") {
            body["relationships"] = json!({ "space": to_one(space) });
        }

        let broker = match session.v3.create::<ServiceBroker, _>(&body).await? {
            Some(broker) => broker,
            None => session
                .v3
                .list::<ServiceBroker>(&Query::new().names(&name))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found("service broker", &name))?,
        };
        data.set_id(broker.guid);
        metadata_create(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(broker) = fetch::<ServiceBroker>(session, data).await? else {
            return Ok(());
        };
        data.set("name", broker.name);
        data.set("url", broker.url);
        data.set(
            "space",
            broker.relationships.guid("space").unwrap_or_default(),
        );
        metadata_read(session, METADATA, data, false).await
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let mut body = Map::new();
        if data.has_change("name") {
            body.insert("name".into(), json!(required(data, "name")?));
        }
        if data.has_change("url") {
            body.insert("url".into(), json!(required(data, "url")?));
        }
        if data.has_any_change(&["username", "password"]) {
            body.insert("authentication".into(), authentication(data)?);
        }
        if !body.is_empty() {
            session
                .v3
                .update::<ServiceBroker, _>(data.id(), &Value::Object(body))
                .await?;
        }
        metadata_update(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<ServiceBroker>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}
