//! `cloudfoundry_user_provided_service`
//!
//! Credentials are declared either as a flat `credentials` map or as a
//! `credentials_json` document; the latter wins when both are set.

use async_trait::async_trait;
use cfdriver_client::Session;
use cfdriver_client::model::ServiceInstance;
use cfdriver_core::scalar_to_string;
use serde_json::{Map, Value, json};

use super::{fetch, json_attribute, required, to_one};
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::state::ResourceData;

pub struct UserProvidedService;

fn credentials(data: &ResourceData) -> Result<Value> {
    if let Some(doc) = json_attribute(data, "credentials_json")? {
        return Ok(doc);
    }
    Ok(Value::Object(
        data.get_map("credentials")
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    ))
}

/// Optional URL attributes are cleared with an empty string.
fn url_field(data: &ResourceData, key: &str) -> Value {
    json!(data.get_str(key))
}

#[async_trait]
impl Resource for UserProvidedService {
    fn kind(&self) -> &'static str {
        "cloudfoundry_user_provided_service"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let mut body = json!({
            "type": "user-provided",
            "name": name,
            "credentials": credentials(data)?,
            "tags": data.get_list("tags"),
            "relationships": { "space": to_one(required(data, "space")?) },
        });
        for key in ["syslog_drain_url", "route_service_url"] {
            if data.get_opt_str(key).is_some() {
                body[key] = url_field(data, key);
            }
        }
        let instance = session
            .v3
            .create::<ServiceInstance, _>(&body)
            .await?
            .ok_or_else(|| Error::not_found("user-provided service", &name))?;
        data.set_id(instance.guid);
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(instance) = fetch::<ServiceInstance>(session, data).await? else {
            return Ok(());
        };
        let id = instance.guid.clone();
        data.set("name", instance.name);
        data.set("tags", instance.tags);
        data.set("syslog_drain_url", instance.syslog_drain_url.unwrap_or_default());
        data.set("route_service_url", instance.route_service_url.unwrap_or_default());
        data.set(
            "space",
            instance.relationships.guid("space").unwrap_or_default(),
        );

        let server = session.v3.instance_credentials(&id).await?;
        let declared_json = json_attribute(data, "credentials_json").ok().flatten();
        match declared_json {
            // Keep the declared spelling while the documents agree.
            Some(declared) if declared == server => {}
            Some(_) => data.set("credentials_json", server.to_string()),
            None => {
                let flat: std::collections::BTreeMap<String, String> = server
                    .as_object()
                    .map(|o| {
                        o.iter()
                            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                            .collect()
                    })
                    .unwrap_or_default();
                data.set("credentials", flat);
            }
        }
        Ok(())
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        if data.has_change("space") {
            return Err(Error::update_not_supported(
                "cloudfoundry_user_provided_service space",
            ));
        }

        let mut body = Map::new();
        if data.has_change("name") {
            body.insert("name".into(), json!(required(data, "name")?));
        }
        if data.has_any_change(&["credentials", "credentials_json"]) {
            body.insert("credentials".into(), credentials(data)?);
        }
        for key in ["syslog_drain_url", "route_service_url"] {
            if data.has_change(key) {
                body.insert(key.into(), url_field(data, key));
            }
        }
        if data.has_change("tags") {
            body.insert("tags".into(), json!(data.get_list("tags")));
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
