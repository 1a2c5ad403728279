//! `cloudfoundry_service_key`
//!
//! Keys are immutable. Broker credentials are arbitrary JSON and are exposed
//! as a flat `credentials` map with `_`-joined key paths.

use async_trait::async_trait;
use cfdriver_client::model::ServiceCredentialBinding;
use cfdriver_client::{Query, Session};
use cfdriver_core::flatten;
use serde_json::{Value, json};

use super::{fetch, json_attribute, required, to_one};
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::state::ResourceData;

/// Delimiter joining nested credential keys.
pub const CREDENTIALS_DELIMITER: &str = "_";

pub struct ServiceKey;

/// First key called `name` on `instance`.
pub async fn find_key(
    session: &Session,
    name: &str,
    instance: &str,
) -> Result<ServiceCredentialBinding> {
    session
        .v3
        .list::<ServiceCredentialBinding>(
            &Query::new()
                .names(name)
                .service_instance_guids(instance)
                .types("key"),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found("service key", name))
}

/// Reads the key's credentials into the flat `credentials` attribute.
pub async fn set_credentials(session: &Session, data: &mut ResourceData, guid: &str) -> Result<()> {
    let details = session.v3.binding_details(guid).await?;
    data.set(
        "credentials",
        flatten(&details.credentials, CREDENTIALS_DELIMITER),
    );
    Ok(())
}

/// Broker parameters from either the `params` map or `params_json`.
fn parameters(data: &ResourceData) -> Result<Option<Value>> {
    let params = data.get_map("params");
    if params.is_empty() {
        return json_attribute(data, "params_json");
    }
    if data.get_opt_str("params_json").is_some() {
        return Err(Error::invalid_attribute("params", "conflicts with 'params_json'"));
    }
    Ok(Some(json!(params)))
}

#[async_trait]
impl Resource for ServiceKey {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service_key"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let instance = required(data, "service_instance")?.to_string();
        let mut body = json!({
            "type": "key",
            "name": name,
            "relationships": { "service_instance": to_one(&instance) },
        });
        if let Some(params) = parameters(data)? {
            body["parameters"] = params;
        }

        let key = match session
            .v3
            .create::<ServiceCredentialBinding, _>(&body)
            .await?
        {
            Some(key) => key,
            None => find_key(session, &name, &instance).await?,
        };
        data.set_id(key.guid);
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(key) = fetch::<ServiceCredentialBinding>(session, data).await? else {
            return Ok(());
        };
        data.set("name", key.name.unwrap_or_default());
        data.set(
            "service_instance",
            key.relationships
                .guid("service_instance")
                .unwrap_or_default(),
        );
        set_credentials(session, data, &key.guid).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session
            .v3
            .delete::<ServiceCredentialBinding>(data.id())
            .await?;
        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::attributes_from_json;

    fn data(value: Value) -> ResourceData {
        ResourceData::from_attributes(attributes_from_json(&value))
    }

    #[test]
    fn test_parameters_from_map_or_json() {
        assert_eq!(
            parameters(&data(json!({"params": {"plan": "small"}}))).unwrap(),
            Some(json!({"plan": "small"}))
        );
        assert_eq!(
            parameters(&data(json!({"params_json": "{\"ttl\": 30}"}))).unwrap(),
            Some(json!({"ttl": 30}))
        );
        assert_eq!(parameters(&data(json!({}))).unwrap(), None);
    }

    #[test]
    fn test_params_conflict_with_params_json() {
        let err = parameters(&data(json!({
            "params": {"plan": "small"},
            "params_json": "{}"
        })))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { ref attribute, .. } if attribute == "params"));
    }
}
