//! Service offering, instance, user-provided service and key lookups.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cfdriver_client::model::{ServiceInstance, ServiceOffering, ServicePlan};
use cfdriver_client::{Query, Session};
use cfdriver_core::{flatten, is_guid};

use crate::error::{Error, Result};
use crate::resource::DataSource;
use crate::resources::required;
use crate::resources::service_instance::find_instance;
use crate::resources::service_key::{CREDENTIALS_DELIMITER, find_key, set_credentials};
use crate::state::ResourceData;

/// Plan names become map keys; dots are not allowed there.
pub fn plan_key(name: &str) -> String {
    name.replace('.', "_")
}

/// `cloudfoundry_service`: an offering and its plans.
pub struct ServiceData;

#[async_trait]
impl DataSource for ServiceData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let mut query = Query::new().names(&name);
        if let Some(space) = data.get_opt_str("space") {
            query = query.space_guids(space);
        }
        if let Some(broker) = data.get_opt_str("service_broker_guid") {
            query = query.service_broker_guids(broker);
        }

        let offering = session
            .v3
            .list::<ServiceOffering>(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("service", &name))?;

        let plans = session
            .v3
            .list::<ServicePlan>(&Query::new().service_offering_guids(&offering.guid))
            .await?;
        let plans: BTreeMap<String, String> = plans
            .into_iter()
            .map(|p| (plan_key(&p.name), p.guid))
            .collect();

        data.set(
            "service_broker_guid",
            offering
                .relationships
                .guid("service_broker")
                .unwrap_or_default(),
        );
        data.set("service_plans", plans);
        data.set_id(offering.guid);
        Ok(())
    }
}

/// `cloudfoundry_service_instance`, by name within a space or by GUID.
pub struct ServiceInstanceData;

#[async_trait]
impl DataSource for ServiceInstanceData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service_instance"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let key = required(data, "name_or_id")?.to_string();
        let instance = if is_guid(&key) {
            session.v3.get::<ServiceInstance>(&key).await?
        } else {
            None
        };
        let instance = match instance {
            Some(instance) => instance,
            None => find_instance(session, &key, required(data, "space")?).await?,
        };

        data.set("name", instance.name);
        data.set("type", instance.kind);
        data.set("tags", instance.tags);
        data.set(
            "service_plan_id",
            instance
                .relationships
                .guid("service_plan")
                .unwrap_or_default(),
        );
        data.set_id(instance.guid);
        Ok(())
    }
}

/// `cloudfoundry_user_provided_service`, through the v2 name and space filter.
pub struct UserProvidedServiceData;

#[async_trait]
impl DataSource for UserProvidedServiceData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_user_provided_service"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let space = required(data, "space")?.to_string();
        let found = session
            .v2
            .user_provided_services(&name, &space)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("user-provided service", &name))?;

        let ups = found.entity;
        data.set(
            "credentials",
            flatten(&ups.credentials, CREDENTIALS_DELIMITER),
        );
        data.set("syslog_drain_url", ups.syslog_drain_url.unwrap_or_default());
        data.set("route_service_url", ups.route_service_url.unwrap_or_default());
        data.set("tags", ups.tags);
        data.set_id(found.metadata.guid);
        Ok(())
    }
}

/// `cloudfoundry_service_key`, with flattened credentials.
pub struct ServiceKeyData;

#[async_trait]
impl DataSource for ServiceKeyData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service_key"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let instance = required(data, "service_instance")?.to_string();
        let key = find_key(session, &name, &instance).await?;
        set_credentials(session, data, &key.guid).await?;
        data.set_id(key.guid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_key() {
        assert_eq!(plan_key("v1.small.ha"), "v1_small_ha");
        assert_eq!(plan_key("default"), "default");
    }
}
