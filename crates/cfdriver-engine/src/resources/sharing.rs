//! `cloudfoundry_service_instance_sharing`
//!
//! Identified by `<service_instance>:<space>`.

use async_trait::async_trait;
use cfdriver_client::Session;
use cfdriver_core::{CompositeId, compose_id};
use tracing::info;

use super::required;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::state::ResourceData;

pub struct ServiceInstanceSharing;

#[async_trait]
impl Resource for ServiceInstanceSharing {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service_instance_sharing"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let instance = required(data, "service_instance")?.to_string();
        let space = required(data, "space")?.to_string();

        let shared = session.v3.share_instance(&instance, &[&space]).await?;
        if shared.data.is_empty() {
            return Err(Error::ShareFailed { instance, space });
        }
        info!(%instance, %space, "service instance shared");
        data.set_id(compose_id(&instance, &space));
        Ok(())
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let id = CompositeId::parse(data.id())?;
        let shared = match session.v3.shared_spaces(&id.parent).await {
            Ok(shared) => shared,
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if !shared.guids().any(|g| g == id.child) {
            data.clear_id();
            return Ok(());
        }
        data.set("service_instance", id.parent);
        data.set("space", id.child);
        Ok(())
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let id = CompositeId::parse(data.id())?;
        session.v3.unshare_instance(&id.parent, &id.child).await?;
        data.clear_id();
        Ok(())
    }

    async fn import(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        CompositeId::parse(data.id())?;
        self.read(session, data).await
    }
}
