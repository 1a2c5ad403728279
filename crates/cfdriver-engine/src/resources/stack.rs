//! `cloudfoundry_stack`. Only metadata can change after creation.

use async_trait::async_trait;
use cfdriver_client::Session;
use cfdriver_client::model::Stack;
use cfdriver_core::MetadataKind;
use serde_json::json;

use super::{fetch, required};
use crate::error::{Error, Result};
use crate::metadata::{metadata_create, metadata_read, metadata_update};
use crate::resource::Resource;
use crate::state::ResourceData;

const METADATA: MetadataKind = MetadataKind::Stacks;

pub struct StackResource;

#[async_trait]
impl Resource for StackResource {
    fn kind(&self) -> &'static str {
        "cloudfoundry_stack"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let body = json!({
            "name": name,
            "description": data.get_opt_str("description"),
        });
        let stack = session
            .v3
            .create::<Stack, _>(&body)
            .await?
            .ok_or_else(|| Error::not_found("stack", &name))?;
        data.set_id(stack.guid);
        metadata_create(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(stack) = fetch::<Stack>(session, data).await? else {
            return Ok(());
        };
        data.set("name", stack.name);
        data.set("description", stack.description.unwrap_or_default());
        metadata_read(session, METADATA, data, false).await
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        if data.has_any_change(&["name", "description"]) {
            return Err(Error::update_not_supported(self.kind()));
        }
        metadata_update(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<Stack>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}
