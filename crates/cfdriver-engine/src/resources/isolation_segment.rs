//! `cloudfoundry_isolation_segment`

use async_trait::async_trait;
use cfdriver_client::Session;
use cfdriver_client::model::IsolationSegment;
use cfdriver_core::MetadataKind;
use serde_json::json;

use super::{fetch, required};
use crate::error::{Error, Result};
use crate::metadata::{metadata_create, metadata_read, metadata_update};
use crate::resource::Resource;
use crate::state::ResourceData;

const METADATA: MetadataKind = MetadataKind::IsolationSegments;

pub struct IsolationSegmentResource;

#[async_trait]
impl Resource for IsolationSegmentResource {
    fn kind(&self) -> &'static str {
        "cloudfoundry_isolation_segment"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let segment = session
            .v3
            .create::<IsolationSegment, _>(&json!({ "name": name }))
            .await?
            .ok_or_else(|| Error::not_found("isolation segment", &name))?;
        data.set_id(segment.guid);
        metadata_create(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(segment) = fetch::<IsolationSegment>(session, data).await? else {
            return Ok(());
        };
        data.set("name", segment.name);
        metadata_read(session, METADATA, data, false).await
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        if data.has_change("name") {
            let body = json!({ "name": required(data, "name")? });
            session
                .v3
                .update::<IsolationSegment, _>(data.id(), &body)
                .await?;
        }
        metadata_update(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<IsolationSegment>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}
