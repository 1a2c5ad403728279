//! `cloudfoundry_space`

use async_trait::async_trait;
use cfdriver_client::model::Space;
use cfdriver_client::{Query, Session};
use cfdriver_core::MetadataKind;
use serde_json::json;

use super::{fetch, required, to_one};
use crate::error::{Error, Result};
use crate::metadata::{metadata_create, metadata_read, metadata_update};
use crate::resource::Resource;
use crate::state::ResourceData;

const METADATA: MetadataKind = MetadataKind::Spaces;

pub struct SpaceResource;

impl SpaceResource {
    async fn apply_settings(session: &Session, data: &ResourceData, updating: bool) -> Result<()> {
        let id = data.id();

        if let Some(allow_ssh) = data.get_bool("allow_ssh")
            && (!updating || data.has_change("allow_ssh"))
        {
            session.v3.set_space_feature(id, "ssh", allow_ssh).await?;
        }

        if !updating || data.has_change("isolation_segment") {
            let segment = data.get_opt_str("isolation_segment");
            if segment.is_some() || updating {
                session.v3.set_space_isolation_segment(id, segment).await?;
            }
        }

        if !updating || data.has_change("quota") {
            if updating
                && let (Some(old), _) = data.get_change("quota")
                && let Some(old) = old.as_str().filter(|q| !q.is_empty())
            {
                session.v3.remove_space_quota(old, id).await?;
            }
            if let Some(quota) = data.get_opt_str("quota") {
                session.v3.apply_quota("space", quota, id).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for SpaceResource {
    fn kind(&self) -> &'static str {
        "cloudfoundry_space"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let org = required(data, "org")?.to_string();
        let body = json!({
            "name": name,
            "relationships": { "organization": to_one(&org) },
        });
        let space = match session.v3.create::<Space, _>(&body).await? {
            Some(space) => space,
            None => session
                .v3
                .list::<Space>(&Query::new().names(&name).organization_guids(&org))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found("space", &name))?,
        };
        data.set_id(space.guid);

        Self::apply_settings(session, data, false).await?;
        metadata_create(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(space) = fetch::<Space>(session, data).await? else {
            return Ok(());
        };
        let id = space.guid.clone();
        data.set("name", space.name);
        data.set(
            "org",
            space.relationships.guid("organization").unwrap_or_default(),
        );
        data.set(
            "quota",
            space.relationships.guid("quota").unwrap_or_default(),
        );

        let ssh = session.v3.space_feature(&id, "ssh").await?;
        data.set("allow_ssh", ssh.enabled);

        let segment = session.v3.space_isolation_segment(&id).await?;
        data.set(
            "isolation_segment",
            segment.data.map(|g| g.guid).unwrap_or_default(),
        );

        metadata_read(session, METADATA, data, false).await
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        if data.has_change("name") {
            let body = json!({ "name": required(data, "name")? });
            session.v3.update::<Space, _>(data.id(), &body).await?;
        }
        Self::apply_settings(session, data, true).await?;
        metadata_update(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<Space>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}
