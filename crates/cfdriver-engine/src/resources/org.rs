//! `cloudfoundry_org`

use async_trait::async_trait;
use cfdriver_client::model::Organization;
use cfdriver_client::{Query, Session};
use cfdriver_core::MetadataKind;
use serde_json::json;

use super::{fetch, required};
use crate::error::{Error, Result};
use crate::metadata::{metadata_create, metadata_read, metadata_update};
use crate::resource::Resource;
use crate::state::ResourceData;

const METADATA: MetadataKind = MetadataKind::Organizations;

pub struct Org;

impl Org {
    async fn apply_quota(session: &Session, data: &ResourceData) -> Result<()> {
        if let Some(quota) = data.get_opt_str("quota") {
            session
                .v3
                .apply_quota("organization", quota, data.id())
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for Org {
    fn kind(&self) -> &'static str {
        "cloudfoundry_org"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let body = json!({
            "name": name,
            "suspended": data.get_bool("suspended").unwrap_or(false),
        });
        let org = match session.v3.create::<Organization, _>(&body).await? {
            Some(org) => org,
            None => session
                .v3
                .list::<Organization>(&Query::new().names(&name))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found("org", &name))?,
        };
        data.set_id(org.guid);

        Self::apply_quota(session, data).await?;
        metadata_create(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(org) = fetch::<Organization>(session, data).await? else {
            return Ok(());
        };
        data.set("name", org.name);
        data.set("suspended", org.suspended);
        data.set(
            "quota",
            org.relationships.guid("quota").unwrap_or_default(),
        );
        metadata_read(session, METADATA, data, false).await
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        if data.has_any_change(&["name", "suspended"]) {
            let body = json!({
                "name": required(data, "name")?,
                "suspended": data.get_bool("suspended").unwrap_or(false),
            });
            session
                .v3
                .update::<Organization, _>(data.id(), &body)
                .await?;
        }
        if data.has_change("quota") {
            Self::apply_quota(session, data).await?;
        }
        metadata_update(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<Organization>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}
