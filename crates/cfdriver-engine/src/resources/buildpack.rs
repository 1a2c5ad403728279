//! `cloudfoundry_buildpack`. Bits are uploaded out of band.

use async_trait::async_trait;
use cfdriver_client::model::Buildpack;
use cfdriver_client::{Query, Session};
use cfdriver_core::MetadataKind;
use serde_json::{Map, Value, json};

use super::{fetch, required};
use crate::error::{Error, Result};
use crate::metadata::{metadata_create, metadata_read, metadata_update};
use crate::resource::Resource;
use crate::state::ResourceData;

const METADATA: MetadataKind = MetadataKind::Buildpacks;

pub struct BuildpackResource;

fn body(data: &ResourceData) -> Result<Value> {
    let mut body = Map::new();
    body.insert("name".into(), json!(required(data, "name")?));
    if let Some(stack) = data.get_opt_str("stack") {
        body.insert("stack".into(), json!(stack));
    }
    if let Some(position) = data.get_int("position") {
        body.insert("position".into(), json!(position));
    }
    body.insert("enabled".into(), json!(data.get_bool("enabled").unwrap_or(true)));
    body.insert("locked".into(), json!(data.get_bool("locked").unwrap_or(false)));
    Ok(Value::Object(body))
}

#[async_trait]
impl Resource for BuildpackResource {
    fn kind(&self) -> &'static str {
        "cloudfoundry_buildpack"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let buildpack = match session.v3.create::<Buildpack, _>(&body(data)?).await? {
            Some(bp) => bp,
            None => session
                .v3
                .list::<Buildpack>(&Query::new().names(&name))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found("buildpack", &name))?,
        };
        data.set_id(buildpack.guid);
        metadata_create(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let Some(bp) = fetch::<Buildpack>(session, data).await? else {
            return Ok(());
        };
        data.set("name", bp.name);
        data.set("stack", bp.stack.unwrap_or_default());
        data.set("position", bp.position);
        data.set("enabled", bp.enabled);
        data.set("locked", bp.locked);
        metadata_read(session, METADATA, data, false).await
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        if data.has_any_change(&["name", "stack", "position", "enabled", "locked"]) {
            session
                .v3
                .update::<Buildpack, _>(data.id(), &body(data)?)
                .await?;
        }
        metadata_update(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<Buildpack>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}
