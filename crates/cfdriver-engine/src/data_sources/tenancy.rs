//! `cloudfoundry_org` and `cloudfoundry_space` lookups.

use async_trait::async_trait;
use cfdriver_client::model::{Organization, Space};
use cfdriver_client::{Query, Session};

use crate::error::{Error, Result};
use crate::metadata::set_listed_metadata;
use crate::resource::DataSource;
use crate::resources::required;
use crate::state::ResourceData;

pub struct OrgData;

#[async_trait]
impl DataSource for OrgData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_org"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let org = session
            .v3
            .list::<Organization>(&Query::new().names(&name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("org", &name))?;
        data.set_id(org.guid);
        data.set("suspended", org.suspended);
        set_listed_metadata(data, &org.metadata);
        Ok(())
    }
}

pub struct SpaceData;

#[async_trait]
impl DataSource for SpaceData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_space"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let org = required(data, "org")?.to_string();
        let space = session
            .v3
            .list::<Space>(&Query::new().names(&name).organization_guids(&org))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("space", &name))?;
        data.set_id(space.guid);
        data.set(
            "quota",
            space.relationships.guid("quota").unwrap_or_default(),
        );
        set_listed_metadata(data, &space.metadata);
        Ok(())
    }
}
