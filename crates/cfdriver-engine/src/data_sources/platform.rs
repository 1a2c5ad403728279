//! `cloudfoundry_stack` and `cloudfoundry_isolation_segment` lookups.

use async_trait::async_trait;
use cfdriver_client::model::{IsolationSegment, Stack};
use cfdriver_client::{Query, Session};

use crate::error::{Error, Result};
use crate::metadata::set_listed_metadata;
use crate::resource::DataSource;
use crate::resources::required;
use crate::state::ResourceData;

pub struct StackData;

#[async_trait]
impl DataSource for StackData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_stack"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let stack = session
            .v3
            .list::<Stack>(&Query::new().names(&name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("stack", &name))?;
        data.set_id(stack.guid);
        data.set("description", stack.description.unwrap_or_default());
        set_listed_metadata(data, &stack.metadata);
        Ok(())
    }
}

pub struct IsolationSegmentData;

#[async_trait]
impl DataSource for IsolationSegmentData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_isolation_segment"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let name = required(data, "name")?.to_string();
        let segment = session
            .v3
            .list::<IsolationSegment>(&Query::new().names(&name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("isolation segment", &name))?;
        data.set_id(segment.guid);
        set_listed_metadata(data, &segment.metadata);
        Ok(())
    }
}
