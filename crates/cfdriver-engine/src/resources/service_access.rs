//! `cloudfoundry_service_plan_access`
//!
//! Two mutually exclusive shapes: an org-scoped plan visibility (`plan` and
//! `org`, identified by the visibility GUID) or the plan's global `public`
//! flag (`plan` and optional `public`, default false, identified by the plan
//! GUID).

use async_trait::async_trait;
use cfdriver_client::Session;

use super::required;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::state::ResourceData;

pub struct ServicePlanAccess;

impl ServicePlanAccess {
    async fn read_visibility(session: &Session, data: &mut ResourceData) -> Result<bool> {
        let Some(visibility) = session.v2.plan_visibility(data.id()).await? else {
            return Ok(false);
        };
        data.set("plan", visibility.entity.service_plan_guid);
        data.set("org", visibility.entity.organization_guid);
        data.remove("public");
        Ok(true)
    }

    async fn read_plan(session: &Session, data: &mut ResourceData) -> Result<bool> {
        let Some(plan) = session.v2.service_plan(data.id()).await? else {
            return Ok(false);
        };
        data.set("plan", plan.metadata.guid);
        data.set("public", plan.entity.public);
        data.remove("org");
        Ok(true)
    }
}

#[async_trait]
impl Resource for ServicePlanAccess {
    fn kind(&self) -> &'static str {
        "cloudfoundry_service_plan_access"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let plan = required(data, "plan")?.to_string();
        let org = data.get_opt_str("org").map(str::to_string);
        match (org, data.get_bool("public")) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid_attribute(
                    "public",
                    "conflicts with 'org'",
                ));
            }
            (Some(org), None) => {
                let visibility = session.v2.create_plan_visibility(&plan, &org).await?;
                data.set_id(visibility.metadata.guid);
            }
            // Without an org the plan's global flag is managed; unset means private.
            (None, public) => {
                session
                    .v2
                    .set_plan_public(&plan, public.unwrap_or(false))
                    .await?;
                data.set_id(plan);
            }
        }
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let found = if data.is_import() {
            Self::read_visibility(session, data).await? || Self::read_plan(session, data).await?
        } else if data.get_opt_str("org").is_some() {
            Self::read_visibility(session, data).await?
        } else {
            Self::read_plan(session, data).await?
        };
        if !found {
            data.clear_id();
        }
        Ok(())
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        // A global flag is left as it is.
        if data.get_opt_str("org").is_some() {
            session.v2.delete_plan_visibility(data.id()).await?;
        }
        data.clear_id();
        Ok(())
    }
}
