//! `cloudfoundry_org_users` and `cloudfoundry_space_users`.

use async_trait::async_trait;
use cfdriver_client::model::Space;
use cfdriver_client::{RoleParent, Session};

use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::roles::{project_members, reconcile_role, revoke_declared};
use crate::state::ResourceData;

/// Role lists of one organization or space. The id is the parent's GUID.
pub struct RoleMembership {
    kind: &'static str,
    parent: RoleParent,
    parent_attribute: &'static str,
    roles: &'static [&'static str],
}

pub fn org_users() -> RoleMembership {
    RoleMembership {
        kind: "cloudfoundry_org_users",
        parent: RoleParent::Organization,
        parent_attribute: "org",
        roles: &["managers", "billing_managers", "auditors"],
    }
}

pub fn space_users() -> RoleMembership {
    RoleMembership {
        kind: "cloudfoundry_space_users",
        parent: RoleParent::Space,
        parent_attribute: "space",
        roles: &["managers", "developers", "auditors"],
    }
}

impl RoleMembership {
    fn parent_guid<'a>(&self, data: &'a ResourceData) -> Result<&'a str> {
        data.get_opt_str(self.parent_attribute)
            .or(Some(data.id()).filter(|id| !id.is_empty()))
            .ok_or_else(|| Error::invalid_attribute(self.parent_attribute, "is required"))
    }

    /// Owning organization of a space; `None` for org roles.
    async fn owning_org(&self, session: &Session, guid: &str) -> Result<Option<String>> {
        if self.parent != RoleParent::Space {
            return Ok(None);
        }
        let space = session
            .v3
            .get::<Space>(guid)
            .await?
            .ok_or_else(|| Error::not_found("space", guid))?;
        Ok(space.relationships.guid("organization").map(str::to_string))
    }

    async fn converge(&self, session: &Session, data: &ResourceData, only_changed: bool) -> Result<()> {
        let guid = self.parent_guid(data)?.to_string();
        let org = self.owning_org(session, &guid).await?;
        for role in self.roles {
            if only_changed && !data.has_change(role) {
                continue;
            }
            let desired = data.get_list(role);
            reconcile_role(session, self.parent, &guid, role, &desired, org.as_deref()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for RoleMembership {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        self.converge(session, data, false).await?;
        let guid = self.parent_guid(data)?.to_string();
        data.set_id(guid);
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let guid = self.parent_guid(data)?.to_string();
        for role in self.roles {
            let current = match session.v2.role_members(self.parent, &guid, role).await {
                Ok(members) => members,
                Err(e) if e.is_not_found() => {
                    data.clear_id();
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let declared = data.get_list(role);
            data.set(role, project_members(&declared, &current));
        }
        data.set(self.parent_attribute, guid);
        Ok(())
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        self.converge(session, data, true).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let guid = self.parent_guid(data)?.to_string();
        for role in self.roles {
            let declared = data.get_list(role);
            if !declared.is_empty() {
                revoke_declared(session, self.parent, &guid, role, &declared).await?;
            }
        }
        data.clear_id();
        Ok(())
    }
}
