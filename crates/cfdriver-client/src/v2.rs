//! The v2 endpoints still needed for role grants, plan visibility and
//! user-provided service lookups.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ClientError;
use crate::pagination::Query;
use crate::raw::RawClient;

/// v2 `{"metadata": {...}, "entity": {...}}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct V2Resource<T> {
    pub metadata: V2Meta,
    pub entity: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct V2Meta {
    pub guid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct V2User {
    #[serde(default)]
    pub username: Option<String>,
}

/// A user as listed under an organization or space role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMember {
    pub guid: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanVisibility {
    pub service_plan_guid: String,
    pub organization_guid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct V2ServicePlan {
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProvidedServiceInstance {
    pub name: String,
    #[serde(default)]
    pub credentials: Value,
    #[serde(default)]
    pub syslog_drain_url: Option<String>,
    #[serde(default)]
    pub route_service_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub space_guid: String,
}

/// Parent entity of a role: `organizations` or `spaces`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleParent {
    Organization,
    Space,
}

impl RoleParent {
    fn collection(&self) -> &'static str {
        match self {
            Self::Organization => "organizations",
            Self::Space => "spaces",
        }
    }
}

#[derive(Debug, Clone)]
pub struct V2Client {
    raw: Arc<RawClient>,
}

impl V2Client {
    pub fn new(raw: Arc<RawClient>) -> Self {
        Self { raw }
    }

    fn role_path(parent: RoleParent, guid: &str, role: &str) -> String {
        format!("/v2/{}/{}/{}", parent.collection(), guid, role)
    }

    // Roles

    pub async fn role_members(
        &self,
        parent: RoleParent,
        guid: &str,
        role: &str,
    ) -> Result<Vec<RoleMember>, ClientError> {
        let users: Vec<V2Resource<V2User>> = self
            .raw
            .list_v2(&Self::role_path(parent, guid, role), &Query::new())
            .await?;
        Ok(users
            .into_iter()
            .map(|u| RoleMember {
                guid: u.metadata.guid,
                username: u.entity.username,
            })
            .collect())
    }

    pub async fn grant_role(
        &self,
        parent: RoleParent,
        guid: &str,
        role: &str,
        user_guid: &str,
    ) -> Result<(), ClientError> {
        let path = format!("{}/{}", Self::role_path(parent, guid, role), user_guid);
        self.raw.put::<()>(&path, None).await?.success()?;
        Ok(())
    }

    pub async fn grant_role_by_username(
        &self,
        parent: RoleParent,
        guid: &str,
        role: &str,
        username: &str,
    ) -> Result<(), ClientError> {
        let body = json!({ "username": username });
        self.raw
            .put(&Self::role_path(parent, guid, role), Some(&body))
            .await?
            .success()?;
        Ok(())
    }

    /// Revokes a role. Revoking a grant that no longer exists succeeds.
    pub async fn revoke_role(
        &self,
        parent: RoleParent,
        guid: &str,
        role: &str,
        user_guid: &str,
    ) -> Result<(), ClientError> {
        let path = format!("{}/{}", Self::role_path(parent, guid, role), user_guid);
        self.raw.delete(&path).await?.accept(&[200, 201, 204, 404])?;
        Ok(())
    }

    // Service plan visibility

    pub async fn create_plan_visibility(
        &self,
        plan_guid: &str,
        org_guid: &str,
    ) -> Result<V2Resource<PlanVisibility>, ClientError> {
        #[derive(Serialize)]
        struct Body<'a> {
            service_plan_guid: &'a str,
            organization_guid: &'a str,
        }
        self.raw
            .post(
                "/v2/service_plan_visibilities",
                &Body {
                    service_plan_guid: plan_guid,
                    organization_guid: org_guid,
                },
            )
            .await?
            .success()?
            .json()
    }

    pub async fn plan_visibility(
        &self,
        guid: &str,
    ) -> Result<Option<V2Resource<PlanVisibility>>, ClientError> {
        self.raw
            .get_json(&format!("/v2/service_plan_visibilities/{guid}"))
            .await
    }

    pub async fn delete_plan_visibility(&self, guid: &str) -> Result<(), ClientError> {
        self.raw
            .delete(&format!("/v2/service_plan_visibilities/{guid}"))
            .await?
            .accept(&[200, 204, 404])?;
        Ok(())
    }

    pub async fn service_plan(
        &self,
        guid: &str,
    ) -> Result<Option<V2Resource<V2ServicePlan>>, ClientError> {
        self.raw.get_json(&format!("/v2/service_plans/{guid}")).await
    }

    pub async fn set_plan_public(&self, guid: &str, public: bool) -> Result<(), ClientError> {
        self.raw
            .put(
                &format!("/v2/service_plans/{guid}"),
                Some(&json!({ "public": public })),
            )
            .await?
            .success()?;
        Ok(())
    }

    // User-provided services

    pub async fn user_provided_services(
        &self,
        name: &str,
        space_guid: &str,
    ) -> Result<Vec<V2Resource<UserProvidedServiceInstance>>, ClientError> {
        let query = Query::new().q("name", name).q("space_guid", space_guid);
        self.raw
            .list_v2("/v2/user_provided_service_instances", &query)
            .await
    }
}
