//! Typed v3 endpoints.

use std::sync::Arc;

use cfdriver_core::{MetadataKind, MetadataPatch, MetadataRequest, PatchMap};
use serde::Serialize;
use serde_json::json;

use crate::error::ClientError;
use crate::model::{
    BindingDetails, Droplet, EnvironmentVariables, Feature, Package, Process, ToMany, ToOne,
    V3Resource,
};
use crate::pagination::{Page, Query};
use crate::raw::{RawClient, RawResponse};

#[derive(Debug, Clone)]
pub struct V3Client {
    raw: Arc<RawClient>,
}

impl V3Client {
    pub fn new(raw: Arc<RawClient>) -> Self {
        Self { raw }
    }

    fn collection<T: V3Resource>() -> String {
        format!("/v3/{}", T::COLLECTION)
    }

    fn member<T: V3Resource>(guid: &str) -> String {
        format!("/v3/{}/{}", T::COLLECTION, guid)
    }

    /// Fetches one resource; `None` when the server answers 404.
    pub async fn get<T: V3Resource>(&self, guid: &str) -> Result<Option<T>, ClientError> {
        self.raw.get_json(&Self::member::<T>(guid)).await
    }

    pub async fn list<T: V3Resource>(&self, query: &Query) -> Result<Vec<T>, ClientError> {
        self.raw.list_v3(&Self::collection::<T>(), query).await
    }

    /// Creates a resource.
    ///
    /// Synchronous creates return the new document. Asynchronous creates are
    /// waited for and return `None`; the caller looks the resource up again.
    pub async fn create<T: V3Resource, B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<Option<T>, ClientError> {
        let resp = self.raw.post(&Self::collection::<T>(), body).await?;
        self.finish(resp).await
    }

    /// Updates a resource, waiting for the job when the server answers 202.
    pub async fn update<T: V3Resource, B: Serialize + ?Sized>(
        &self,
        guid: &str,
        body: &B,
    ) -> Result<Option<T>, ClientError> {
        let resp = self.raw.patch(&Self::member::<T>(guid), body).await?;
        self.finish(resp).await
    }

    /// Deletes a resource and waits for the deletion job. A missing resource
    /// counts as deleted.
    pub async fn delete<T: V3Resource>(&self, guid: &str) -> Result<(), ClientError> {
        let resp = self.raw.delete(&Self::member::<T>(guid)).await?;
        if resp.status == 404 {
            return Ok(());
        }
        self.raw.settle(resp.success()?).await?;
        Ok(())
    }

    async fn finish<T: V3Resource>(&self, resp: RawResponse) -> Result<Option<T>, ClientError> {
        match resp.status {
            200 | 201 => resp.json().map(Some),
            202 => {
                self.raw.settle(resp).await?;
                Ok(None)
            }
            _ => Err(resp.into_error()),
        }
    }

    // Metadata

    /// Raw GET of an entity carrying metadata; callers apply their own
    /// status policy.
    pub async fn get_metadata(
        &self,
        kind: MetadataKind,
        guid: &str,
    ) -> Result<RawResponse, ClientError> {
        self.raw.get(&kind.path(guid), &[]).await
    }

    /// Raw PATCH of `{"metadata": ...}`; callers apply their own status policy.
    pub async fn patch_metadata(
        &self,
        kind: MetadataKind,
        guid: &str,
        patch: MetadataPatch,
    ) -> Result<RawResponse, ClientError> {
        let body = MetadataRequest { metadata: patch };
        self.raw.patch(&kind.path(guid), &body).await
    }

    // Applications

    pub async fn app_processes(&self, app_guid: &str) -> Result<Vec<Process>, ClientError> {
        self.raw
            .list_v3(&format!("/v3/apps/{app_guid}/processes"), &Query::new())
            .await
    }

    /// Scales a process. `None` fields are left as they are.
    pub async fn scale_process(
        &self,
        process_guid: &str,
        instances: Option<i64>,
        memory_in_mb: Option<i64>,
        disk_in_mb: Option<i64>,
    ) -> Result<Process, ClientError> {
        #[derive(Serialize)]
        struct Scale {
            #[serde(skip_serializing_if = "Option::is_none")]
            instances: Option<i64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            memory_in_mb: Option<i64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            disk_in_mb: Option<i64>,
        }
        let body = Scale {
            instances,
            memory_in_mb,
            disk_in_mb,
        };
        self.raw
            .post(&format!("/v3/processes/{process_guid}/actions/scale"), &body)
            .await?
            .success()?
            .json()
    }

    pub async fn app_feature(&self, app_guid: &str, feature: &str) -> Result<Feature, ClientError> {
        self.raw
            .get(&format!("/v3/apps/{app_guid}/features/{feature}"), &[])
            .await?
            .success()?
            .json()
    }

    pub async fn set_app_feature(
        &self,
        app_guid: &str,
        feature: &str,
        enabled: bool,
    ) -> Result<Feature, ClientError> {
        self.raw
            .patch(
                &format!("/v3/apps/{app_guid}/features/{feature}"),
                &json!({ "enabled": enabled }),
            )
            .await?
            .success()?
            .json()
    }

    pub async fn environment_variables(
        &self,
        app_guid: &str,
    ) -> Result<EnvironmentVariables, ClientError> {
        self.raw
            .get(&format!("/v3/apps/{app_guid}/environment_variables"), &[])
            .await?
            .success()?
            .json()
    }

    /// Sends a tri-valued environment patch; `Delete` entries unset the key.
    pub async fn patch_environment_variables(
        &self,
        app_guid: &str,
        patch: &PatchMap,
    ) -> Result<EnvironmentVariables, ClientError> {
        self.raw
            .patch(
                &format!("/v3/apps/{app_guid}/environment_variables"),
                &json!({ "var": patch }),
            )
            .await?
            .success()?
            .json()
    }

    /// The droplet the app would run, if it has been staged.
    pub async fn current_droplet(&self, app_guid: &str) -> Result<Option<Droplet>, ClientError> {
        self.raw
            .get_json(&format!("/v3/apps/{app_guid}/droplets/current"))
            .await
    }

    /// Newest package of the given type, if any.
    pub async fn latest_package(&self, app_guid: &str, kind: &str) -> Result<Option<Package>, ClientError> {
        let query = Query::new()
            .filter("types", [kind])
            .filter("order_by", ["-created_at"])
            .filter("per_page", ["1"]);
        let page: Page<Package> = self
            .raw
            .get(&format!("/v3/apps/{app_guid}/packages"), query.pairs())
            .await?
            .success()?
            .json()?;
        Ok(page.resources.into_iter().next())
    }

    /// Runs a lifecycle action (`start`, `stop`, `restart`).
    pub async fn app_action(&self, app_guid: &str, action: &str) -> Result<(), ClientError> {
        self.raw
            .post(
                &format!("/v3/apps/{app_guid}/actions/{action}"),
                &json!({}),
            )
            .await?
            .success()?;
        Ok(())
    }

    // Spaces and organizations

    pub async fn space_feature(&self, space_guid: &str, feature: &str) -> Result<Feature, ClientError> {
        self.raw
            .get(&format!("/v3/spaces/{space_guid}/features/{feature}"), &[])
            .await?
            .success()?
            .json()
    }

    pub async fn set_space_feature(
        &self,
        space_guid: &str,
        feature: &str,
        enabled: bool,
    ) -> Result<(), ClientError> {
        self.raw
            .patch(
                &format!("/v3/spaces/{space_guid}/features/{feature}"),
                &json!({ "enabled": enabled }),
            )
            .await?
            .success()?;
        Ok(())
    }

    pub async fn space_isolation_segment(&self, space_guid: &str) -> Result<ToOne, ClientError> {
        self.raw
            .get(
                &format!("/v3/spaces/{space_guid}/relationships/isolation_segment"),
                &[],
            )
            .await?
            .success()?
            .json()
    }

    /// Assigns (or with `None` resets) the space's isolation segment.
    pub async fn set_space_isolation_segment(
        &self,
        space_guid: &str,
        segment_guid: Option<&str>,
    ) -> Result<(), ClientError> {
        let body = match segment_guid {
            Some(guid) => ToOne::to(guid),
            None => ToOne::default(),
        };
        self.raw
            .patch(
                &format!("/v3/spaces/{space_guid}/relationships/isolation_segment"),
                &body,
            )
            .await?
            .success()?;
        Ok(())
    }

    /// Entitles organizations to use an isolation segment.
    pub async fn entitle_isolation_segment(
        &self,
        segment_guid: &str,
        org_guid: &str,
    ) -> Result<(), ClientError> {
        self.raw
            .post(
                &format!("/v3/isolation_segments/{segment_guid}/relationships/organizations"),
                &ToMany::of([org_guid]),
            )
            .await?
            .success()?;
        Ok(())
    }

    /// Applies an organization or space quota. `scope` is `organization` or `space`.
    pub async fn apply_quota(
        &self,
        scope: &str,
        quota_guid: &str,
        target_guid: &str,
    ) -> Result<(), ClientError> {
        self.raw
            .post(
                &format!("/v3/{scope}_quotas/{quota_guid}/relationships/{scope}s"),
                &ToMany::of([target_guid]),
            )
            .await?
            .success()?;
        Ok(())
    }

    pub async fn remove_space_quota(
        &self,
        quota_guid: &str,
        space_guid: &str,
    ) -> Result<(), ClientError> {
        self.raw
            .delete(&format!(
                "/v3/space_quotas/{quota_guid}/relationships/spaces/{space_guid}"
            ))
            .await?
            .accept(&[204, 404])?;
        Ok(())
    }

    // Services

    pub async fn binding_details(&self, binding_guid: &str) -> Result<BindingDetails, ClientError> {
        self.raw
            .get(
                &format!("/v3/service_credential_bindings/{binding_guid}/details"),
                &[],
            )
            .await?
            .success()?
            .json()
    }

    /// Credentials of a user-provided service instance.
    pub async fn instance_credentials(
        &self,
        instance_guid: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.raw
            .get(
                &format!("/v3/service_instances/{instance_guid}/credentials"),
                &[],
            )
            .await?
            .success()?
            .json()
    }

    pub async fn shared_spaces(&self, instance_guid: &str) -> Result<ToMany, ClientError> {
        self.raw
            .get(
                &format!("/v3/service_instances/{instance_guid}/relationships/shared_spaces"),
                &[],
            )
            .await?
            .success()?
            .json()
    }

    /// Shares an instance into spaces; returns the spaces the server reports.
    pub async fn share_instance(
        &self,
        instance_guid: &str,
        space_guids: &[&str],
    ) -> Result<ToMany, ClientError> {
        self.raw
            .post(
                &format!("/v3/service_instances/{instance_guid}/relationships/shared_spaces"),
                &ToMany::of(space_guids.iter().copied()),
            )
            .await?
            .success()?
            .json()
    }

    pub async fn unshare_instance(
        &self,
        instance_guid: &str,
        space_guid: &str,
    ) -> Result<(), ClientError> {
        self.raw
            .delete(&format!(
                "/v3/service_instances/{instance_guid}/relationships/shared_spaces/{space_guid}"
            ))
            .await?
            .accept(&[204, 404])?;
        Ok(())
    }
}
