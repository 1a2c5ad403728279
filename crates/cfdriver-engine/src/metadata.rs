//! Labels and annotations reconciliation.
//!
//! Entities that carry metadata expose it under `/v3/<kind>/<guid>`. Writes
//! send a tri-valued patch built from the declared change; reads project the
//! server maps back, restricted to the declared keys unless importing.

use std::collections::BTreeMap;

use cfdriver_client::Session;
use cfdriver_core::{Metadata, MetadataKind, MetadataPatch, MetadataRequest, diff_maps};
use tracing::debug;

use crate::error::Result;
use crate::state::ResourceData;

pub const LABELS: &str = "labels";
pub const ANNOTATIONS: &str = "annotations";

/// Statuses the metadata writer accepts. A vanished entity (404) is reported
/// by the enclosing read, not here.
const ACCEPTED_WRITE: &[u16] = &[200, 202, 404];

/// Builds the patch moving the recorded metadata to the declared metadata.
pub fn metadata_patch(data: &ResourceData) -> MetadataPatch {
    MetadataPatch {
        labels: diff_maps(&data.prior_map(LABELS), &data.get_map(LABELS)),
        annotations: diff_maps(&data.prior_map(ANNOTATIONS), &data.get_map(ANNOTATIONS)),
    }
}

/// Applies declared metadata on a freshly created entity.
pub async fn metadata_create(
    session: &Session,
    kind: MetadataKind,
    data: &ResourceData,
) -> Result<()> {
    metadata_update(session, kind, data).await
}

/// Sends the metadata patch when labels or annotations changed.
pub async fn metadata_update(
    session: &Session,
    kind: MetadataKind,
    data: &ResourceData,
) -> Result<()> {
    if !session.metadata_available(kind) {
        debug!(%kind, version = session.api_version(), "metadata not supported, skipping write");
        return Ok(());
    }
    if !data.has_change(LABELS) && !data.has_change(ANNOTATIONS) {
        return Ok(());
    }

    let patch = metadata_patch(data);
    let resp = session
        .v3
        .patch_metadata(kind, data.id(), patch)
        .await?
        .accept(ACCEPTED_WRITE)?;
    session.raw.settle(resp).await?;
    Ok(())
}

/// Reads metadata back into `data`.
///
/// Nothing is fetched when no metadata is declared, unless `force` is set or
/// the resource is being imported.
pub async fn metadata_read(
    session: &Session,
    kind: MetadataKind,
    data: &mut ResourceData,
    force: bool,
) -> Result<()> {
    if !session.metadata_available(kind) {
        return Ok(());
    }

    let declared_labels = data.get_map(LABELS);
    let declared_annotations = data.get_map(ANNOTATIONS);
    if declared_labels.is_empty() && declared_annotations.is_empty() && !force && !data.is_import()
    {
        return Ok(());
    }

    let resp = session.v3.get_metadata(kind, data.id()).await?;
    let metadata = match resp.status {
        200 => resp.json::<MetadataRequest<Metadata>>()?.metadata,
        404 => Metadata::default(),
        _ => return Err(resp.into_error().into()),
    };

    if data.is_import() {
        data.set(LABELS, metadata.labels);
        data.set(ANNOTATIONS, metadata.annotations);
    } else {
        data.set(LABELS, project(&metadata.labels, &declared_labels));
        data.set(ANNOTATIONS, project(&metadata.annotations, &declared_annotations));
    }
    Ok(())
}

/// Server entries whose keys were declared.
fn project(
    server: &BTreeMap<String, String>,
    declared: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    server
        .iter()
        .filter(|(k, _)| declared.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Projects metadata already present in a listed document (data sources).
pub fn set_listed_metadata(data: &mut ResourceData, metadata: &Metadata) {
    data.set(LABELS, metadata.labels.clone());
    data.set(ANNOTATIONS, metadata.annotations.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{AttrValue, Attributes};
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> Attributes {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        [(LABELS.to_string(), AttrValue::Map(map))].into()
    }

    #[test]
    fn test_patch_tombstones_removed_keys() {
        let data = ResourceData::new(
            "g",
            labels(&[("a", "1"), ("b", "2")]),
            labels(&[("a", "1"), ("c", "3")]),
        );
        let body = serde_json::to_value(MetadataRequest {
            metadata: metadata_patch(&data),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"metadata": {"labels": {"a": "1", "c": "3", "b": null}, "annotations": {}}})
        );
    }

    #[test]
    fn test_projection_hides_unmanaged_keys() {
        let server: BTreeMap<String, String> =
            [("a".to_string(), "1".to_string()), ("system".to_string(), "x".to_string())].into();
        let declared: BTreeMap<String, String> = [("a".to_string(), "old".to_string())].into();
        let projected = project(&server, &declared);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected["a"], "1");
    }
}
