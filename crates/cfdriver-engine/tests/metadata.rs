//! Metadata reconciliation against a mock Cloud Controller.

mod common;

use assert_json_diff::assert_json_eq;
use cfdriver_core::MetadataKind;
use cfdriver_engine::metadata::{metadata_read, metadata_update};
use cfdriver_engine::{AttrValue, Operation, Outcome, ResourceData, ResourceRequest};
use common::{attrs, calls, map, provider, session};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn org_doc(labels: serde_json::Value) -> serde_json::Value {
    json!({
        "guid": "o1",
        "name": "organization-one",
        "suspended": false,
        "relationships": {"quota": {"data": {"guid": "q1"}}},
        "metadata": {"labels": labels, "annotations": {}}
    })
}

#[tokio::test]
async fn test_org_labels_create_read_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/organizations"))
        .and(body_json(json!({"name": "organization-one", "suspended": false})))
        .respond_with(ResponseTemplate::new(201).set_body_json(org_doc(json!({}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v3/organizations/o1"))
        .and(body_json(json!({
            "metadata": {"labels": {"a": "1", "b": "2"}, "annotations": {}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(org_doc(json!({"a": "1", "b": "2"}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v3/organizations/o1"))
        .and(body_json(json!({
            "metadata": {"labels": {"a": "1", "c": "3", "b": null}, "annotations": {}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(org_doc(json!({"a": "1", "c": "3"}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/organizations/o1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(org_doc(json!({"a": "1", "b": "2", "unmanaged": "x"}))),
        )
        .mount(&server)
        .await;

    let provider = provider(&server, "3.100.0");
    let created = provider
        .apply(ResourceRequest {
            kind: "cloudfoundry_org".into(),
            operation: Operation::Create,
            id: String::new(),
            prior: Default::default(),
            desired: attrs(json!({"name": "organization-one", "labels": {"a": "1", "b": "2"}})),
        })
        .await;
    assert_eq!(created.outcome, Outcome::Ok);
    assert_eq!(created.id, "o1");
    assert_eq!(
        map(&created.attributes["labels"]),
        vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
    );

    let mut desired = created.attributes.clone();
    desired.insert(
        "labels".into(),
        AttrValue::from_json(&json!({"a": "1", "c": "3"})).unwrap(),
    );
    let updated = provider
        .apply(ResourceRequest {
            kind: "cloudfoundry_org".into(),
            operation: Operation::Update,
            id: "o1".into(),
            prior: created.attributes.clone(),
            desired,
        })
        .await;
    assert_eq!(updated.outcome, Outcome::Ok);

    let requests = server.received_requests().await.unwrap();
    let last_patch = requests
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .next_back()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&last_patch.body).unwrap();
    assert_json_eq!(
        body,
        json!({"metadata": {"labels": {"a": "1", "c": "3", "b": null}, "annotations": {}}})
    );
}

#[tokio::test]
async fn test_unchanged_metadata_sends_nothing() {
    let server = MockServer::start().await;
    let session = session(&server, "3.100.0");
    let same = attrs(json!({"labels": {"a": "1"}}));
    let data = ResourceData::new("o1", same.clone(), same);

    metadata_update(&session, MetadataKind::Organizations, &data)
        .await
        .unwrap();
    assert!(calls(&server).await.is_empty());
}

#[tokio::test]
async fn test_gated_kind_is_a_silent_no_op() {
    let server = MockServer::start().await;
    let session = session(&server, "3.70.0");
    let mut data = ResourceData::new(
        "b1",
        attrs(json!({"labels": {"a": "1"}})),
        attrs(json!({"labels": {"a": "2"}})),
    );

    metadata_read(&session, MetadataKind::ServiceBrokers, &mut data, true)
        .await
        .unwrap();
    metadata_update(&session, MetadataKind::ServiceBrokers, &data)
        .await
        .unwrap();

    assert!(calls(&server).await.is_empty());
    assert_eq!(
        map(&data.attributes()["labels"]),
        vec![("a".to_string(), "2".to_string())]
    );
}

#[tokio::test]
async fn test_read_short_circuits_without_declared_metadata() {
    let server = MockServer::start().await;
    let session = session(&server, "3.100.0");
    let mut data = ResourceData::new("o1", Default::default(), Default::default());

    metadata_read(&session, MetadataKind::Organizations, &mut data, false)
        .await
        .unwrap();
    assert!(calls(&server).await.is_empty());
}

#[tokio::test]
async fn test_import_projects_every_server_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/spaces/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "guid": "s1",
            "metadata": {"labels": {"team": "core", "env": "prod"}, "annotations": {"note": "x"}}
        })))
        .mount(&server)
        .await;
    let session = session(&server, "3.100.0");
    let mut data = ResourceData::for_import("s1");

    metadata_read(&session, MetadataKind::Spaces, &mut data, false)
        .await
        .unwrap();
    assert_eq!(map(&data.attributes()["labels"]).len(), 2);
    assert_eq!(map(&data.attributes()["annotations"]).len(), 1);
}

#[tokio::test]
async fn test_write_tolerates_vanished_entity_but_not_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v3/stacks/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v3/stacks/bad"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid label"))
        .mount(&server)
        .await;
    let session = session(&server, "3.100.0");

    let desired = attrs(json!({"labels": {"a": "1"}}));
    let gone = ResourceData::new("gone", Default::default(), desired.clone());
    metadata_update(&session, MetadataKind::Stacks, &gone)
        .await
        .unwrap();

    let bad = ResourceData::new("bad", Default::default(), desired);
    let err = metadata_update(&session, MetadataKind::Stacks, &bad)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unexpected status 422: invalid label");
}
