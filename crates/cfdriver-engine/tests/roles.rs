//! Role membership convergence over the v2 role endpoints.

mod common;

use cfdriver_engine::{Operation, Outcome, ResourceRequest};
use common::{attrs, calls, provider};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALICE: &str = "7d7f1e6a-0a87-4a5b-9a40-5c4ad4f8a001";

fn members(entries: &[(&str, &str)]) -> serde_json::Value {
    let resources: Vec<_> = entries
        .iter()
        .map(|(guid, username)| json!({"metadata": {"guid": guid}, "entity": {"username": username}}))
        .collect();
    json!({"next_url": null, "resources": resources})
}

async fn mount_members(server: &MockServer, route: &str, entries: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(members(entries)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_org_managers_add_before_remove() {
    let server = MockServer::start().await;
    mount_members(&server, "/v2/organizations/o1/managers", &[("u-old", "old")]).await;
    mount_members(&server, "/v2/organizations/o1/billing_managers", &[]).await;
    mount_members(&server, "/v2/organizations/o1/auditors", &[]).await;
    Mock::given(method("PUT"))
        .and(path("/v2/organizations/o1/managers"))
        .and(body_json(json!({"username": "alice"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/organizations/o1/managers/u-old"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server, "3.100.0")
        .apply(ResourceRequest {
            kind: "cloudfoundry_org_users".into(),
            operation: Operation::Update,
            id: "o1".into(),
            prior: attrs(json!({"org": "o1", "managers": ["u-old"]})),
            desired: attrs(json!({"org": "o1", "managers": ["alice"]})),
        })
        .await;
    assert_eq!(response.outcome, Outcome::Ok);

    let writes: Vec<String> = calls(&server)
        .await
        .into_iter()
        .filter(|c| !c.starts_with("GET"))
        .collect();
    assert_eq!(
        writes,
        vec![
            "PUT /v2/organizations/o1/managers".to_string(),
            "DELETE /v2/organizations/o1/managers/u-old".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_unchanged_roles_are_not_touched_on_update() {
    let server = MockServer::start().await;
    mount_members(&server, "/v2/organizations/o1/managers", &[]).await;
    mount_members(&server, "/v2/organizations/o1/billing_managers", &[]).await;
    mount_members(&server, "/v2/organizations/o1/auditors", &[("u-1", "x")]).await;

    let same = attrs(json!({"org": "o1", "auditors": ["u-1"]}));
    let response = provider(&server, "3.100.0")
        .apply(ResourceRequest {
            kind: "cloudfoundry_org_users".into(),
            operation: Operation::Update,
            id: "o1".into(),
            prior: same.clone(),
            desired: same,
        })
        .await;
    assert_eq!(response.outcome, Outcome::Ok);
    assert!(calls(&server).await.iter().all(|c| c.starts_with("GET")));
}

#[tokio::test]
async fn test_space_developer_gains_org_membership_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/spaces/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "guid": "s1",
            "name": "dev",
            "relationships": {"organization": {"data": {"guid": "o1"}}}
        })))
        .mount(&server)
        .await;
    mount_members(&server, "/v2/spaces/s1/managers", &[]).await;
    mount_members(&server, "/v2/spaces/s1/developers", &[]).await;
    mount_members(&server, "/v2/spaces/s1/auditors", &[]).await;
    mount_members(&server, "/v2/organizations/o1/users", &[]).await;
    Mock::given(method("PUT"))
        .and(path(format!("/v2/organizations/o1/users/{ALICE}")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/v2/spaces/s1/developers/{ALICE}")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server, "3.100.0")
        .apply(ResourceRequest {
            kind: "cloudfoundry_space_users".into(),
            operation: Operation::Create,
            id: String::new(),
            prior: Default::default(),
            desired: attrs(json!({"space": "s1", "developers": [ALICE]})),
        })
        .await;
    assert_eq!(response.outcome, Outcome::Ok);
    assert_eq!(response.id, "s1");

    let writes: Vec<String> = calls(&server)
        .await
        .into_iter()
        .filter(|c| c.starts_with("PUT"))
        .collect();
    assert_eq!(
        writes,
        vec![
            format!("PUT /v2/organizations/o1/users/{ALICE}"),
            format!("PUT /v2/spaces/s1/developers/{ALICE}"),
        ]
    );
}

#[tokio::test]
async fn test_delete_revokes_only_declared_members() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/organizations/o1/auditors/u-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_members(&server, "/v2/organizations/o1/auditors", &[("u-1", "a"), ("u-2", "b")]).await;

    let recorded = attrs(json!({"org": "o1", "auditors": ["u-1"]}));
    let response = provider(&server, "3.100.0")
        .apply(ResourceRequest {
            kind: "cloudfoundry_org_users".into(),
            operation: Operation::Delete,
            id: "o1".into(),
            prior: recorded,
            desired: Default::default(),
        })
        .await;
    assert_eq!(response.outcome, Outcome::Ok);
    assert!(response.id.is_empty());
    assert!(
        !calls(&server)
            .await
            .contains(&"DELETE /v2/organizations/o1/auditors/u-2".to_string())
    );
}

#[tokio::test]
async fn test_space_roles_second_update_is_read_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/spaces/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "guid": "s1",
            "name": "dev",
            "relationships": {"organization": {"data": {"guid": "o1"}}}
        })))
        .mount(&server)
        .await;
    mount_members(&server, "/v2/spaces/s1/managers", &[]).await;
    mount_members(&server, "/v2/spaces/s1/auditors", &[]).await;
    mount_members(&server, "/v2/organizations/o1/users", &[(ALICE, "alice")]).await;
    // Developers are listed empty once, then with the granted member.
    Mock::given(method("GET"))
        .and(path("/v2/spaces/s1/developers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(members(&[])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_members(&server, "/v2/spaces/s1/developers", &[(ALICE, "alice")]).await;
    Mock::given(method("PUT"))
        .and(path(format!("/v2/spaces/s1/developers/{ALICE}")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server, "3.100.0");
    let first = provider
        .apply(ResourceRequest {
            kind: "cloudfoundry_space_users".into(),
            operation: Operation::Update,
            id: "s1".into(),
            prior: attrs(json!({"space": "s1", "developers": []})),
            desired: attrs(json!({"space": "s1", "developers": [ALICE]})),
        })
        .await;
    assert_eq!(first.outcome, Outcome::Ok);
    let after_first = calls(&server).await;
    assert_eq!(
        after_first,
        vec![
            "GET /v3/spaces/s1".to_string(),
            "GET /v2/spaces/s1/developers".to_string(),
            "GET /v2/organizations/o1/users".to_string(),
            format!("PUT /v2/spaces/s1/developers/{ALICE}"),
            "GET /v2/spaces/s1/managers".to_string(),
            "GET /v2/spaces/s1/developers".to_string(),
            "GET /v2/spaces/s1/auditors".to_string(),
        ]
    );

    let second = provider
        .apply(ResourceRequest {
            kind: "cloudfoundry_space_users".into(),
            operation: Operation::Update,
            id: "s1".into(),
            prior: first.attributes.clone(),
            desired: first.attributes,
        })
        .await;
    assert_eq!(second.outcome, Outcome::Ok);
    let repeated: Vec<String> = calls(&server).await.split_off(after_first.len());
    assert_eq!(
        repeated,
        vec![
            "GET /v3/spaces/s1",
            "GET /v2/spaces/s1/managers",
            "GET /v2/spaces/s1/developers",
            "GET /v2/spaces/s1/auditors",
        ]
    );
}
