#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cfdriver_client::{JobSettings, Session, SessionConfig};
use cfdriver_engine::{AttrValue, Attributes, Provider};
use serde_json::Value;
use wiremock::MockServer;

pub fn session(server: &MockServer, version: &str) -> Arc<Session> {
    let config = SessionConfig::new(server.uri()).with_jobs(JobSettings {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(2),
    });
    Arc::new(Session::new(&config, version).unwrap())
}

pub fn provider(server: &MockServer, version: &str) -> Provider {
    Provider::new(Some(session(server, version)))
}

pub fn attrs(value: Value) -> Attributes {
    cfdriver_engine::value::attributes_from_json(&value)
}

pub fn map(value: &AttrValue) -> Vec<(String, String)> {
    value
        .as_map()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Requests received by the mock, as `METHOD path`.
pub async fn calls(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}
