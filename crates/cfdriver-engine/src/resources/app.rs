//! `cloudfoundry_app`
//!
//! One declaration spans several v3 endpoints: the app itself with its
//! lifecycle (buildpacks, or a docker package), its first process, the `ssh`
//! app feature and the environment variables. Reads compose them; writes go
//! app, process, ssh, environment, run state and finally metadata, so a
//! metadata failure never leaves the app half configured.

use async_trait::async_trait;
use cfdriver_client::model::{App, Package, Process};
use cfdriver_client::{Query, Session};
use cfdriver_core::{MetadataKind, diff_maps, is_guid, scalar_to_string};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{required, to_one};
use crate::error::{Error, Result};
use crate::metadata::{metadata_create, metadata_read, metadata_update};
use crate::resource::Resource;
use crate::state::ResourceData;

const METADATA: MetadataKind = MetadataKind::Apps;

const HEALTH_CHECK_TYPES: &[&str] = &["port", "process", "http", "none"];
const PROCESS_FIELDS: &[&str] = &[
    "command",
    "health_check_type",
    "health_check_http_endpoint",
    "health_check_timeout",
];
const SCALE_FIELDS: &[&str] = &["instances", "memory", "disk_quota"];

pub struct AppResource;

/// Finds an app by GUID or by name, optionally within a space.
///
/// A GUID-shaped input matching no app falls back to a name query, which may
/// find an unrelated app that happens to carry that name.
pub async fn find_app(session: &Session, name_or_guid: &str, space: Option<&str>) -> Result<App> {
    if is_guid(name_or_guid)
        && let Some(app) = session
            .v3
            .list::<App>(&Query::new().guids(name_or_guid))
            .await?
            .into_iter()
            .next()
    {
        return Ok(app);
    }

    let mut query = Query::new().names(name_or_guid);
    if let Some(space) = space {
        query = query.space_guids(space);
    }
    session
        .v3
        .list::<App>(&query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found("app", name_or_guid))
}

/// Writes the composed view of `app` into `data`.
pub async fn project_app(session: &Session, app: App, data: &mut ResourceData) -> Result<()> {
    let guid = app.guid.clone();
    data.set_id(guid.as_str());
    data.set("stack", app.stack().unwrap_or_default());
    data.set(
        "buildpack",
        app.buildpacks().first().map(String::as_str).unwrap_or_default(),
    );
    data.set(
        "space",
        app.relationships.guid("space").unwrap_or_default(),
    );
    if app.is_docker() {
        let image = session
            .v3
            .latest_package(&guid, "docker")
            .await?
            .and_then(|p| p.data.image);
        data.set("docker_image", image.unwrap_or_default());
    }
    data.set("stopped", app.state == "STOPPED");
    data.set("state", app.state);
    data.set("name", app.name);

    let processes = session.v3.app_processes(&guid).await?;
    if let Some(process) = processes.into_iter().next() {
        project_process(process, data);
    }

    let ssh = session.v3.app_feature(&guid, "ssh").await?;
    data.set("enable_ssh", ssh.enabled);

    let env = session.v3.environment_variables(&guid).await?;
    data.set(
        "environment",
        env.var
            .iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect::<std::collections::BTreeMap<_, _>>(),
    );

    metadata_read(session, METADATA, data, true).await
}

fn project_process(process: Process, data: &mut ResourceData) {
    data.set("instances", process.instances);
    data.set("memory", process.memory_in_mb);
    data.set("disk_quota", process.disk_in_mb);
    data.set("command", process.command.unwrap_or_default());
    if let Some(hc) = process.health_check {
        data.set("health_check_type", hc.kind);
        data.set(
            "health_check_http_endpoint",
            hc.data.endpoint.unwrap_or_default(),
        );
        data.set("health_check_timeout", hc.data.timeout.unwrap_or_default());
    }
}

fn validate(data: &ResourceData) -> Result<()> {
    if data.get_opt_str("docker_image").is_some() {
        if data.get_opt_str("buildpack").is_some() {
            return Err(Error::invalid_attribute(
                "docker_image",
                "conflicts with 'buildpack'",
            ));
        }
        if data.get_opt_str("stack").is_some() {
            return Err(Error::invalid_attribute("docker_image", "conflicts with 'stack'"));
        }
    }
    let credentials = data.get_map("docker_credentials");
    if !credentials.is_empty() {
        if data.get_opt_str("docker_image").is_none() {
            return Err(Error::invalid_attribute(
                "docker_credentials",
                "requires 'docker_image'",
            ));
        }
        if !credentials.contains_key("username") || !credentials.contains_key("password") {
            return Err(Error::invalid_attribute(
                "docker_credentials",
                "must contain 'username' and 'password'",
            ));
        }
    }
    if let Some(kind) = data.get_opt_str("health_check_type")
        && !HEALTH_CHECK_TYPES.contains(&kind)
    {
        return Err(Error::invalid_attribute(
            "health_check_type",
            format!("must be one of {}", HEALTH_CHECK_TYPES.join(", ")),
        ));
    }
    Ok(())
}

fn lifecycle(data: &ResourceData) -> Value {
    if data.get_opt_str("docker_image").is_some() {
        return json!({ "type": "docker", "data": {} });
    }
    let buildpacks: Vec<&str> = data.get_opt_str("buildpack").into_iter().collect();
    let mut lifecycle_data = json!({ "buildpacks": buildpacks });
    if let Some(stack) = data.get_opt_str("stack") {
        lifecycle_data["stack"] = json!(stack);
    }
    json!({ "type": "buildpack", "data": lifecycle_data })
}

/// Docker package pointing the app at `docker_image`.
fn docker_package_body(app_guid: &str, image: &str, data: &ResourceData) -> Value {
    let mut package_data = json!({ "image": image });
    let credentials = data.get_map("docker_credentials");
    if let (Some(username), Some(password)) = (credentials.get("username"), credentials.get("password")) {
        package_data["username"] = json!(username);
        package_data["password"] = json!(password);
    }
    json!({
        "type": "docker",
        "data": package_data,
        "relationships": { "app": to_one(app_guid) },
    })
}

fn process_body(data: &ResourceData) -> Value {
    let kind = data.get_opt_str("health_check_type").unwrap_or("port");
    let mut check = Map::new();
    if let Some(timeout) = data.get_int("health_check_timeout").filter(|t| *t > 0) {
        check.insert("timeout".into(), json!(timeout));
    }
    if kind == "http"
        && let Some(endpoint) = data.get_opt_str("health_check_http_endpoint")
    {
        check.insert("endpoint".into(), json!(endpoint));
    }
    json!({
        "command": data.get_opt_str("command"),
        "health_check": { "type": kind, "data": check },
    })
}

impl AppResource {
    async fn write_docker_package(session: &Session, data: &ResourceData) -> Result<()> {
        if let Some(image) = data.get_opt_str("docker_image") {
            let body = docker_package_body(data.id(), image, data);
            session.v3.create::<Package, _>(&body).await?;
        }
        Ok(())
    }

    /// Process configuration, then scale.
    async fn write_process(session: &Session, data: &ResourceData, updating: bool) -> Result<()> {
        let declared = |fields: &[&str]| fields.iter().any(|f| data.get(f).is_some());
        let configure = if updating {
            data.has_any_change(PROCESS_FIELDS)
        } else {
            declared(PROCESS_FIELDS)
        };
        let scale = if updating {
            data.has_any_change(SCALE_FIELDS)
        } else {
            declared(SCALE_FIELDS)
        };
        if !configure && !scale {
            return Ok(());
        }

        let processes = session.v3.app_processes(data.id()).await?;
        let Some(process) = processes.into_iter().next() else {
            debug!(app = data.id(), "app has no process yet");
            return Ok(());
        };

        if configure {
            session
                .v3
                .update::<Process, _>(&process.guid, &process_body(data))
                .await?;
        }
        if scale {
            session
                .v3
                .scale_process(
                    &process.guid,
                    Some(data.get_int("instances").unwrap_or(1)),
                    data.get_int("memory"),
                    data.get_int("disk_quota"),
                )
                .await?;
        }
        Ok(())
    }

    /// Starts or stops the app to match `stopped`. An app without a current
    /// droplet has nothing to run and stays stopped.
    async fn converge_run_state(session: &Session, data: &ResourceData, current: &str) -> Result<()> {
        let id = data.id();
        if data.get_bool("stopped").unwrap_or(false) {
            if current == "STARTED" {
                session.v3.app_action(id, "stop").await?;
            }
        } else if current != "STARTED" {
            if session.v3.current_droplet(id).await?.is_some() {
                session.v3.app_action(id, "start").await?;
            } else {
                debug!(app = id, "no current droplet, not starting");
            }
        }
        Ok(())
    }

    async fn write_environment(session: &Session, data: &ResourceData) -> Result<()> {
        let patch = diff_maps(&data.prior_map("environment"), &data.get_map("environment"));
        if !patch.is_empty() {
            session
                .v3
                .patch_environment_variables(data.id(), &patch)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for AppResource {
    fn kind(&self) -> &'static str {
        "cloudfoundry_app"
    }

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        validate(data)?;
        let name = required(data, "name")?.to_string();
        let body = json!({
            "name": name,
            "relationships": { "space": to_one(required(data, "space")?) },
            "lifecycle": lifecycle(data),
        });
        let app = session
            .v3
            .create::<App, _>(&body)
            .await?
            .ok_or_else(|| Error::not_found("app", &name))?;
        data.set_id(app.guid);
        Self::write_docker_package(session, data).await?;

        Self::write_process(session, data, false).await?;
        if let Some(enabled) = data.get_bool("enable_ssh") {
            session.v3.set_app_feature(data.id(), "ssh", enabled).await?;
        }
        Self::write_environment(session, data).await?;
        Self::converge_run_state(session, data, &app.state).await?;
        metadata_create(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let by_name = match (data.get_opt_str("name"), data.get_opt_str("space")) {
            (Some(name), Some(space)) if !data.is_import() => {
                Some((name.to_string(), space.to_string()))
            }
            _ => None,
        };
        let app = match by_name {
            Some((name, space)) => session
                .v3
                .list::<App>(&Query::new().names(&name).space_guids(&space))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::not_found("app", &name))?,
            None => match session.v3.get::<App>(data.id()).await? {
                Some(app) => app,
                None => {
                    data.clear_id();
                    return Ok(());
                }
            },
        };
        project_app(session, app, data).await
    }

    async fn update(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        validate(data)?;
        if data.has_change("space") {
            return Err(Error::update_not_supported("cloudfoundry_app space"));
        }

        let id = data.id().to_string();
        let current = if data.has_any_change(&["name", "stack", "buildpack"]) {
            let body = json!({
                "name": required(data, "name")?,
                "lifecycle": lifecycle(data),
            });
            session.v3.update::<App, _>(&id, &body).await?
        } else {
            session.v3.get::<App>(&id).await?
        };
        let state = current.map(|a| a.state).unwrap_or_default();
        if data.has_any_change(&["docker_image", "docker_credentials"]) {
            Self::write_docker_package(session, data).await?;
        }

        Self::write_process(session, data, true).await?;
        if data.has_change("enable_ssh")
            && let Some(enabled) = data.get_bool("enable_ssh")
        {
            session.v3.set_app_feature(&id, "ssh", enabled).await?;
        }
        if data.has_change("environment") {
            Self::write_environment(session, data).await?;
        }
        Self::converge_run_state(session, data, &state).await?;
        metadata_update(session, METADATA, data).await?;
        self.read(session, data).await
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        session.v3.delete::<App>(data.id()).await?;
        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{AttrValue, Attributes};

    fn data(pairs: &[(&str, AttrValue)]) -> ResourceData {
        let attrs: Attributes = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ResourceData::from_attributes(attrs)
    }

    #[test]
    fn test_process_body_only_sends_endpoint_for_http() {
        let d = data(&[
            ("health_check_type", "port".into()),
            ("health_check_http_endpoint", "/health".into()),
            ("health_check_timeout", AttrValue::Int(30)),
        ]);
        assert_eq!(
            process_body(&d),
            json!({"command": null, "health_check": {"type": "port", "data": {"timeout": 30}}})
        );

        let d = data(&[
            ("health_check_type", "http".into()),
            ("health_check_http_endpoint", "/health".into()),
            ("command", "./run".into()),
        ]);
        assert_eq!(
            process_body(&d),
            json!({"command": "./run", "health_check": {"type": "http", "data": {"endpoint": "/health"}}})
        );
    }

    #[test]
    fn test_lifecycle() {
        let d = data(&[("buildpack", "go_buildpack".into()), ("stack", "cflinuxfs4".into())]);
        assert_eq!(
            lifecycle(&d),
            json!({"type": "buildpack", "data": {"buildpacks": ["go_buildpack"], "stack": "cflinuxfs4"}})
        );
        assert_eq!(
            lifecycle(&data(&[])),
            json!({"type": "buildpack", "data": {"buildpacks": []}})
        );
    }

    #[test]
    fn test_docker_lifecycle_and_package() {
        let credentials: std::collections::BTreeMap<String, String> = [
            ("username".to_string(), "bot".to_string()),
            ("password".to_string(), "s3cret".to_string()),
        ]
        .into();
        let d = data(&[
            ("docker_image", "registry.example.com/web:1.2".into()),
            ("docker_credentials", credentials.into()),
        ]);
        validate(&d).unwrap();
        assert_eq!(lifecycle(&d), json!({"type": "docker", "data": {}}));
        assert_eq!(
            docker_package_body("a1", "registry.example.com/web:1.2", &d),
            json!({
                "type": "docker",
                "data": {"image": "registry.example.com/web:1.2", "username": "bot", "password": "s3cret"},
                "relationships": {"app": {"data": {"guid": "a1"}}}
            })
        );
    }

    #[test]
    fn test_docker_exclusions() {
        let d = data(&[
            ("docker_image", "nginx".into()),
            ("buildpack", "go_buildpack".into()),
        ]);
        assert!(matches!(
            validate(&d),
            Err(Error::InvalidAttribute { ref attribute, .. }) if attribute == "docker_image"
        ));

        let only_user: std::collections::BTreeMap<String, String> =
            [("username".to_string(), "bot".to_string())].into();
        let d = data(&[("docker_credentials", only_user.clone().into())]);
        assert!(matches!(
            validate(&d),
            Err(Error::InvalidAttribute { ref message, .. }) if message == "requires 'docker_image'"
        ));

        let d = data(&[
            ("docker_image", "nginx".into()),
            ("docker_credentials", only_user.into()),
        ]);
        assert!(validate(&d).is_err());
    }

    #[test]
    fn test_rejects_unknown_health_check() {
        let d = data(&[("health_check_type", "tcp".into())]);
        assert!(matches!(
            validate(&d),
            Err(Error::InvalidAttribute { ref attribute, .. }) if attribute == "health_check_type"
        ));
    }
}
