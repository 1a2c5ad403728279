use std::time::Duration;

use cfdriver_client::{JobSettings, SessionConfig};
use serde::{Deserialize, Serialize};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.api.url.is_empty() {
            return Err("api.url is required (set it in the config file, CFDRIVER__API__URL or --api-url)".into());
        }
        if !self.api.url.starts_with("http://") && !self.api.url.starts_with("https://") {
            return Err(format!("api.url must be an http(s) URL, got '{}'", self.api.url));
        }
        if self.api.request_timeout_secs == 0 {
            return Err("api.request_timeout_secs must be > 0".into());
        }
        if self.jobs.poll_interval_ms == 0 || self.jobs.timeout_secs == 0 {
            return Err("jobs.poll_interval_ms and jobs.timeout_secs must be > 0".into());
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join("|"),
                self.logging.level
            ));
        }
        Ok(())
    }

    /// Command-line values win over the file and environment.
    pub fn apply_overrides(&mut self, api_url: Option<&str>, token: Option<&str>) {
        if let Some(url) = api_url {
            self.api.url = url.to_string();
        }
        if let Some(token) = token {
            self.api.access_token = Some(token.to_string());
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            api_url: self.api.url.clone(),
            access_token: self.api.access_token.clone().filter(|t| !t.is_empty()),
            skip_ssl_validation: self.api.skip_ssl_validation,
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
            jobs: JobSettings {
                poll_interval: Duration::from_millis(self.jobs.poll_interval_ms),
                timeout: Duration::from_secs(self.jobs.timeout_secs),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub url: String,
    /// Pre-acquired bearer token.
    /// Prefer CFDRIVER__API__ACCESS_TOKEN over writing it to a file.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub skip_ssl_validation: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            access_token: None,
            skip_ssl_validation: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_job_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_job_timeout_secs() -> u64 {
    300
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_job_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    const DEFAULT_FILE: &str = "cfdriver.toml";

    /// Candidate config file when none is given: `./cfdriver.toml`, then
    /// `<user config dir>/cfdriver/config.toml`.
    fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(DEFAULT_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("cfdriver").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Loads the file (if any) overlaid by `CFDRIVER__*` variables.
    /// Validation is left to the caller so command-line overrides can apply first.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file '{p}' does not exist"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                if let Some(default_path) = default_path() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // e.g. CFDRIVER__API__URL=https://api.example.com
        builder = builder.add_source(
            Environment::with_prefix("CFDRIVER")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        cfg.try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api.request_timeout_secs, 60);
        assert_eq!(cfg.jobs.poll_interval_ms, 1000);
        assert_eq!(cfg.jobs.timeout_secs, 300);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.validate().is_err(), "url is required");
    }

    #[test]
    fn test_load_file_with_partial_sections() {
        let file = write_config(
            r#"
            [api]
            url = "https://api.sys.example.com"
            access_token = "abc"

            [jobs]
            timeout_secs = 30
            "#,
        );
        let cfg = loader::load_config(file.path().to_str()).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.api.url, "https://api.sys.example.com");
        assert_eq!(cfg.jobs.timeout_secs, 30);
        assert_eq!(cfg.jobs.poll_interval_ms, 1000);

        let session = cfg.session_config();
        assert_eq!(session.access_token.as_deref(), Some("abc"));
        assert_eq!(session.jobs.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = loader::load_config(missing.to_str()).unwrap_err();
        assert!(err.contains("does not exist"), "{err}");
    }

    #[test]
    fn test_overrides_win() {
        let file = write_config("[api]\nurl = \"https://from-file\"\n");
        let mut cfg = loader::load_config(file.path().to_str()).unwrap();
        cfg.apply_overrides(Some("https://from-flag"), Some("tok"));
        assert_eq!(cfg.api.url, "https://from-flag");
        assert_eq!(cfg.api.access_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_validation_messages() {
        let mut cfg = AppConfig::default();
        cfg.api.url = "ftp://nope".into();
        assert!(cfg.validate().unwrap_err().contains("http(s)"));

        cfg.api.url = "https://ok".into();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));

        cfg.logging.level = "DEBUG".into();
        cfg.jobs.poll_interval_ms = 0;
        assert!(cfg.validate().unwrap_err().contains("jobs."));
    }

    #[test]
    fn test_empty_token_is_unauthenticated() {
        let mut cfg = AppConfig::default();
        cfg.api.url = "https://ok".into();
        cfg.api.access_token = Some(String::new());
        assert!(cfg.session_config().access_token.is_none());
    }
}
