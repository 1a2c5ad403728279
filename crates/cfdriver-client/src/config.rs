//! Connection settings for a [`Session`](crate::Session).

use std::time::Duration;

/// Polling behaviour for asynchronous Cloud Controller jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cloud Controller endpoint, e.g. `https://api.sys.example.com`.
    pub api_url: String,
    /// Pre-acquired bearer token. Requests are sent unauthenticated when unset.
    pub access_token: Option<String>,
    pub skip_ssl_validation: bool,
    pub request_timeout: Duration,
    pub jobs: JobSettings,
}

impl SessionConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            access_token: None,
            skip_ssl_validation: false,
            request_timeout: Duration::from_secs(60),
            jobs: JobSettings::default(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: JobSettings) -> Self {
        self.jobs = jobs;
        self
    }
}
