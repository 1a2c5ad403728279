//! Asynchronous job polling.
//!
//! Long-running v3 operations answer `202 Accepted` and point at a job with
//! the `Location` header. The job is polled until it completes, fails or
//! runs out of time.

use serde::Deserialize;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::ClientError;
use crate::raw::{RawClient, RawResponse};

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub guid: String,
    #[serde(default)]
    pub operation: String,
    pub state: JobState,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Processing,
    Polling,
    Complete,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Error entry as found in job documents and v3 error bodies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

impl Job {
    fn error_message(&self) -> String {
        if self.errors.is_empty() {
            return format!("{} failed without details", self.operation);
        }
        self.errors
            .iter()
            .map(|e| format!("{} ({})", e.detail, e.title))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl RawClient {
    /// Polls the job at `location` until it reaches a terminal state.
    pub async fn wait_for_job(&self, location: &str) -> Result<Job, ClientError> {
        let settings = self.job_settings();
        let deadline = Instant::now() + settings.timeout;

        loop {
            let job: Job = self.get(location, &[]).await?.success()?.json()?;
            match job.state {
                JobState::Complete => return Ok(job),
                JobState::Failed => {
                    let message = job.error_message();
                    return Err(ClientError::job_failed(job.guid, message));
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(ClientError::JobTimeout {
                    guid: job.guid,
                    timeout_secs: settings.timeout.as_secs(),
                });
            }

            debug!(job = %job.guid, state = ?job.state, "waiting for job");
            tokio::select! {
                _ = self.cancellation_token().cancelled() => return Err(ClientError::Cancelled),
                _ = sleep(settings.poll_interval) => {}
            }
        }
    }

    /// Waits for the job behind a `202 Accepted` answer, if there is one.
    pub async fn settle(&self, response: RawResponse) -> Result<RawResponse, ClientError> {
        if response.status == 202
            && let Some(location) = response.location.as_deref()
        {
            self.wait_for_job(location).await?;
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_decoding() {
        let job: Job = serde_json::from_str(
            r#"{"guid":"j1","operation":"app.delete","state":"FAILED",
                "errors":[{"code":10008,"title":"CF-UnprocessableEntity","detail":"boom"}]}"#,
        )
        .unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.error_message(), "boom (CF-UnprocessableEntity)");

        let job: Job = serde_json::from_str(r#"{"guid":"j2","state":"SOMETHING_NEW"}"#).unwrap();
        assert_eq!(job.state, JobState::Unknown);
    }
}
