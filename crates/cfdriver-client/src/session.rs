//! The process-wide Cloud Controller handle.

use std::sync::Arc;

use cfdriver_core::{MetadataKind, metadata_available};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::ClientError;
use crate::raw::RawClient;
use crate::v2::V2Client;
use crate::v3::V3Client;

/// Bundles the v2, v3 and raw clients with the negotiated API version.
///
/// Built once at startup and shared read-only afterwards. Cancelling the
/// session aborts pending reads and refuses new writes.
#[derive(Debug, Clone)]
pub struct Session {
    pub v2: V2Client,
    pub v3: V3Client,
    pub raw: Arc<RawClient>,
    api_version: String,
    cancel: CancellationToken,
}

impl Session {
    /// Builds a session for an already known API version.
    pub fn new(config: &SessionConfig, api_version: impl Into<String>) -> Result<Self, ClientError> {
        let cancel = CancellationToken::new();
        let raw = Arc::new(RawClient::new(config, cancel.clone())?);
        Ok(Self {
            v2: V2Client::new(raw.clone()),
            v3: V3Client::new(raw.clone()),
            raw,
            api_version: api_version.into(),
            cancel,
        })
    }

    /// Builds a session and asks the API root for the v3 version.
    pub async fn connect(config: &SessionConfig) -> Result<Self, ClientError> {
        let mut session = Self::new(config, "")?;
        let root: Value = session.raw.get("/", &[]).await?.success()?.json()?;
        session.api_version = root
            .pointer("/links/cloud_controller_v3/meta/version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if session.api_version.is_empty() {
            warn!(api = %config.api_url, "API root does not advertise a v3 version");
        } else {
            info!(api = %config.api_url, version = %session.api_version, "connected to cloud controller");
        }
        Ok(session)
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Whether metadata on `kind` is supported by the connected controller.
    pub fn metadata_available(&self, kind: MetadataKind) -> bool {
        metadata_available(&self.api_version, kind)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
