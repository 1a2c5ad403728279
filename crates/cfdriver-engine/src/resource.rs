//! Resource and data-source seams.

use std::sync::Arc;

use async_trait::async_trait;
use cfdriver_client::Session;

use crate::error::{Error, Result};
use crate::state::ResourceData;

/// Lifecycle of one managed resource kind.
///
/// Implementations write the server id with [`ResourceData::set_id`] on
/// create and clear it on read when the resource has vanished.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Kind name as used by the host, e.g. `cloudfoundry_app`.
    fn kind(&self) -> &'static str;

    async fn create(&self, session: &Session, data: &mut ResourceData) -> Result<()>;

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()>;

    /// Kinds whose attributes all force replacement keep this default.
    async fn update(&self, _session: &Session, _data: &mut ResourceData) -> Result<()> {
        Err(Error::update_not_supported(self.kind()))
    }

    async fn delete(&self, session: &Session, data: &mut ResourceData) -> Result<()>;

    async fn import(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        self.read(session, data).await
    }
}

/// Read-only lookup of an existing entity.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()>;
}

pub type DynResource = Arc<dyn Resource>;
pub type DynDataSource = Arc<dyn DataSource>;
