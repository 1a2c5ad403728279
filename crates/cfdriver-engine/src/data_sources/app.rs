//! `cloudfoundry_app` lookup by name or GUID.

use async_trait::async_trait;
use cfdriver_client::Session;

use crate::error::{Error, Result};
use crate::resource::DataSource;
use crate::resources::app::{find_app, project_app};
use crate::state::ResourceData;

pub struct AppData;

#[async_trait]
impl DataSource for AppData {
    fn kind(&self) -> &'static str {
        "cloudfoundry_app"
    }

    async fn read(&self, session: &Session, data: &mut ResourceData) -> Result<()> {
        let key = data
            .get_opt_str("name_or_app_guid")
            .or_else(|| data.get_opt_str("name"))
            .ok_or_else(|| Error::invalid_attribute("name_or_app_guid", "is required"))?
            .to_string();
        let space = data.get_opt_str("space").map(str::to_string);

        let app = find_app(session, &key, space.as_deref()).await?;
        project_app(session, app, data).await
    }
}
