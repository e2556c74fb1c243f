use anyhow::{Context, Result};
use dcinv_api_client::ApiClient;
use dcinv_inventory::InventoryController;
use dcinv_runtime_config::ClientConfig;
use std::sync::Arc;
use tracing::debug;

use crate::config;
use crate::session_file::FileSessionStore;

/// Everything a command needs: resolved config plus a client bound to the
/// on-disk session.
pub struct AppContext {
    pub config: ClientConfig,
    pub client: Arc<ApiClient>,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config = config::load_config()?;
        let store = Arc::new(FileSessionStore::new(config::session_path()?));
        let client = ApiClient::new(config::client_options(&config), store)
            .context("Failed to build HTTP client")?;
        debug!("using server {}", config.server.url);
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    pub fn controller(&self, datacenter_id: i64) -> InventoryController {
        InventoryController::new(Arc::clone(&self.client), datacenter_id)
            .with_notice_duration(self.config.ui.notice_duration())
    }
}
