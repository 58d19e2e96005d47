use std::sync::Arc;
use std::time::Duration;

use intake_auth::trust::DeviceTrust;
use intake_core::models::client::Client;
use intake_storage::memory::MemoryStore;
use intake_storage::s3::S3Store;
use intake_storage::store::Store;

use crate::config::{ServerConfig, StoreBackend};
use crate::workspaces::Workspaces;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub trust: Arc<DeviceTrust>,
    pub workspaces: Arc<Workspaces>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Self {
        Self {
            trust: Arc::new(DeviceTrust::with_session_ttl(
                store.clone(),
                config.session_ttl,
            )),
            workspaces: Arc::new(Workspaces::new(store, config.autosave)),
            secure_cookies: config.secure_cookies,
        }
    }

    /// Periodically close idle workspaces and forget expired session
    /// credentials.
    pub fn spawn_housekeeping(&self, workspace_idle: Duration) -> tokio::task::JoinHandle<()> {
        let trust = Arc::clone(&self.trust);
        let workspaces = Arc::clone(&self.workspaces);
        let every = (workspace_idle / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = workspaces.evict_idle(workspace_idle).await;
                let sessions = trust.prune_sessions().await;
                tracing::debug!(evicted, sessions, "housekeeping");
            }
        })
    }
}

/// Connect the configured store backend.
pub async fn build_store(backend: &StoreBackend) -> eyre::Result<Arc<dyn Store>> {
    match backend {
        StoreBackend::S3 { bucket, region } => {
            let store = S3Store::connect(bucket.clone(), region.as_deref()).await;
            tracing::info!(bucket = store.bucket(), "using S3 store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory { seed_file } => {
            let clients: Vec<Client> = match seed_file {
                Some(path) => {
                    let contents = std::fs::read_to_string(path).map_err(|e| {
                        eyre::eyre!("failed to read seed file {}: {e}", path.display())
                    })?;
                    serde_json::from_str(&contents)?
                }
                None => Vec::new(),
            };
            tracing::warn!(clients = clients.len(), "using in-memory store, data is not persisted");
            Ok(Arc::new(MemoryStore::with_clients(clients)))
        }
    }
}
