use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;

use intake_autosave::pipeline::{Autosave, AutosaveConfig};
use intake_core::models::process::initial_processes;
use intake_storage::error::StorageError;
use intake_storage::store::Store;

struct Slot {
    workspace: Arc<OnceCell<Arc<Autosave>>>,
    last_used: Instant,
}

/// Open workspaces, one autosave pipeline per client slug.
///
/// A workspace is opened (its draft restored) on first access, so every
/// request for a slug edits the same in-memory state and there is only ever
/// one writer per draft. Drafts load outside the registry lock: a slow store
/// read for one slug never holds up another. A load that fails leaves
/// nothing behind and the next request tries again.
pub struct Workspaces {
    store: Arc<dyn Store>,
    config: AutosaveConfig,
    open: Mutex<HashMap<String, Slot>>,
}

impl Workspaces {
    pub fn new(store: Arc<dyn Store>, config: AutosaveConfig) -> Self {
        Self {
            store,
            config,
            open: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open(&self, slug: &str) -> Result<Arc<Autosave>, StorageError> {
        let cell = {
            let mut open = self.open.lock().await;
            let slot = open.entry(slug.to_string()).or_insert_with(|| Slot {
                workspace: Arc::new(OnceCell::new()),
                last_used: Instant::now(),
            });
            slot.last_used = Instant::now();
            slot.workspace.clone()
        };

        // Concurrent opens of the same slug wait for one load.
        let workspace = cell
            .get_or_try_init(|| async {
                Autosave::load(self.store.clone(), slug, initial_processes(), self.config)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(workspace.clone())
    }

    pub async fn open_count(&self) -> usize {
        self.open.lock().await.len()
    }

    /// Close workspaces nobody has opened for `idle_for`.
    ///
    /// A workspace still held by a request, or still loading, is left alone.
    /// Closing writes any pending edit, so the next open restores it from
    /// the store.
    pub async fn evict_idle(&self, idle_for: Duration) -> usize {
        let evicted: Vec<(String, Slot)> = {
            let mut open = self.open.lock().await;
            let idle: Vec<String> = open
                .iter()
                .filter(|(_, slot)| slot.last_used.elapsed() >= idle_for && is_unused(slot))
                .map(|(slug, _)| slug.clone())
                .collect();
            idle.into_iter()
                .filter_map(|slug| open.remove_entry(&slug))
                .collect()
        };

        let count = evicted.len();
        for (slug, slot) in evicted {
            tracing::debug!(slug = %slug, "closing idle workspace");
            close_slot(&slug, slot).await;
        }
        count
    }

    /// Write pending edits of every open workspace and stop their pipelines.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.open.lock().await.drain().collect();
        tracing::info!(workspaces = drained.len(), "closing workspaces");

        for (slug, slot) in drained {
            close_slot(&slug, slot).await;
        }
    }
}

// Only the registry holds the slot, and nothing outside it holds the
// workspace. Checked under the registry lock, which every new holder has to
// take first.
fn is_unused(slot: &Slot) -> bool {
    Arc::strong_count(&slot.workspace) == 1
        && slot
            .workspace
            .get()
            .is_none_or(|workspace| Arc::strong_count(workspace) == 1)
}

async fn close_slot(slug: &str, slot: Slot) {
    let Ok(cell) = Arc::try_unwrap(slot.workspace) else {
        tracing::warn!(slug = %slug, "workspace still loading at close");
        return;
    };
    let Some(workspace) = cell.into_inner() else {
        return;
    };
    match Arc::try_unwrap(workspace) {
        Ok(workspace) => workspace.close().await,
        // Still held by an in-flight request; its pending edit is
        // written when that request drops the last handle.
        Err(_) => tracing::warn!(slug = %slug, "workspace still in use at close"),
    }
}
