//! In-memory [`Store`].
//!
//! Backs the test suites and the server's local development mode. Data is
//! lost when the last clone is dropped. Reads and writes can be made to fail
//! or to take a while, to exercise the callers' failure and ordering paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use intake_core::models::client::Client;
use intake_core::models::device::TrustedDevice;
use intake_core::models::draft::AssessmentDraft;
use intake_core::store_keys;

use crate::error::StorageError;
use crate::store::Store;

#[derive(Default)]
struct Tables {
    clients: HashMap<String, Client>,
    /// Keyed by device token, which is unique across all clients.
    devices: HashMap<String, TrustedDevice>,
    drafts: HashMap<String, AssessmentDraft>,
    /// Every successful draft upsert, in commit order.
    draft_log: Vec<AssessmentDraft>,
    draft_loads: usize,
    /// Per-slug delay before a draft load answers.
    draft_load_delay: HashMap<String, Duration>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    write_delay_ms: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with clients.
    pub fn with_clients(clients: impl IntoIterator<Item = Client>) -> Self {
        let tables = Tables {
            clients: clients
                .into_iter()
                .map(|client| (client.slug.clone(), client))
                .collect(),
            ..Tables::default()
        };
        Self {
            tables: Arc::new(RwLock::new(tables)),
            ..Self::default()
        }
    }

    pub async fn insert_client(&self, client: Client) {
        self.tables
            .write()
            .await
            .clients
            .insert(client.slug.clone(), client);
    }

    /// The stored client regardless of `is_active`.
    pub async fn client(&self, slug: &str) -> Option<Client> {
        self.tables.read().await.clients.get(slug).cloned()
    }

    pub async fn devices(&self) -> Vec<TrustedDevice> {
        self.tables.read().await.devices.values().cloned().collect()
    }

    pub async fn draft(&self, slug: &str) -> Option<AssessmentDraft> {
        self.tables.read().await.drafts.get(slug).cloned()
    }

    /// Every draft upsert that reached the store, oldest first.
    pub async fn draft_history(&self) -> Vec<AssessmentDraft> {
        self.tables.read().await.draft_log.clone()
    }

    pub async fn draft_writes(&self) -> usize {
        self.tables.read().await.draft_log.len()
    }

    /// Make every read fail as if the store were unreachable.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail as if the store were unreachable.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of draft loads attempted, failed ones included.
    pub async fn draft_loads(&self) -> usize {
        self.tables.read().await.draft_loads
    }

    /// Delay draft loads for `slug` by `delay` before they answer.
    pub async fn set_draft_load_delay(&self, slug: &str, delay: Duration) {
        self.tables
            .write()
            .await
            .draft_load_delay
            .insert(slug.to_string(), delay);
    }

    /// Delay every write by `delay` before it commits.
    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn check_read(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Read {
                key: key.to_string(),
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn check_write(&self, key: &str) -> Result<(), StorageError> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                key: key.to_string(),
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_active_client(&self, slug: &str) -> Result<Option<Client>, StorageError> {
        self.check_read(&store_keys::client(slug))?;
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .get(slug)
            .filter(|client| client.is_active)
            .cloned())
    }

    async fn touch_client_activity(
        &self,
        slug: &str,
        at: jiff::Timestamp,
    ) -> Result<(), StorageError> {
        let key = store_keys::client(slug);
        self.check_write(&key).await?;
        let mut tables = self.tables.write().await;
        let client = tables
            .clients
            .get_mut(slug)
            .ok_or(StorageError::NotFound { key })?;
        client.last_activity = Some(at);
        Ok(())
    }

    async fn find_trusted_device(
        &self,
        client_id: Uuid,
        device_token: &str,
    ) -> Result<Option<TrustedDevice>, StorageError> {
        self.check_read(&store_keys::trusted_device(client_id, device_token))?;
        let tables = self.tables.read().await;
        Ok(tables
            .devices
            .get(device_token)
            .filter(|device| device.client_id == client_id)
            .cloned())
    }

    async fn insert_trusted_device(&self, device: &TrustedDevice) -> Result<(), StorageError> {
        let key = store_keys::trusted_device(device.client_id, &device.device_token);
        self.check_write(&key).await?;
        let mut tables = self.tables.write().await;
        if tables.devices.contains_key(&device.device_token) {
            return Err(StorageError::PreconditionFailed { key });
        }
        tables
            .devices
            .insert(device.device_token.clone(), device.clone());
        Ok(())
    }

    async fn touch_trusted_device(
        &self,
        client_id: Uuid,
        device_token: &str,
        at: jiff::Timestamp,
    ) -> Result<(), StorageError> {
        let key = store_keys::trusted_device(client_id, device_token);
        self.check_write(&key).await?;
        let mut tables = self.tables.write().await;
        let device = tables
            .devices
            .get_mut(device_token)
            .filter(|device| device.client_id == client_id)
            .ok_or(StorageError::NotFound { key })?;
        device.last_used = at;
        Ok(())
    }

    async fn load_draft(&self, slug: &str) -> Result<Option<AssessmentDraft>, StorageError> {
        let delay = {
            let mut tables = self.tables.write().await;
            tables.draft_loads += 1;
            tables.draft_load_delay.get(slug).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_read(&store_keys::draft(slug))?;
        Ok(self.tables.read().await.drafts.get(slug).cloned())
    }

    async fn upsert_draft(&self, draft: &AssessmentDraft) -> Result<(), StorageError> {
        self.check_write(&store_keys::draft(&draft.client_slug))
            .await?;
        let mut tables = self.tables.write().await;
        tables
            .drafts
            .insert(draft.client_slug.clone(), draft.clone());
        tables.draft_log.push(draft.clone());
        Ok(())
    }
}
