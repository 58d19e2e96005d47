use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use intake_core::error::CoreError;
use intake_core::models::draft::AssessmentDraft;
use intake_core::models::process::ProcessRecord;
use intake_storage::error::StorageError;
use intake_storage::store::Store;

use crate::status::SaveStatus;

#[derive(Debug, Clone, Copy)]
pub struct AutosaveConfig {
    /// How long edits must stop before the latest state is written.
    pub quiet_period: Duration,
    /// How long [`SaveStatus::Saved`] stays up after a successful write.
    pub saved_display: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_secs(1),
            saved_display: Duration::from_secs(2),
        }
    }
}

/// Handle to one client's autosaving workspace state.
///
/// Edits are applied to the in-memory state synchronously. Each edit
/// (re)arms a trailing-edge debounce; when it fires, the background task
/// writes the state as it is at that moment. The task performs writes one at
/// a time, so a newer state always commits after an older one.
///
/// Dropping the handle stops the task after it has written any pending edit;
/// [`Autosave::close`] does the same and waits for it.
pub struct Autosave {
    slug: String,
    state: watch::Sender<Vec<ProcessRecord>>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl Autosave {
    /// Restore the saved draft for `slug` and start autosaving.
    ///
    /// Without a saved draft the workspace starts from `initial`, and the
    /// first real edit is written. A restored draft is remembered as already
    /// saved, so it is not written back unchanged. A draft that cannot be read
    /// is an error: starting empty would overwrite it on the next edit.
    pub async fn load(
        store: Arc<dyn Store>,
        slug: impl Into<String>,
        initial: Vec<ProcessRecord>,
        config: AutosaveConfig,
    ) -> Result<Self, StorageError> {
        let slug = slug.into();

        let (processes, last_saved) = match store.load_draft(&slug).await {
            Ok(Some(draft)) => {
                tracing::debug!(slug = %slug, processes = draft.process_data.len(), "draft restored");
                let marker = serde_json::to_string(&draft.process_data).ok();
                (draft.process_data, marker)
            }
            Ok(None) => {
                tracing::debug!(slug = %slug, "no saved draft, starting fresh");
                (initial, None)
            }
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "failed to load draft");
                return Err(e);
            }
        };

        let (state_tx, state_rx) = watch::channel(processes);
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);

        let worker = Worker {
            slug: slug.clone(),
            store,
            state: state_rx,
            status: status_tx,
            last_saved,
            config,
        };
        let task = tokio::spawn(worker.run());

        Ok(Self {
            slug,
            state: state_tx,
            status: status_rx,
            task,
        })
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Replace the in-memory state and (re)schedule a save.
    pub fn edit(&self, processes: Vec<ProcessRecord>) {
        self.state.send_replace(processes);
    }

    /// Apply an edit to the in-memory state in place. When `f` fails the
    /// state must be left untouched; no save is scheduled.
    pub fn modify<T>(
        &self,
        f: impl FnOnce(&mut Vec<ProcessRecord>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        // Replaced by `f`'s result; the watch runs the closure exactly once.
        let mut outcome = Err(CoreError::NotApplied);
        self.state.send_if_modified(|processes| {
            outcome = f(processes);
            outcome.is_ok()
        });
        outcome
    }

    /// A copy of the current in-memory state.
    pub fn current(&self) -> Vec<ProcessRecord> {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Write any pending edit now and stop the background task.
    pub async fn close(self) {
        let Self {
            slug, state, task, ..
        } = self;
        drop(state);

        if let Err(e) = task.await {
            tracing::error!(slug = %slug, error = %e, "autosave task ended abnormally");
        }
    }
}

struct Worker {
    slug: String,
    store: Arc<dyn Store>,
    state: watch::Receiver<Vec<ProcessRecord>>,
    status: watch::Sender<SaveStatus>,
    /// Serialized form of the last state known to be in the store.
    last_saved: Option<String>,
    config: AutosaveConfig,
}

impl Worker {
    async fn run(mut self) {
        let mut save_at: Option<Instant> = None;
        let mut clear_status_at: Option<Instant> = None;

        loop {
            tokio::select! {
                // Edits first, so a timer that is due never beats the edit
                // that should have pushed it back.
                biased;

                changed = self.state.changed() => {
                    if changed.is_err() {
                        if save_at.is_some() {
                            let processes = self.state.borrow().clone();
                            self.persist(&processes).await;
                        }
                        break;
                    }
                    save_at = Some(Instant::now() + self.config.quiet_period);
                }
                _ = sleep_until(save_at) => {
                    save_at = None;
                    let processes = self.state.borrow_and_update().clone();
                    if self.persist(&processes).await {
                        clear_status_at = Some(Instant::now() + self.config.saved_display);
                    }
                }
                _ = sleep_until(clear_status_at) => {
                    clear_status_at = None;
                    self.status.send_replace(SaveStatus::Idle);
                }
            }
        }

        tracing::debug!(slug = %self.slug, "autosave stopped");
    }

    /// Write `processes` unless they match what was last written. Returns
    /// whether a write went through.
    async fn persist(&mut self, processes: &[ProcessRecord]) -> bool {
        let serialized = match serde_json::to_string(processes) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::error!(slug = %self.slug, error = %e, "failed to serialize draft");
                return false;
            }
        };

        if self.last_saved.as_deref() == Some(serialized.as_str()) {
            tracing::trace!(slug = %self.slug, "draft unchanged, skipping save");
            return false;
        }

        self.status.send_replace(SaveStatus::Saving);

        let draft = AssessmentDraft {
            client_slug: self.slug.clone(),
            process_data: processes.to_vec(),
        };

        match self.store.upsert_draft(&draft).await {
            Ok(()) => {
                self.last_saved = Some(serialized);
                self.status.send_replace(SaveStatus::Saved);
                tracing::debug!(slug = %self.slug, processes = processes.len(), "draft autosaved");
                true
            }
            Err(e) => {
                // Not retried: the next edit that changes the state schedules
                // the next attempt.
                tracing::error!(slug = %self.slug, error = %e, "autosave failed");
                self.status.send_replace(SaveStatus::Idle);
                false
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
