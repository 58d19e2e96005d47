//! The store seam.
//!
//! Everything the device trust manager and the autosave pipeline need from
//! persistence, expressed as record-level operations. "Not found" is
//! `Ok(None)`; `Err` always means the store could not be reached or answered
//! with something unusable.

use async_trait::async_trait;
use uuid::Uuid;

use intake_core::models::client::Client;
use intake_core::models::device::TrustedDevice;
use intake_core::models::draft::AssessmentDraft;

use crate::error::StorageError;

#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a client by slug, returning it only while `is_active` is set.
    async fn find_active_client(&self, slug: &str) -> Result<Option<Client>, StorageError>;

    /// Set a client's `last_activity`.
    async fn touch_client_activity(
        &self,
        slug: &str,
        at: jiff::Timestamp,
    ) -> Result<(), StorageError>;

    /// Look up a device by token, scoped to the client it was issued for.
    async fn find_trusted_device(
        &self,
        client_id: Uuid,
        device_token: &str,
    ) -> Result<Option<TrustedDevice>, StorageError>;

    /// Persist a newly issued device. Fails with
    /// [`StorageError::PreconditionFailed`] if the token is already taken.
    async fn insert_trusted_device(&self, device: &TrustedDevice) -> Result<(), StorageError>;

    /// Set a device's `last_used`.
    async fn touch_trusted_device(
        &self,
        client_id: Uuid,
        device_token: &str,
        at: jiff::Timestamp,
    ) -> Result<(), StorageError>;

    async fn load_draft(&self, slug: &str) -> Result<Option<AssessmentDraft>, StorageError>;

    /// Insert the draft, or replace `process_data` wholesale if one exists
    /// for the slug.
    async fn upsert_draft(&self, draft: &AssessmentDraft) -> Result<(), StorageError>;
}
