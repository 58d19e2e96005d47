use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use uuid::Uuid;

use intake_core::models::client::Client;
use intake_core::models::device::TrustedDevice;
use intake_core::models::draft::AssessmentDraft;
use intake_core::store_keys;

use crate::error::StorageError;
use crate::objects::Precondition;
use crate::state;
use crate::store::Store;

/// [`Store`] backed by JSON objects in an S3 bucket, laid out per
/// [`store_keys`].
#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Connect to `bucket` with credentials from the default AWS config
    /// chain. `region` overrides the region the chain resolves.
    pub async fn connect(bucket: impl Into<String>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::new(S3Client::new(&config), bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl Store for S3Store {
    async fn find_active_client(&self, slug: &str) -> Result<Option<Client>, StorageError> {
        let key = store_keys::client(slug);
        let found = state::load_state::<Client>(&self.client, &self.bucket, &key).await?;
        Ok(found
            .map(|record| record.value)
            .filter(|client| client.is_active))
    }

    async fn touch_client_activity(
        &self,
        slug: &str,
        at: jiff::Timestamp,
    ) -> Result<(), StorageError> {
        let key = store_keys::client(slug);
        state::update_state(&self.client, &self.bucket, &key, |client: &mut Client| {
            client.last_activity = Some(at);
        })
        .await?;
        Ok(())
    }

    async fn find_trusted_device(
        &self,
        client_id: Uuid,
        device_token: &str,
    ) -> Result<Option<TrustedDevice>, StorageError> {
        let key = store_keys::trusted_device(client_id, device_token);
        let found = state::load_state::<TrustedDevice>(&self.client, &self.bucket, &key).await?;
        Ok(found
            .map(|record| record.value)
            .filter(|device| device.client_id == client_id && device.device_token == device_token))
    }

    async fn insert_trusted_device(&self, device: &TrustedDevice) -> Result<(), StorageError> {
        let key = store_keys::trusted_device(device.client_id, &device.device_token);
        state::save_state(&self.client, &self.bucket, &key, device, Precondition::IfAbsent).await?;
        tracing::debug!(client_id = %device.client_id, "trusted device stored");
        Ok(())
    }

    async fn touch_trusted_device(
        &self,
        client_id: Uuid,
        device_token: &str,
        at: jiff::Timestamp,
    ) -> Result<(), StorageError> {
        let key = store_keys::trusted_device(client_id, device_token);
        state::update_state(&self.client, &self.bucket, &key, |device: &mut TrustedDevice| {
            device.last_used = at;
        })
        .await?;
        Ok(())
    }

    async fn load_draft(&self, slug: &str) -> Result<Option<AssessmentDraft>, StorageError> {
        let key = store_keys::draft(slug);
        let found = state::load_state::<AssessmentDraft>(&self.client, &self.bucket, &key).await?;
        Ok(found.map(|record| record.value))
    }

    async fn upsert_draft(&self, draft: &AssessmentDraft) -> Result<(), StorageError> {
        let key = store_keys::draft(&draft.client_slug);
        state::save_state(&self.client, &self.bucket, &key, draft, Precondition::None).await?;
        Ok(())
    }
}
