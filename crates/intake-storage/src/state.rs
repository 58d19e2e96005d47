//! Typed JSON records on top of [`crate::objects`].

use aws_sdk_s3::Client;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;
use crate::objects::{self, Precondition};

/// A decoded record and the ETag of the version it came from.
pub struct Versioned<T> {
    pub value: T,
    pub etag: String,
}

pub async fn load_state<T: DeserializeOwned>(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<Option<Versioned<T>>, StorageError> {
    let Some(object) = objects::get_object(client, bucket, key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_slice(&object.body)?;
    Ok(Some(Versioned {
        value,
        etag: object.etag,
    }))
}

pub async fn save_state<T: Serialize>(
    client: &Client,
    bucket: &str,
    key: &str,
    value: &T,
    precondition: Precondition<'_>,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec(value)?;
    objects::put_object(client, bucket, key, body, precondition).await
}

/// Read-modify-write a record under ETag optimistic locking.
///
/// A concurrent writer between the read and the write surfaces as
/// [`StorageError::PreconditionFailed`]; a missing record as
/// [`StorageError::NotFound`].
pub async fn update_state<T, F>(
    client: &Client,
    bucket: &str,
    key: &str,
    apply: F,
) -> Result<String, StorageError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut T),
{
    let Versioned { mut value, etag } = load_state::<T>(client, bucket, key)
        .await?
        .ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;

    apply(&mut value);
    save_state(client, bucket, key, &value, Precondition::IfMatch(&etag)).await
}
