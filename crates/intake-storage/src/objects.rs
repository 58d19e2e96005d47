//! Raw S3 object access. Callers work in terms of keys and bytes; the typed
//! JSON layer lives in [`crate::state`].

use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;

use crate::error::StorageError;

const JSON: &str = "application/json";

/// An object body together with the ETag it was read at.
pub struct StoredObject {
    pub body: Vec<u8>,
    pub etag: String,
}

/// Condition a write is made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition<'a> {
    /// Replace whatever is stored; an atomic upsert on the key.
    None,
    /// Only replace the version read at this ETag (`If-Match`).
    IfMatch(&'a str),
    /// Only create; fail when the key is taken (`If-None-Match: *`).
    IfAbsent,
}

/// Read an object. A missing key is `Ok(None)`, not an error.
pub async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<Option<StoredObject>, StorageError> {
    let resp = match client.get_object().bucket(bucket).key(key).send().await {
        Ok(resp) => resp,
        Err(e) => {
            let err = e.into_service_error();
            if err.is_no_such_key() {
                return Ok(None);
            }
            return Err(StorageError::Read {
                key: key.to_string(),
                message: err.to_string(),
            });
        }
    };

    let etag = resp.e_tag().unwrap_or_default().to_string();
    let body = resp
        .body
        .collect()
        .await
        .map_err(|e| StorageError::Read {
            key: key.to_string(),
            message: e.to_string(),
        })?
        .into_bytes()
        .to_vec();

    Ok(Some(StoredObject { body, etag }))
}

/// Write a JSON body under `key`. Returns the new ETag.
///
/// A write whose precondition does not hold fails with
/// [`StorageError::PreconditionFailed`].
pub async fn put_object(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    precondition: Precondition<'_>,
) -> Result<String, StorageError> {
    let req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(JSON)
        .body(ByteStream::from(body));

    let req = match precondition {
        Precondition::None => req,
        Precondition::IfMatch(etag) => req.if_match(etag),
        Precondition::IfAbsent => req.if_none_match("*"),
    };

    let resp = req.send().await.map_err(|e| {
        let message = e.into_service_error().to_string();
        if precondition != Precondition::None && is_conditional_failure(&message) {
            StorageError::PreconditionFailed {
                key: key.to_string(),
            }
        } else {
            StorageError::Write {
                key: key.to_string(),
                message,
            }
        }
    })?;

    Ok(resp.e_tag().unwrap_or_default().to_string())
}

// 412 PreconditionFailed, or 409 ConditionalRequestConflict when two
// conditional writes on the same key race.
fn is_conditional_failure(message: &str) -> bool {
    message.contains("PreconditionFailed") || message.contains("ConditionalRequestConflict")
}
