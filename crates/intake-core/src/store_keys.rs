//! Store key/path conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the canonical
//! layout of objects in the intake bucket. Uniqueness constraints of the data
//! model fall out of the layout: one client object per slug, one draft object
//! per slug, one device object per (client, token).

use uuid::Uuid;

use crate::error::CoreError;

pub fn client(slug: &str) -> String {
    format!("clients/{slug}.json")
}

pub fn trusted_device(client_id: Uuid, device_token: &str) -> String {
    format!("trusted-devices/{client_id}/{device_token}.json")
}

pub fn draft(slug: &str) -> String {
    format!("drafts/{slug}.json")
}

/// Check that a slug is safe to embed in an object key and a cookie name.
///
/// Slugs are URL path segments provisioned out of band; anything outside
/// `[A-Za-z0-9-_]` is rejected before it reaches the store.
pub fn validate_slug(slug: &str) -> Result<&str, CoreError> {
    let valid = !slug.is_empty()
        && slug.len() <= 128
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if valid {
        Ok(slug)
    } else {
        Err(CoreError::InvalidSlug(slug.to_string()))
    }
}
