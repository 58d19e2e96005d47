use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant that has been handed a personalized assessment link.
///
/// Provisioned out of band. `password_hash` holds the shared secret, either
/// in `scrypt$salt:key` form or as a legacy literal value.
#[derive(Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub slug: String,
    pub company_name: String,
    pub password_hash: String,
    pub is_active: bool,
    #[serde(default)]
    pub last_activity: Option<jiff::Timestamp>,
    pub created_at: jiff::Timestamp,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("slug", &self.slug)
            .field("company_name", &self.company_name)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("last_activity", &self.last_activity)
            .field("created_at", &self.created_at)
            .finish()
    }
}
