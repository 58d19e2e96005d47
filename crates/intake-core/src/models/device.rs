use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A remembered browser, authorized for exactly one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedDevice {
    pub id: Uuid,
    pub client_id: Uuid,
    pub device_token: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub last_used: jiff::Timestamp,
}

impl TrustedDevice {
    pub fn new(client_id: Uuid, device_token: String, user_agent: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            device_token,
            user_agent,
            last_used: jiff::Timestamp::now(),
        }
    }
}
