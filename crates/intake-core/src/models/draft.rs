use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::process::ProcessRecord;

/// The auto-saved state of all process forms for one client.
///
/// At most one draft exists per `client_slug`; every save replaces
/// `process_data` wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssessmentDraft {
    pub client_slug: String,
    pub process_data: Vec<ProcessRecord>,
}
