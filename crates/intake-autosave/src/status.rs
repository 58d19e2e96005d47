use serde::{Deserialize, Serialize};

/// What the form should show next to the autosave indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    /// Shown for a short while after a successful save.
    Saved,
}
