//! intake-autosave
//!
//! Debounced persistence of a client's in-progress assessment. Edits land in
//! memory immediately; a background task per slug writes the latest state to
//! the store once edits have been quiet for a while. Save failures are
//! logged and never reach the caller.

pub mod pipeline;
pub mod status;
