//! intake-auth
//!
//! Device trust: who may open a client's assessment workspace. Holders of
//! the shared password get in through [`trust::DeviceTrust::login`]; browsers
//! that were remembered get back in through their device cookie.

pub mod cookie;
pub mod error;
pub mod secret;
pub mod token;
pub mod trust;
