//! intake-storage
//!
//! The persistent store. Thin wrapper around the AWS S3 SDK plus the
//! [`store::Store`] seam the auth and autosave crates are written against.

pub mod error;
pub mod memory;
pub mod objects;
pub mod s3;
pub mod state;
pub mod store;
