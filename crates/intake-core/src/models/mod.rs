pub mod client;
pub mod device;
pub mod draft;
pub mod process;
