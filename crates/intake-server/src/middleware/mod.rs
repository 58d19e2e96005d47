pub mod audit;
pub mod device;
