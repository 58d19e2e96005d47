pub mod access;
pub mod drafts;
pub mod health;
