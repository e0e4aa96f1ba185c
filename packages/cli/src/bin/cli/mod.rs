pub mod auth;
pub mod cache;
pub mod inventory;
pub mod summary;
