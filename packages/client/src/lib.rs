// ABOUTME: Backend access for cloudlens
// ABOUTME: Bearer-authenticated requests, the resource catalog and cache-backed inventory

pub mod catalog;
pub mod client;
pub mod error;
pub mod inventory;

pub use catalog::ResourceKind;
pub use client::{AuthenticatedClient, RequestOptions};
pub use error::{ClientError, ClientResult};
pub use inventory::Inventory;
