// ABOUTME: Data layer and persistence for cloudlens
// ABOUTME: A string key/value store trait with SQLite and in-memory implementations

pub mod kv;
pub mod memory;
pub mod sqlite;

use thiserror::Error;

pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
