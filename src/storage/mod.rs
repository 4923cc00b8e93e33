// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Durable Key-Value Storage
//!
//! The session token and role marker are the only client-side state that
//! must survive a restart. They live behind [`KeyValueStorage`] so the token
//! store can be backed by a file in production and by memory in tests.
//!
//! ## Backends
//!
//! - [`MemoryStorage`] - process-local map, lost on exit
//! - [`FileStorage`] - single JSON document, atomic write via rename

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::io;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored document is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A writer panicked while holding the storage lock
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable string key-value store.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
