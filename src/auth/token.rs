// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token and its durable holder.
//!
//! [`TokenStore`] is constructed once at startup and handed to every
//! component that needs it (HTTP client, session manager). Writes happen only
//! on session transitions and on auth-error eviction. Eviction goes through
//! [`TokenStore::clear_if`], which only removes the token a failing request
//! actually carried, so a late 401 never erases a token stored afterwards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use super::Role;
use crate::storage::{KeyValueStorage, MemoryStorage, StorageResult};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key holding the coarse role marker.
pub const ROLE_KEY: &str = "user_role";

/// Opaque bearer credential.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token(value.to_string())
    }
}

/// Holder of the current session token and role marker.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    // Serializes writers so compare-and-clear cannot interleave with `set`.
    writes: Arc<Mutex<()>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Token store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Current token, if any.
    ///
    /// Unreadable storage is logged and treated as "no token".
    pub fn get(&self) -> Option<Token> {
        match self.storage.get(TOKEN_KEY) {
            Ok(value) => value.filter(|v| !v.is_empty()).map(Token),
            Err(e) => {
                warn!(error = %e, "Token store: failed to read token");
                None
            }
        }
    }

    pub fn set(&self, token: &Token) -> StorageResult<()> {
        let _guard = self.write_lock();
        self.storage.set(TOKEN_KEY, token.as_str())
    }

    /// Remove the token and role marker. Never fails.
    pub fn clear(&self) {
        let _guard = self.write_lock();
        self.remove_all();
    }

    /// Remove the token and role marker only if `expected` is still the
    /// stored token.
    ///
    /// Returns `true` when nothing newer was stored, i.e. the store now holds
    /// no token. Repeating the call for the same token is harmless.
    pub fn clear_if(&self, expected: &Token) -> bool {
        let _guard = self.write_lock();
        match self.get() {
            Some(current) if &current == expected => {
                self.remove_all();
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    fn remove_all(&self) {
        for key in [TOKEN_KEY, ROLE_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Token store: failed to clear key");
            }
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self.storage.get(ROLE_KEY) {
            Ok(value) => value.as_deref().and_then(Role::parse),
            Err(e) => {
                warn!(error = %e, "Token store: failed to read role");
                None
            }
        }
    }

    pub fn set_role(&self, role: Role) -> StorageResult<()> {
        let _guard = self.write_lock();
        self.storage.set(ROLE_KEY, role.as_str())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.get().is_some())
            .finish()
    }
}
