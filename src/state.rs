// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Application-wide services, constructed once and handed to consumers.
//!
//! `AppState` owns the single [`TokenStore`], the [`HttpClient`] reading it
//! and the [`SessionManager`] writing it. Feature hooks are created per
//! consumer from the shared client.

use std::sync::Arc;

use tracing::info;

use crate::auth::{SessionManager, TokenStore};
use crate::config::ClientConfig;
use crate::hooks::{AdminConsole, KycWorkflow};
use crate::http::{HttpClient, Transport, TransportError};
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClientConfig>,
    pub tokens: TokenStore,
    pub http: HttpClient,
    pub session: SessionManager,
}

impl AppState {
    /// Build every service over the reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let tokens = token_store(&config);
        let http = HttpClient::new(&config, tokens.clone())?;
        Ok(Self::assemble(config, tokens, http))
    }

    /// Build every service over a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let tokens = token_store(&config);
        let http = HttpClient::with_transport(&config, tokens.clone(), transport);
        Self::assemble(config, tokens, http)
    }

    fn assemble(config: ClientConfig, tokens: TokenStore, http: HttpClient) -> Self {
        info!(
            base_url = %config.base_url,
            timeout_ms = config.request_timeout.as_millis() as u64,
            max_attempts = config.retry.max_attempts(),
            durable_session = config.session_file.is_some(),
            "Rewards client configured"
        );
        let session = SessionManager::new(http.clone());
        Self {
            config: Arc::new(config),
            tokens,
            http,
            session,
        }
    }

    /// Admin console hook for one consumer.
    pub fn admin_console(&self) -> AdminConsole {
        AdminConsole::new(self.http.clone())
    }

    /// KYC workflow hook for one consumer.
    pub fn kyc_workflow(&self) -> KycWorkflow {
        KycWorkflow::new(self.http.clone())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("http", &self.http)
            .field("session", &self.session)
            .finish()
    }
}

fn token_store(config: &ClientConfig) -> TokenStore {
    let storage: Arc<dyn KeyValueStorage> = match &config.session_file {
        Some(path) => Arc::new(FileStorage::new(path)),
        None => Arc::new(MemoryStorage::new()),
    };
    TokenStore::new(storage)
}
