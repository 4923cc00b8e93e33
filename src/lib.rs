// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rewards Client - Session, HTTP and Async-Resource Core
//!
//! This crate is the client-side core of the rewards platform: a persisted
//! session/token manager, a resilient JSON HTTP client with timeouts, retries
//! and a closed error taxonomy, and a generic async-resource pattern that the
//! admin console and KYC workflow build on.
//!
//! ## Modules
//!
//! - `config` - Environment-driven client configuration
//! - `telemetry` - Tracing subscriber setup
//! - `error` - `ApiError` taxonomy
//! - `storage` - Durable key-value storage (memory, JSON file)
//! - `auth` - Token store, roles and the session state machine
//! - `http` - Request pipeline, transport seam, classification, retry
//! - `models` - Account payloads
//! - `api` - Typed auth, admin and KYC endpoints
//! - `resource` - Generic `AsyncResource<T>`
//! - `hooks` - Admin console and KYC workflow
//! - `state` - Construction and injection of the shared services

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod hooks;
pub mod http;
pub mod models;
pub mod resource;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_utils;

pub use auth::{Session, SessionManager, SessionPhase, Token, TokenStore};
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind};
pub use http::{ApiResponse, HttpClient, RequestOptions};
pub use resource::{AsyncResource, ResourceState};
pub use state::AppState;
