// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Client-side session handling for the rewards API.
//!
//! ## Auth Flow
//!
//! 1. `SessionManager::login` posts credentials to `/auth/login`
//! 2. The returned bearer token is written to the [`TokenStore`]
//! 3. `HttpClient` attaches `Authorization: Bearer <token>` to later calls
//! 4. On restart, `SessionManager::bootstrap` checks the stored token
//!    against `/auth/verify`
//!
//! ## Invalidation
//!
//! - Any 401/403 on a request carrying the stored token evicts it
//! - The next bootstrap then resolves to `Unauthenticated`
//! - Logout clears the token and role marker unconditionally

pub mod roles;
pub mod session;
pub mod token;

pub use roles::Role;
pub use session::{Session, SessionManager, SessionPhase};
pub use token::{Token, TokenStore, ROLE_KEY, TOKEN_KEY};
