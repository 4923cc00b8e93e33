// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Rewards API Contracts
//!
//! Typed wrappers over [`HttpClient`](crate::http::HttpClient), one per
//! endpoint. Each returns `Result<T, ApiError>`; the error is always the
//! classified value produced at the client boundary.
//!
//! | Group | Endpoints |
//! |-------|-----------|
//! | [`auth`] | `/auth/login`, `/auth/register`, `/auth/register-kyc`, `/auth/verify`, `/auth/forgot-password`, `/auth/reset-password`, `/users/profile` |
//! | [`admin`] | `/admin/stats`, `/admin/users[/{id}[/status]]`, `/admin/kyc[/{id}[/approve\|/reject]]` |
//! | [`kyc`] | `/kyc/status`, `/kyc/submit`, `/kyc/documents` |
//!
//! Path parameters are percent-encoded before they are spliced into a path.

pub mod admin;
pub mod auth;
pub mod kyc;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use kyc::KycApi;

use crate::error::ApiError;
use crate::http::{HttpClient, RequestOptions};
use crate::models::MessageResponse;

/// Send a request whose success body is an optional `{"message": ...}`.
///
/// An empty 2xx body yields an empty message.
pub(crate) async fn acknowledge(
    http: &HttpClient,
    options: RequestOptions,
) -> Result<MessageResponse, ApiError> {
    http.request::<Option<MessageResponse>>(options)
        .await
        .into_result()
        .map(Option::unwrap_or_default)
}
