// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Feature Hooks
//!
//! Per-feature bundles of [`AsyncResource`](crate::resource::AsyncResource)s
//! with their trigger operations.
//!
//! | Hook | Resources |
//! |------|-----------|
//! | [`AdminConsole`] | `stats`, `users`, `selected_user`, `kyc_queue`, `selected_submission` |
//! | [`KycWorkflow`] | `status`, `documents` |
//!
//! A mutation runs inside the resource that lists the mutated entity and
//! re-fetches that list before settling. Its failure comes back as a
//! [`MutationError`]: `Rejected` when the server did not apply the change,
//! `RefreshFailed` when the change was applied and only the reload failed.
//! Other loaded resources that show the entity are refreshed afterwards on a
//! best-effort basis.
//!
//! Dropping a hook does not dispose it; call `dispose()` when the consumer
//! goes away.

pub mod admin;
pub mod kyc;

pub use admin::AdminConsole;
pub use kyc::KycWorkflow;

use std::future::Future;

use tracing::warn;

use crate::error::{ApiError, ErrorKind};
use crate::resource::AsyncResource;

/// Failure of a mutation trigger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The server refused or never received the change.
    #[error(transparent)]
    Rejected(ApiError),
    /// The change is committed; re-fetching the list failed. Repeating the
    /// mutation is not safe.
    #[error(transparent)]
    RefreshFailed(ApiError),
}

impl MutationError {
    /// Whether the server applied the change.
    pub fn applied(&self) -> bool {
        matches!(self, MutationError::RefreshFailed(_))
    }

    pub fn api_error(&self) -> &ApiError {
        match self {
            MutationError::Rejected(e) | MutationError::RefreshFailed(e) => e,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.api_error().kind()
    }

    pub fn into_api_error(self) -> ApiError {
        match self {
            MutationError::Rejected(e) | MutationError::RefreshFailed(e) => e,
        }
    }
}

impl From<MutationError> for ApiError {
    fn from(error: MutationError) -> Self {
        error.into_api_error()
    }
}

/// Run `mutation` then `reload` as one trigger of `resource`.
async fn mutate_then_reload<T, U, M, R>(
    resource: &AsyncResource<T>,
    mutation: M,
    reload: R,
) -> Result<T, MutationError>
where
    T: Clone + Send + Sync + 'static,
    M: Future<Output = Result<U, ApiError>>,
    R: Future<Output = Result<T, ApiError>>,
{
    let mut applied = false;
    let result = resource
        .run(async {
            mutation.await?;
            applied = true;
            reload.await
        })
        .await;

    match result {
        Ok(data) => Ok(data),
        Err(e) if applied => {
            warn!(
                resource = resource.name(),
                kind = ?e.kind(),
                error = %e,
                "Mutation applied but reload failed"
            );
            Err(MutationError::RefreshFailed(e))
        }
        Err(e) => Err(MutationError::Rejected(e)),
    }
}

/// Log a failed follow-up refresh. The failure is already recorded on the
/// resource that ran it.
fn log_refresh_failure<T>(resource: &'static str, result: Result<T, ApiError>) {
    if let Err(e) = result {
        warn!(resource, kind = ?e.kind(), error = %e, "Refresh after mutation failed");
    }
}
