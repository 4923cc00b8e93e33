// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin console hook: dashboard stats, user management and KYC review.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{log_refresh_failure, mutate_then_reload, MutationError};
use crate::api::admin::{
    AdminApi, AdminUser, DashboardStats, KycQueue, KycSubmissionRecord, UpdateUserStatusRequest,
    UserFilters, UserPage, UserStatus,
};
use crate::api::kyc::KycStatus;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::resource::AsyncResource;

#[derive(Clone)]
pub struct AdminConsole {
    api: AdminApi,
    stats: AsyncResource<DashboardStats>,
    users: AsyncResource<UserPage>,
    selected_user: AsyncResource<AdminUser>,
    kyc_queue: AsyncResource<KycQueue>,
    selected_submission: AsyncResource<KycSubmissionRecord>,
    user_filters: Arc<Mutex<UserFilters>>,
    kyc_filter: Arc<Mutex<Option<KycStatus>>>,
    disposed: CancellationToken,
}

impl AdminConsole {
    pub fn new(http: HttpClient) -> Self {
        let disposed = CancellationToken::new();
        Self {
            api: AdminApi::new(http),
            stats: AsyncResource::with_cancellation("admin.stats", disposed.child_token()),
            users: AsyncResource::with_cancellation("admin.users", disposed.child_token()),
            selected_user: AsyncResource::with_cancellation(
                "admin.selected_user",
                disposed.child_token(),
            ),
            kyc_queue: AsyncResource::with_cancellation("admin.kyc_queue", disposed.child_token()),
            selected_submission: AsyncResource::with_cancellation(
                "admin.selected_submission",
                disposed.child_token(),
            ),
            user_filters: Arc::new(Mutex::new(UserFilters::default())),
            kyc_filter: Arc::new(Mutex::new(None)),
            disposed,
        }
    }

    pub fn stats(&self) -> &AsyncResource<DashboardStats> {
        &self.stats
    }

    pub fn users(&self) -> &AsyncResource<UserPage> {
        &self.users
    }

    pub fn selected_user(&self) -> &AsyncResource<AdminUser> {
        &self.selected_user
    }

    pub fn kyc_queue(&self) -> &AsyncResource<KycQueue> {
        &self.kyc_queue
    }

    pub fn selected_submission(&self) -> &AsyncResource<KycSubmissionRecord> {
        &self.selected_submission
    }

    /// Filters used by the most recent user listing.
    pub fn user_filters(&self) -> UserFilters {
        self.user_filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Status filter used by the most recent KYC queue listing.
    pub fn kyc_filter(&self) -> Option<KycStatus> {
        *self.kyc_filter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn fetch_stats(&self) -> Result<DashboardStats, ApiError> {
        self.stats.run(self.api.stats()).await
    }

    pub async fn fetch_users(&self, filters: UserFilters) -> Result<UserPage, ApiError> {
        *self.user_filters.lock().unwrap_or_else(PoisonError::into_inner) = filters.clone();
        self.users.run(async move { self.api.users(&filters).await }).await
    }

    /// Re-run the user listing with the last filters.
    pub async fn refresh_users(&self) -> Result<UserPage, ApiError> {
        self.fetch_users(self.user_filters()).await
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<AdminUser, ApiError> {
        self.selected_user.run(self.api.user(user_id)).await
    }

    pub async fn fetch_kyc_queue(&self, status: Option<KycStatus>) -> Result<KycQueue, ApiError> {
        *self.kyc_filter.lock().unwrap_or_else(PoisonError::into_inner) = status;
        self.kyc_queue.run(self.api.kyc_queue(status)).await
    }

    pub async fn fetch_kyc_submission(
        &self,
        submission_id: &str,
    ) -> Result<KycSubmissionRecord, ApiError> {
        self.selected_submission
            .run(self.api.kyc_submission(submission_id))
            .await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Change a user's status, then reload the user list (last filters).
    ///
    /// The selected user and the stats are refreshed afterwards when loaded,
    /// also when the list reload fails after the change went through.
    pub async fn update_user_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<UserPage, MutationError> {
        let request = UpdateUserStatusRequest {
            status,
            reason: None,
        };
        let filters = self.user_filters();
        let page = mutate_then_reload(
            &self.users,
            self.api.update_user_status(user_id, &request),
            self.api.users(&filters),
        )
        .await;
        if let Err(MutationError::Rejected(_)) = page {
            return page;
        }
        info!(user_id, %status, "User status updated");

        if self.selected_user.data().is_some_and(|u| u.id == user_id) {
            log_refresh_failure(self.selected_user.name(), self.fetch_user(user_id).await);
        }
        self.refresh_stats_if_loaded().await;
        page
    }

    /// Approve a submission, then reload the queue (last status filter).
    pub async fn approve_kyc(&self, submission_id: &str) -> Result<KycQueue, MutationError> {
        let status = self.kyc_filter();
        let queue = mutate_then_reload(
            &self.kyc_queue,
            self.api.approve_kyc(submission_id),
            self.api.kyc_queue(status),
        )
        .await;
        if let Err(MutationError::Rejected(_)) = queue {
            return queue;
        }
        info!(submission_id, "KYC submission approved");

        self.after_kyc_review(submission_id).await;
        queue
    }

    pub async fn reject_kyc(
        &self,
        submission_id: &str,
        reason: &str,
    ) -> Result<KycQueue, MutationError> {
        let status = self.kyc_filter();
        let queue = mutate_then_reload(
            &self.kyc_queue,
            self.api.reject_kyc(submission_id, reason),
            self.api.kyc_queue(status),
        )
        .await;
        if let Err(MutationError::Rejected(_)) = queue {
            return queue;
        }
        info!(submission_id, "KYC submission rejected");

        self.after_kyc_review(submission_id).await;
        queue
    }

    /// Dispose every resource of this console.
    pub fn dispose(&self) {
        self.disposed.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_cancelled()
    }

    async fn after_kyc_review(&self, submission_id: &str) {
        if self
            .selected_submission
            .data()
            .is_some_and(|s| s.id == submission_id)
        {
            log_refresh_failure(
                self.selected_submission.name(),
                self.fetch_kyc_submission(submission_id).await,
            );
        }
        // The user list shows each member's KYC status.
        if self.users.is_loaded() {
            log_refresh_failure(self.users.name(), self.refresh_users().await);
        }
        self.refresh_stats_if_loaded().await;
    }

    async fn refresh_stats_if_loaded(&self) {
        if self.stats.is_loaded() {
            log_refresh_failure(self.stats.name(), self.fetch_stats().await);
        }
    }
}

impl std::fmt::Debug for AdminConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConsole")
            .field("stats", &self.stats)
            .field("users", &self.users)
            .field("kyc_queue", &self.kyc_queue)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
