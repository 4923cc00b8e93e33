// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin console endpoints.
//!
//! These endpoints require the Admin role server-side and provide:
//! - Dashboard statistics
//! - User listing with filters, detail and status changes
//! - The KYC review queue with approve / reject decisions

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::acknowledge;
use super::kyc::{KycDocument, KycStatus};
use crate::auth::Role;
use crate::error::ApiError;
use crate::http::{encode_segment, HttpClient, RequestOptions};
use crate::models::MessageResponse;

pub const STATS_PATH: &str = "/admin/stats";
pub const USERS_PATH: &str = "/admin/users";
pub const KYC_QUEUE_PATH: &str = "/admin/kyc";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Dashboard statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    /// Registered accounts.
    pub total_users: u64,
    /// Accounts in `active` status.
    pub active_users: u64,
    /// KYC submissions awaiting review.
    pub pending_kyc: u64,
    /// Reward points issued to date.
    pub total_points_issued: u64,
    /// Reward points redeemed to date.
    pub total_points_redeemed: u64,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Account status managed by administrators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Banned => "banned",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters for `GET /admin/users`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserFilters {
    /// Append the set filters as query pairs, in a stable order.
    pub fn apply(&self, options: RequestOptions) -> RequestOptions {
        options
            .query_opt("search", self.search.as_deref().filter(|s| !s.trim().is_empty()))
            .query_opt("role", self.role)
            .query_opt("status", self.status)
            .query_opt("page", self.page)
            .query_opt("limit", self.limit)
    }
}

/// User record as seen by administrators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub kyc_status: KycStatus,
    #[serde(default)]
    pub points_balance: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// One page of `GET /admin/users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPage {
    pub users: Vec<AdminUser>,
    /// Total matches before pagination.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// KYC submission as it appears in the review queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KycSubmissionRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub status: KycStatus,
    #[serde(default)]
    pub documents: Vec<KycDocument>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Response of `GET /admin/kyc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KycQueue {
    pub submissions: Vec<KycSubmissionRecord>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectKycRequest {
    pub reason: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AdminUserEnvelope {
    Wrapped { user: AdminUser },
    Bare(AdminUser),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubmissionEnvelope {
    Wrapped { submission: KycSubmissionRecord },
    Bare(KycSubmissionRecord),
}

// ============================================================================
// Endpoints
// ============================================================================

#[derive(Debug, Clone)]
pub struct AdminApi {
    http: HttpClient,
}

impl AdminApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.http.get(STATS_PATH).await.into_result()
    }

    pub async fn users(&self, filters: &UserFilters) -> Result<UserPage, ApiError> {
        self.http
            .request(filters.apply(RequestOptions::get(USERS_PATH)))
            .await
            .into_result()
    }

    pub async fn user(&self, user_id: &str) -> Result<AdminUser, ApiError> {
        self.http
            .get::<AdminUserEnvelope>(&user_path(user_id))
            .await
            .into_result()
            .map(|envelope| match envelope {
                AdminUserEnvelope::Wrapped { user } | AdminUserEnvelope::Bare(user) => user,
            })
    }

    pub async fn update_user_status(
        &self,
        user_id: &str,
        request: &UpdateUserStatusRequest,
    ) -> Result<MessageResponse, ApiError> {
        let path = format!("{}/status", user_path(user_id));
        acknowledge(&self.http, RequestOptions::put(path).json(request)).await
    }

    pub async fn kyc_queue(&self, status: Option<KycStatus>) -> Result<KycQueue, ApiError> {
        self.http
            .request(RequestOptions::get(KYC_QUEUE_PATH).query_opt("status", status))
            .await
            .into_result()
    }

    pub async fn kyc_submission(&self, submission_id: &str) -> Result<KycSubmissionRecord, ApiError> {
        self.http
            .get::<SubmissionEnvelope>(&submission_path(submission_id))
            .await
            .into_result()
            .map(|envelope| match envelope {
                SubmissionEnvelope::Wrapped { submission } | SubmissionEnvelope::Bare(submission) => {
                    submission
                }
            })
    }

    pub async fn approve_kyc(&self, submission_id: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("{}/approve", submission_path(submission_id));
        acknowledge(&self.http, RequestOptions::post(path)).await
    }

    pub async fn reject_kyc(
        &self,
        submission_id: &str,
        reason: &str,
    ) -> Result<MessageResponse, ApiError> {
        let path = format!("{}/reject", submission_path(submission_id));
        let body = RejectKycRequest {
            reason: reason.to_string(),
        };
        acknowledge(&self.http, RequestOptions::post(path).json(&body)).await
    }
}

fn user_path(user_id: &str) -> String {
    format!("{USERS_PATH}/{}", encode_segment(user_id))
}

fn submission_path(submission_id: &str) -> String {
    format!("{KYC_QUEUE_PATH}/{}", encode_segment(submission_id))
}
