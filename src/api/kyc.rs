// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Member-facing KYC endpoints and payloads.
//!
//! Documents are exchanged as metadata only (type, file name, hosted URL);
//! uploading the file itself happens outside this client.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::acknowledge;
use crate::error::ApiError;
use crate::http::{HttpClient, RequestOptions};
use crate::models::MessageResponse;

pub const STATUS_PATH: &str = "/kyc/status";
pub const SUBMIT_PATH: &str = "/kyc/submit";
pub const DOCUMENTS_PATH: &str = "/kyc/documents";

// =============================================================================
// Types
// =============================================================================

/// Verification state of a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    NotSubmitted,
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::NotSubmitted => "not_submitted",
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }

    /// Whether a new submission is accepted in this state.
    pub fn can_submit(&self) -> bool {
        matches!(self, KycStatus::NotSubmitted | KycStatus::Rejected)
    }
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    NationalId,
    DriversLicense,
    ProofOfAddress,
    Selfie,
}

/// Response of `GET /kyc/status`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KycStatusResponse {
    #[serde(default)]
    pub status: KycStatus,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewer's reason, present when `status` is `rejected`.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Identity details sent with `POST /kyc/submit` or `POST /auth/register-kyc`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KycSubmission {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub document_type: DocumentType,
    pub document_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl std::fmt::Debug for KycSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KycSubmission")
            .field("full_name", &self.full_name)
            .field("country", &self.country)
            .field("document_type", &self.document_type)
            .field("document_number", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Document metadata registered with `POST /kyc/documents`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewKycDocument {
    pub document_type: DocumentType,
    pub file_name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Stored document as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KycDocument {
    pub id: String,
    pub document_type: DocumentType,
    pub file_name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: KycStatus,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<KycDocument>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentEnvelope {
    Wrapped { document: KycDocument },
    Bare(KycDocument),
}

// =============================================================================
// Endpoints
// =============================================================================

#[derive(Debug, Clone)]
pub struct KycApi {
    http: HttpClient,
}

impl KycApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn status(&self) -> Result<KycStatusResponse, ApiError> {
        self.http.get(STATUS_PATH).await.into_result()
    }

    pub async fn submit(&self, submission: &KycSubmission) -> Result<MessageResponse, ApiError> {
        acknowledge(&self.http, RequestOptions::post(SUBMIT_PATH).json(submission)).await
    }

    pub async fn documents(&self) -> Result<Vec<KycDocument>, ApiError> {
        self.http
            .get::<DocumentList>(DOCUMENTS_PATH)
            .await
            .into_result()
            .map(|list| list.documents)
    }

    pub async fn add_document(&self, document: &NewKycDocument) -> Result<KycDocument, ApiError> {
        self.http
            .post::<_, DocumentEnvelope>(DOCUMENTS_PATH, document)
            .await
            .into_result()
            .map(|envelope| match envelope {
                DocumentEnvelope::Wrapped { document } | DocumentEnvelope::Bare(document) => {
                    document
                }
            })
    }
}
