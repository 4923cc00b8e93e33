// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Member KYC workflow hook: verification status and supporting documents.

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{mutate_then_reload, MutationError};
use crate::api::kyc::{KycApi, KycDocument, KycStatusResponse, KycSubmission, NewKycDocument};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::resource::AsyncResource;

#[derive(Clone)]
pub struct KycWorkflow {
    api: KycApi,
    status: AsyncResource<KycStatusResponse>,
    documents: AsyncResource<Vec<KycDocument>>,
    disposed: CancellationToken,
}

impl KycWorkflow {
    pub fn new(http: HttpClient) -> Self {
        let disposed = CancellationToken::new();
        Self {
            api: KycApi::new(http),
            status: AsyncResource::with_cancellation("kyc.status", disposed.child_token()),
            documents: AsyncResource::with_cancellation("kyc.documents", disposed.child_token()),
            disposed,
        }
    }

    pub fn status(&self) -> &AsyncResource<KycStatusResponse> {
        &self.status
    }

    pub fn documents(&self) -> &AsyncResource<Vec<KycDocument>> {
        &self.documents
    }

    pub async fn fetch_status(&self) -> Result<KycStatusResponse, ApiError> {
        self.status.run(self.api.status()).await
    }

    /// Submit identity details, then reload the verification status.
    pub async fn submit(
        &self,
        submission: KycSubmission,
    ) -> Result<KycStatusResponse, MutationError> {
        let status = mutate_then_reload(
            &self.status,
            self.api.submit(&submission),
            self.api.status(),
        )
        .await?;
        info!(status = %status.status, "KYC submission sent");
        Ok(status)
    }

    pub async fn fetch_documents(&self) -> Result<Vec<KycDocument>, ApiError> {
        self.documents.run(self.api.documents()).await
    }

    /// Register a document, then reload the document list.
    pub async fn add_document(
        &self,
        document: NewKycDocument,
    ) -> Result<Vec<KycDocument>, MutationError> {
        let added = async {
            let added = self.api.add_document(&document).await?;
            info!(document_id = %added.id, "KYC document added");
            Ok::<_, ApiError>(added)
        };
        mutate_then_reload(&self.documents, added, self.api.documents()).await
    }

    pub fn dispose(&self) {
        self.disposed.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_cancelled()
    }
}

impl std::fmt::Debug for KycWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KycWorkflow")
            .field("status", &self.status)
            .field("documents", &self.documents)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::kyc::{DocumentType, KycStatus, DOCUMENTS_PATH, STATUS_PATH, SUBMIT_PATH};
    use crate::auth::TokenStore;
    use crate::error::ErrorKind;
    use crate::http::{Method, TransportError};
    use crate::test_utils::{kyc_submission, test_client, FakeTransport, Reply};
    use serde_json::json;

    fn workflow(transport: &std::sync::Arc<FakeTransport>) -> KycWorkflow {
        KycWorkflow::new(test_client(transport, TokenStore::in_memory()))
    }

    #[tokio::test]
    async fn submit_refreshes_status() {
        let transport = FakeTransport::new();
        transport
            .on(Method::Get, STATUS_PATH, Reply::ok(json!({ "status": "not_submitted" })))
            .on(
                Method::Get,
                STATUS_PATH,
                Reply::ok(json!({ "status": "pending", "submittedAt": "2026-10-01T09:30:00Z" })),
            )
            .on(Method::Post, SUBMIT_PATH, Reply::json(201, json!({ "message": "Received" })));
        let kyc = workflow(&transport);
        kyc.fetch_status().await.unwrap();
        assert!(kyc.status().data().unwrap().status.can_submit());

        let status = kyc.submit(kyc_submission()).await.unwrap();

        assert_eq!(status.status, KycStatus::Pending);
        assert_eq!(kyc.status().data().unwrap().status, KycStatus::Pending);
        assert_eq!(transport.calls(Method::Post, SUBMIT_PATH), 1);
        assert_eq!(
            transport.last_body(Method::Post, SUBMIT_PATH).unwrap()["documentNumber"],
            "LA123456"
        );
    }

    #[tokio::test]
    async fn rejected_submission_keeps_previous_status() {
        let transport = FakeTransport::new();
        transport
            .on(Method::Get, STATUS_PATH, Reply::ok(json!({ "status": "rejected", "rejectionReason": "Blurry scan" })))
            .on(
                Method::Post,
                SUBMIT_PATH,
                Reply::json(400, json!({ "message": "Date of birth is invalid" })),
            );
        let kyc = workflow(&transport);
        kyc.fetch_status().await.unwrap();

        let error = kyc.submit(kyc_submission()).await.unwrap_err();

        assert!(!error.applied());
        assert_eq!(error.kind(), ErrorKind::Validation);
        let state = kyc.status().state();
        assert_eq!(state.error.as_deref(), Some("Date of birth is invalid"));
        let stale = state.data.unwrap();
        assert_eq!(stale.status, KycStatus::Rejected);
        assert_eq!(stale.rejection_reason.as_deref(), Some("Blurry scan"));
        assert_eq!(transport.calls(Method::Get, STATUS_PATH), 1);
    }

    #[tokio::test]
    async fn adding_a_document_reloads_the_list() {
        let transport = FakeTransport::new();
        let doc = |id: &str| json!({ "id": id, "documentType": "passport", "fileName": format!("{id}.jpg") });
        transport
            .on(Method::Get, DOCUMENTS_PATH, Reply::ok(json!({ "documents": [doc("d1")] })))
            .on(Method::Get, DOCUMENTS_PATH, Reply::ok(json!({ "documents": [doc("d1"), doc("d2")] })))
            .on(Method::Post, DOCUMENTS_PATH, Reply::json(201, doc("d2")));
        let kyc = workflow(&transport);
        kyc.fetch_documents().await.unwrap();

        let docs = kyc
            .add_document(NewKycDocument {
                document_type: DocumentType::Passport,
                file_name: "d2.jpg".into(),
                url: "https://files.rewards.test/d2.jpg".into(),
                mime_type: None,
            })
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(kyc.documents().data().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn submission_with_failed_status_reload_is_reported_as_applied() {
        let transport = FakeTransport::new();
        transport
            .on(Method::Get, STATUS_PATH, Reply::ok(json!({ "status": "not_submitted" })))
            .on(
                Method::Get,
                STATUS_PATH,
                Reply::Fail(TransportError::Connect("connection reset".into())),
            )
            .on(Method::Post, SUBMIT_PATH, Reply::json(201, json!({ "message": "Received" })));
        let kyc = workflow(&transport);
        kyc.fetch_status().await.unwrap();

        let error = kyc.submit(kyc_submission()).await.unwrap_err();

        assert!(error.applied());
        assert_eq!(error.kind(), ErrorKind::Network);
        assert_eq!(transport.calls(Method::Post, SUBMIT_PATH), 1);
        let state = kyc.status().state();
        assert_eq!(state.data.unwrap().status, KycStatus::NotSubmitted);
        assert_eq!(state.error.as_deref(), Some(crate::error::NETWORK_MESSAGE));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn dispose_discards_results() {
        let transport = FakeTransport::new();
        transport.on(Method::Get, STATUS_PATH, Reply::ok(json!({ "status": "approved" })));
        let kyc = workflow(&transport);

        kyc.dispose();
        let status = kyc.fetch_status().await.unwrap();

        assert_eq!(status.status, KycStatus::Approved);
        assert!(kyc.is_disposed());
        assert_eq!(kyc.status().data(), None);
    }
}
