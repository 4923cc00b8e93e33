// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # HTTP Client
//!
//! [`HttpClient::request`] issues one logical request and always resolves to
//! an [`ApiResponse`]; it never returns a raw transport or decode error.
//!
//! ## Request Pipeline
//!
//! 1. URL = base address + path + ordered query pairs
//! 2. Default headers (JSON content type, `X-Request-Id`) overlaid with
//!    caller headers; caller headers win
//! 3. Bearer credential from the override or the token store
//! 4. Each attempt runs under a deadline; expiry drops the in-flight
//!    transport future and classifies as `Timeout`
//! 5. `Network` / `Timeout` failures are retried per [`RetryPolicy`]
//! 6. 2xx bodies decode into `T`; anything else is classified
//!
//! An `Auth` classification on a request that carried the stored token
//! evicts that token. The session manager observes the eviction on its next
//! bootstrap.

pub mod classify;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

pub use classify::{classify_status, classify_transport};
pub use request::{encode_segment, Credential, Headers, Method, RequestBody, RequestOptions};
pub use response::{ApiResponse, NO_STATUS};
pub use retry::{Jitter, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::auth::{Token, TokenStore};
use crate::config::ClientConfig;
use crate::error::{ApiError, UNKNOWN_MESSAGE};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Resilient JSON client for the rewards API.
#[derive(Clone)]
pub struct HttpClient {
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
    tokens: TokenStore,
    transport: Arc<dyn Transport>,
}

impl HttpClient {
    /// Client over the reqwest transport.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, tokens, Arc::new(transport)))
    }

    pub fn with_transport(
        config: &ClientConfig,
        tokens: TokenStore,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.request_timeout,
            retry: config.retry.clone(),
            tokens,
            transport,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request(RequestOptions::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResponse<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(RequestOptions::post(path).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResponse<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(RequestOptions::put(path).json(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ApiResponse<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(RequestOptions::patch(path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request(RequestOptions::delete(path)).await
    }

    /// Issue one logical request. Exactly one `ApiResponse` is produced.
    pub async fn request<T: DeserializeOwned>(&self, options: RequestOptions) -> ApiResponse<T> {
        let request_id = Uuid::new_v4();
        let method = options.method;
        let path = options.path.clone();

        let body = match options.body {
            RequestBody::Empty => None,
            RequestBody::Json(bytes) => Some(bytes),
            RequestBody::Invalid(reason) => {
                warn!(%request_id, %method, path = %path, reason = %reason, "Request body could not be encoded");
                return ApiResponse::failure(ApiError::unknown(UNKNOWN_MESSAGE));
            }
        };

        let url = match self.build_url(&path, &options.query) {
            Ok(url) => url,
            Err(e) => {
                warn!(%request_id, %method, path = %path, error = %e, "Request URL could not be built");
                return ApiResponse::failure(ApiError::unknown(UNKNOWN_MESSAGE));
            }
        };

        let mut headers = Headers::new();
        headers.insert("content-type", JSON_CONTENT_TYPE);
        headers.insert("accept", JSON_CONTENT_TYPE);
        headers.insert(REQUEST_ID_HEADER, request_id.to_string());
        headers.merge(&options.headers);

        let mut attached: Option<Token> = None;
        if !headers.contains("authorization") {
            match &options.credential {
                Credential::Stored => {
                    if let Some(token) = self.tokens.get() {
                        headers.insert("authorization", token.bearer());
                        attached = Some(token);
                    }
                }
                Credential::Override(token) => headers.insert("authorization", token.bearer()),
                Credential::Anonymous => {}
            }
        }

        let transport_request = TransportRequest {
            method,
            url,
            headers,
            body,
        };
        let timeout = options.timeout.unwrap_or(self.timeout);

        let mut attempt = 0u32;
        let response = loop {
            attempt += 1;
            debug!(%request_id, %method, path = %path, attempt, "Sending request");

            let result = match tokio::time::timeout(
                timeout,
                self.transport.send(transport_request.clone()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout),
            };

            match result {
                Ok(response) => break response,
                Err(e) => {
                    let error = classify_transport(&e);
                    if self
                        .retry
                        .should_retry(method, attempt, &error, options.retry_unsafe)
                    {
                        let delay = self.retry.delay_after(attempt);
                        warn!(
                            %request_id,
                            %method,
                            path = %path,
                            attempt,
                            max_attempts = self.retry.max_attempts(),
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Transient request failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    warn!(
                        %request_id,
                        %method,
                        path = %path,
                        attempt,
                        error = %e,
                        kind = ?error.kind(),
                        "Request failed"
                    );
                    return ApiResponse::failure(error);
                }
            }
        };

        let status = response.status;
        if (200..300).contains(&status) {
            debug!(%request_id, %method, path = %path, status, "Request succeeded");
            return match decode_body(&response.body) {
                Ok(data) => ApiResponse::success(data, status),
                Err(e) => ApiResponse::failure(classify::classify_decode(status, &e)),
            };
        }

        let error = classify_status(status, &response.body);
        info!(
            %request_id,
            %method,
            path = %path,
            status,
            kind = ?error.kind(),
            "Request rejected"
        );

        if let Some(token) = attached.filter(|_| error.is_auth()) {
            if self.tokens.clear_if(&token) {
                warn!(%request_id, status, "Stored token rejected, evicting session token");
            } else {
                info!(%request_id, status, "Rejected token already replaced, keeping session token");
            }
        }

        ApiResponse::failure(error)
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Decode a 2xx body; an empty body decodes as JSON `null`.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    }
}
