// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport seam between [`HttpClient`](super::HttpClient) and the network.
//!
//! The client builds a fully resolved [`TransportRequest`] (absolute URL,
//! merged headers, encoded body) and hands it to a [`Transport`]. The
//! production transport is reqwest; tests substitute a scripted one.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::{Headers, Method};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Raw transport failure, before classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established or was dropped
    #[error("connection failed: {0}")]
    Connect(String),

    /// Transport-level deadline expired
    #[error("request timed out")]
    Timeout,

    /// Request could not be built (bad header, bad URL)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Response arrived but its body could not be read completely
    #[error("failed to read response body: {0}")]
    Body(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
///
/// No client-level timeout is configured: the deadline is enforced per
/// attempt by `HttpClient`, which drops (and thereby aborts) the in-flight
/// future when it expires.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let headers = to_header_map(&request.headers)?;
        let mut builder = self
            .http
            .request(request.method.into(), request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn to_header_map(headers: &Headers) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else if error.is_body() || error.is_decode() {
        TransportError::Body(error.to_string())
    } else {
        TransportError::Connect(error.to_string())
    }
}
