// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted transport and fixtures shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use url::Url;

use crate::api::kyc::{DocumentType, KycSubmission};
use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::http::{
    HttpClient, Method, RetryPolicy, Transport, TransportError, TransportRequest,
    TransportResponse,
};

pub const TEST_BASE_URL: &str = "http://rewards.test";

/// Scripted reply for one attempt.
#[derive(Debug, Clone)]
pub enum Reply {
    Response(u16, Vec<u8>),
    Fail(TransportError),
    /// Never settles; only a deadline ends the attempt.
    Hang,
    /// Held until the gate hands out a permit, then answers.
    Gated(Arc<Semaphore>, u16, Vec<u8>),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn json(status: u16, body: Value) -> Self {
        Reply::Response(status, body.to_string().into_bytes())
    }

    pub fn raw(status: u16, body: &[u8]) -> Self {
        Reply::Response(status, body.to_vec())
    }

    /// JSON reply released one attempt per `gate.add_permits(1)`.
    pub fn gated(gate: &Arc<Semaphore>, status: u16, body: Value) -> Self {
        Reply::Gated(gate.clone(), status, body.to_string().into_bytes())
    }
}

/// Closed gate for [`Reply::gated`].
pub fn gate() -> Arc<Semaphore> {
    Arc::new(Semaphore::new(0))
}

/// Transport answering from per-route reply queues.
///
/// Replies for a route are consumed in order; the last one repeats.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Drop any scripted replies for a route.
    pub fn reset(&self, method: Method, path: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .remove(&(method, path.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .count()
    }

    /// Yield until a route has seen `count` requests.
    pub async fn wait_for_calls(&self, method: Method, path: &str, count: usize) {
        while self.calls(method, path) < count {
            tokio::task::yield_now().await;
        }
    }

    /// Decoded JSON body of the last request to a route.
    pub fn last_body(&self, method: Method, path: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.url.path() == path)
            .and_then(|r| r.body.as_ref())
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let key = (request.method, request.url.path().to_string());
        self.requests.lock().unwrap().push(request);

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Response(status, body)) => Ok(TransportResponse { status, body }),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Gated(gate, status, body)) => {
                gate.acquire().await.unwrap().forget();
                Ok(TransportResponse { status, body })
            }
            None => Ok(TransportResponse {
                status: 404,
                body: json!({ "message": "Not found" }).to_string().into_bytes(),
            }),
        }
    }
}

/// Config pointing at the fake host with zero retry backoff.
pub fn test_config() -> ClientConfig {
    ClientConfig::new(Url::parse(TEST_BASE_URL).unwrap())
        .with_retry(RetryPolicy::default().with_base_delay(Duration::ZERO))
}

pub fn test_client(transport: &Arc<FakeTransport>, tokens: TokenStore) -> HttpClient {
    HttpClient::with_transport(&test_config(), tokens, transport.clone())
}

pub fn user_json(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{id}@rewards.test"),
        "name": "Test Member",
        "role": role,
        "isVerified": true
    })
}

pub fn kyc_submission() -> KycSubmission {
    KycSubmission {
        full_name: "Ann Lee".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        nationality: "NZ".into(),
        address: "1 Queen St".into(),
        city: "Auckland".into(),
        postal_code: "1010".into(),
        country: "NZ".into(),
        document_type: DocumentType::Passport,
        document_number: "LA123456".into(),
        phone: None,
    }
}
