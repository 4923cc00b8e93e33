// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request description passed to [`HttpClient::request`](super::HttpClient::request).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::auth::Token;

/// HTTP methods used by the rewards API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Methods whose repetition has no additional side effect.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Put | Method::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Header map with case-insensitive keys (stored lowercase).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    /// Overlay `other` on top of `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serialized request payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Vec<u8>),
    /// Payload failed to serialize; the request is never sent.
    Invalid(String),
}

/// Which bearer credential a request carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credential {
    /// Token from the token store, if one is present.
    #[default]
    Stored,
    /// This token instead of the stored one.
    Override(Token),
    /// No `Authorization` header.
    Anonymous,
}

/// One logical request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub path: String,
    /// Ordered query pairs; duplicates are kept.
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: RequestBody,
    pub credential: Credential,
    /// Per-attempt deadline overriding the client default.
    pub timeout: Option<Duration>,
    /// Allow retrying this request even if its method is not idempotent.
    pub retry_unsafe: bool,
}

impl RequestOptions {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: RequestBody::Empty,
            credential: Credential::Stored,
            timeout: None,
            retry_unsafe: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query pair only when `value` is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = match serde_json::to_vec(body) {
            Ok(bytes) => RequestBody::Json(bytes),
            Err(e) => RequestBody::Invalid(e.to_string()),
        };
        self
    }

    pub fn token(mut self, token: Token) -> Self {
        self.credential = Credential::Override(token);
        self
    }

    /// Send without any bearer credential.
    pub fn anonymous(mut self) -> Self {
        self.credential = Credential::Anonymous;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry_unsafe(mut self) -> Self {
        self.retry_unsafe = true;
        self
    }
}

/// Percent-encode a single path segment.
pub fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headers_are_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("content-type", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn merge_prefers_overlay() {
        let mut defaults = Headers::new();
        defaults.insert("Accept", "application/json");
        defaults.insert("Content-Type", "application/json");

        let mut caller = Headers::new();
        caller.insert("content-type", "application/merge-patch+json");

        defaults.merge(&caller);
        assert_eq!(defaults.get("Content-Type"), Some("application/merge-patch+json"));
        assert_eq!(defaults.get("accept"), Some("application/json"));
    }

    #[test]
    fn builder_keeps_query_order_and_duplicates() {
        let options = RequestOptions::get("/admin/users")
            .query("role", "admin")
            .query("role", "user")
            .query_opt("page", Some(2))
            .query_opt::<u32>("limit", None);
        assert_eq!(
            options.query,
            vec![
                ("role".to_string(), "admin".to_string()),
                ("role".to_string(), "user".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn json_body_is_serialized_eagerly() {
        let options = RequestOptions::post("/auth/login").json(&json!({ "email": "a@b.c" }));
        assert_eq!(
            options.body,
            RequestBody::Json(br#"{"email":"a@b.c"}"#.to_vec())
        );
    }

    #[test]
    fn idempotency_by_method() {
        assert!(Method::Get.is_idempotent());
        assert!(Method::Put.is_idempotent());
        assert!(Method::Delete.is_idempotent());
        assert!(!Method::Post.is_idempotent());
        assert!(!Method::Patch.is_idempotent());
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(encode_segment("abc-123"), "abc-123");
        assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
    }
}
