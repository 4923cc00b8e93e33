// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Error Taxonomy
//!
//! Every failure the client can observe is folded into [`ApiError`] exactly
//! once, at the HTTP client boundary. Upper layers (session manager, async
//! resources, feature hooks) match on [`ErrorKind`] and surface the
//! `Display` output, which is always a human-readable message.
//!
//! | Kind | Source |
//! |------|--------|
//! | `Network` | connection refused, DNS failure, reset |
//! | `Timeout` | request deadline expired |
//! | `Validation` | 400 / 422 with optional field errors |
//! | `Auth` | 401 / 403 |
//! | `ServerFault` | 5xx |
//! | `Unknown` | everything else, including malformed bodies |

use std::collections::BTreeMap;

use serde_json::Value;

/// Field name to messages, as returned by the API on validation failures.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NETWORK_MESSAGE: &str = "Unable to reach the server. Check your connection and try again.";
pub const TIMEOUT_MESSAGE: &str = "The server took too long to respond. Please try again.";
pub const UNKNOWN_MESSAGE: &str = "Something went wrong. Please try again.";

/// Discriminant of [`ApiError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    Auth,
    ServerFault,
    Unknown,
}

/// Classified client error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Network { message: String },

    #[error("{message}")]
    Timeout { message: String },

    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        fields: FieldErrors,
    },

    #[error("{message}")]
    Auth { status: u16, message: String },

    #[error("{message}")]
    ServerFault { status: u16, message: String },

    #[error("{message}")]
    Unknown {
        status: Option<u16>,
        message: String,
    },
}

impl ApiError {
    pub fn network() -> Self {
        ApiError::Network {
            message: NETWORK_MESSAGE.to_string(),
        }
    }

    pub fn timeout() -> Self {
        ApiError::Timeout {
            message: TIMEOUT_MESSAGE.to_string(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        ApiError::Unknown {
            status: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Timeout { .. } => ErrorKind::Timeout,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Auth { .. } => ErrorKind::Auth,
            ApiError::ServerFault { .. } => ErrorKind::ServerFault,
            ApiError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Human-readable message, identical to the `Display` output.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message }
            | ApiError::Timeout { message }
            | ApiError::Validation { message, .. }
            | ApiError::Auth { message, .. }
            | ApiError::ServerFault { message, .. }
            | ApiError::Unknown { message, .. } => message,
        }
    }

    /// HTTP status that produced this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network { .. } | ApiError::Timeout { .. } => None,
            ApiError::Validation { status, .. }
            | ApiError::Auth { status, .. }
            | ApiError::ServerFault { status, .. } => Some(*status),
            ApiError::Unknown { status, .. } => *status,
        }
    }

    /// Field errors carried by a `Validation` failure (empty otherwise).
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Failures worth another attempt with identical parameters.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Timeout)
    }

    /// Failures that invalidate the current session.
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }
}

/// Pull the most useful human-readable message out of an API error body.
///
/// Lookup order: `message`, `error` (string or `{message}`), `detail`, then
/// the first entry of an `errors` collection. `errors` may be a field map
/// (`{"email": ["already taken"]}` or `{"email": "already taken"}`) or a list
/// of strings / `{msg}` / `{message}` objects.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let non_empty = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    non_empty(body.get("message"))
        .or_else(|| non_empty(body.get("error")))
        .or_else(|| non_empty(body.pointer("/error/message")))
        .or_else(|| non_empty(body.get("detail")))
        .or_else(|| body.get("errors").and_then(first_listed_error))
}

/// Normalize an `errors` field map into [`FieldErrors`].
///
/// Non-map shapes yield an empty map.
pub fn extract_field_errors(body: &Value) -> FieldErrors {
    let mut fields = FieldErrors::new();
    let Some(map) = body.get("errors").and_then(Value::as_object) else {
        return fields;
    };

    for (field, messages) in map {
        let collected: Vec<String> = match messages {
            Value::String(message) => vec![message.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        if !collected.is_empty() {
            fields.insert(field.clone(), collected);
        }
    }
    fields
}

fn first_listed_error(errors: &Value) -> Option<String> {
    match errors {
        Value::Object(map) => map.values().find_map(first_message_in),
        Value::Array(items) => items.iter().find_map(first_message_in),
        Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
        _ => None,
    }
}

fn first_message_in(value: &Value) -> Option<String> {
    match value {
        Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
        Value::Array(items) => items.iter().find_map(first_message_in),
        Value::Object(_) => value
            .get("msg")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
