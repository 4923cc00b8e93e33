// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mapping of raw failures onto [`ApiError`].

use serde_json::Value;

use super::TransportError;
use crate::error::{extract_error_message, extract_field_errors, ApiError, UNKNOWN_MESSAGE};

/// Classify a failure that produced no HTTP response.
pub fn classify_transport(error: &TransportError) -> ApiError {
    match error {
        TransportError::Connect(_) => ApiError::network(),
        TransportError::Timeout => ApiError::timeout(),
        TransportError::InvalidRequest(_) | TransportError::Body(_) => {
            ApiError::unknown(UNKNOWN_MESSAGE)
        }
    }
}

/// Classify a non-2xx response.
///
/// The server-supplied message is preferred; a status-specific fallback is
/// used when the body is empty, not JSON, or carries no message.
pub fn classify_status(status: u16, body: &[u8]) -> ApiError {
    let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let message = extract_error_message(&parsed).unwrap_or_else(|| fallback_message(status).to_string());

    match status {
        400 | 422 => ApiError::Validation {
            status,
            message,
            fields: extract_field_errors(&parsed),
        },
        401 | 403 => ApiError::Auth { status, message },
        500..=599 => ApiError::ServerFault { status, message },
        _ => ApiError::Unknown {
            status: Some(status),
            message,
        },
    }
}

/// Classify a 2xx response whose body could not be decoded.
pub fn classify_decode(status: u16, error: &serde_json::Error) -> ApiError {
    tracing::debug!(status, error = %error, "Response body did not match the expected shape");
    ApiError::Unknown {
        status: Some(status),
        message: UNKNOWN_MESSAGE.to_string(),
    }
}

pub fn fallback_message(status: u16) -> &'static str {
    match status {
        400 => "The request was invalid.",
        401 => "Your session has expired. Please log in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "The request conflicts with the current state.",
        422 => "Some of the submitted information is invalid.",
        429 => "Too many requests. Please slow down and try again.",
        500..=599 => "The server encountered an error. Please try again later.",
        _ => UNKNOWN_MESSAGE,
    }
}
