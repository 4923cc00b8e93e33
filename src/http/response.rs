// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Normalized outcome of one logical request.

use crate::error::ApiError;

/// Status reported when no HTTP response was received (network failure,
/// timeout, request never sent).
pub const NO_STATUS: u16 = 0;

/// Uniform response shape.
///
/// Exactly one of `data` / `error` is populated: 2xx responses that decoded
/// carry `data`, everything else carries a classified `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub status: u16,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, status: u16) -> Self {
        Self {
            data: Some(data),
            error: None,
            status,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        let status = error.status().unwrap_or(NO_STATUS);
        Self {
            data: None,
            error: Some(error),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    /// Human-readable error message, if the request failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(ApiError::message)
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(ApiError::Unknown {
                status: Some(self.status),
                message: crate::error::UNKNOWN_MESSAGE.to_string(),
            }),
        }
    }
}
