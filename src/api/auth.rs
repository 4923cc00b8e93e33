// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: login, registration, identity check, password reset
//! and profile.
//!
//! Login, registration and the password-reset pair are sent without a
//! bearer credential so a stale stored token can neither leak to them nor be
//! evicted by their 401 responses.

use serde::Deserialize;

use super::acknowledge;
use crate::error::ApiError;
use crate::http::{HttpClient, RequestOptions};
use crate::models::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    RegisterWithKycRequest, ResetPasswordRequest, UpdateProfileRequest, User, VerifyResponse,
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const REGISTER_KYC_PATH: &str = "/auth/register-kyc";
pub const VERIFY_PATH: &str = "/auth/verify";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
pub const PROFILE_PATH: &str = "/users/profile";

/// Profile endpoints answer with either `{"user": {...}}` or the bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: User },
    Bare(User),
}

impl From<UserEnvelope> for User {
    fn from(envelope: UserEnvelope) -> Self {
        match envelope {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.http
            .request(RequestOptions::post(LOGIN_PATH).json(request).anonymous())
            .await
            .into_result()
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.http
            .request(RequestOptions::post(REGISTER_PATH).json(request).anonymous())
            .await
            .into_result()
    }

    pub async fn register_with_kyc(
        &self,
        request: &RegisterWithKycRequest,
    ) -> Result<AuthResponse, ApiError> {
        self.http
            .request(RequestOptions::post(REGISTER_KYC_PATH).json(request).anonymous())
            .await
            .into_result()
    }

    /// Resolve the user owning the stored token.
    pub async fn verify(&self) -> Result<User, ApiError> {
        self.http
            .get::<VerifyResponse>(VERIFY_PATH)
            .await
            .into_result()
            .map(|body| body.user)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        acknowledge(
            &self.http,
            RequestOptions::post(FORGOT_PASSWORD_PATH).json(&body).anonymous(),
        )
        .await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        acknowledge(
            &self.http,
            RequestOptions::post(RESET_PASSWORD_PATH)
                .json(request)
                .anonymous(),
        )
        .await
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        self.http
            .get::<UserEnvelope>(PROFILE_PATH)
            .await
            .into_result()
            .map(User::from)
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<User, ApiError> {
        self.http
            .put::<_, UserEnvelope>(PROFILE_PATH, request)
            .await
            .into_result()
            .map(User::from)
    }
}
