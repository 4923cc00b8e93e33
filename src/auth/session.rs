// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Manager
//!
//! Owns the authenticated-user record and mediates every session transition.
//!
//! ## States
//!
//! ```text
//! Initializing ──bootstrap──► Authenticated
//!       │                        ▲     │
//!       └──────bootstrap──► Unauthenticated
//!                       login/register │ logout
//! ```
//!
//! `is_loading` is true only until the first bootstrap settles. Later calls
//! to [`SessionManager::bootstrap`] re-check the stored token without
//! flipping back to loading.
//!
//! State is published through a `tokio::sync::watch` channel: observers call
//! [`SessionManager::subscribe`] and read snapshots from the receiver.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{Token, TokenStore};
use crate::api::AuthApi;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::{
    AuthResponse, LoginRequest, RegisterRequest, RegisterWithKycRequest, ResetPasswordRequest,
    UpdateProfileRequest, User,
};

const SESSION_SAVE_FAILED: &str = "Could not save your session. Please try again.";
const MISSING_TOKEN: &str = "The server did not return a session token.";

/// Coarse lifecycle position derived from a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// Observable session record.
///
/// `is_authenticated` implies `user` is present and a token was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Session {
    pub fn initializing() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Initializing
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        }
    }

    fn authenticate(&mut self, user: User) {
        self.user = Some(user);
        self.is_authenticated = true;
        self.is_loading = false;
        self.error = None;
    }

    fn sign_out(&mut self, error: Option<String>) {
        self.user = None;
        self.is_authenticated = false;
        self.is_loading = false;
        self.error = error;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initializing()
    }
}

/// Session state machine over [`AuthApi`] and [`TokenStore`].
#[derive(Clone)]
pub struct SessionManager {
    auth: AuthApi,
    tokens: TokenStore,
    state: Arc<watch::Sender<Session>>,
}

impl SessionManager {
    /// Manager sharing the client's token store.
    pub fn new(http: HttpClient) -> Self {
        let tokens = http.tokens().clone();
        Self {
            auth: AuthApi::new(http),
            tokens,
            state: Arc::new(watch::Sender::new(Session::initializing())),
        }
    }

    /// Snapshot of the current session.
    pub fn state(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Reconcile the stored token with the server.
    ///
    /// - no token: `Unauthenticated`, no request is made
    /// - verified: `Authenticated` with the returned user
    /// - `Auth` failure: token cleared, `Unauthenticated`
    ///
    /// A login or logout that lands while the check is in flight wins: the
    /// outcome for the superseded token is discarded.
    /// - any other failure: `Unauthenticated`, token kept, `error` set
    pub async fn bootstrap(&self) -> SessionPhase {
        let Some(token) = self.tokens.get() else {
            debug!("Session bootstrap: no stored token");
            self.state.send_modify(|s| s.sign_out(None));
            return SessionPhase::Unauthenticated;
        };

        match self.auth.verify().await {
            Ok(user) => {
                // A logout or re-login while verifying owns the session now.
                if self.tokens.get().as_ref() != Some(&token) {
                    debug!("Session bootstrap: token changed while verifying, result discarded");
                    return self.phase();
                }
                self.remember_role(&user);
                info!(user_id = %user.id, role = %user.role, "Session restored");
                self.state.send_modify(|s| s.authenticate(user));
                SessionPhase::Authenticated
            }
            Err(e) if e.is_auth() => {
                if !self.tokens.clear_if(&token) {
                    debug!("Session bootstrap: rejected token already replaced, result discarded");
                    return self.phase();
                }
                info!(status = ?e.status(), "Stored session rejected, signing out");
                self.state.send_modify(|s| s.sign_out(None));
                SessionPhase::Unauthenticated
            }
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "Session bootstrap failed, keeping stored token");
                let message = e.message().to_string();
                self.state.send_modify(|s| s.sign_out(Some(message)));
                SessionPhase::Unauthenticated
            }
        }
    }

    /// Authenticate with email and password.
    ///
    /// On failure `error` is set and the error is returned; authentication
    /// state and the stored token are left as they were.
    pub async fn login(&self, request: LoginRequest) -> Result<User, ApiError> {
        match self.auth.login(&request).await {
            Ok(response) => self.establish(response),
            Err(e) => Err(self.record(e)),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ApiError> {
        match self.auth.register(&request).await {
            Ok(response) => self.establish(response),
            Err(e) => Err(self.record(e)),
        }
    }

    pub async fn register_with_kyc(
        &self,
        request: RegisterWithKycRequest,
    ) -> Result<User, ApiError> {
        match self.auth.register_with_kyc(&request).await {
            Ok(response) => self.establish(response),
            Err(e) => Err(self.record(e)),
        }
    }

    /// Drop the session. Idempotent; cannot fail.
    pub fn logout(&self) {
        self.tokens.clear();
        self.state.send_modify(|s| s.sign_out(None));
        info!("Signed out");
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Request a password-reset email. Returns the server's acknowledgement.
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        match self.auth.forgot_password(email).await {
            Ok(ack) => Ok(ack.message),
            Err(e) => Err(self.record(e)),
        }
    }

    pub async fn reset_password(
        &self,
        reset_token: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let request = ResetPasswordRequest {
            token: reset_token.to_string(),
            password: password.to_string(),
        };
        match self.auth.reset_password(&request).await {
            Ok(ack) => Ok(ack.message),
            Err(e) => Err(self.record(e)),
        }
    }

    /// Update the profile and replace the session's user with the result.
    pub async fn update_profile(&self, request: UpdateProfileRequest) -> Result<User, ApiError> {
        match self.auth.update_profile(&request).await {
            Ok(user) => {
                self.replace_user(&user);
                Ok(user)
            }
            Err(e) => Err(self.record_checked(e)),
        }
    }

    /// Reload the profile into the session.
    pub async fn refresh_profile(&self) -> Result<User, ApiError> {
        match self.auth.profile().await {
            Ok(user) => {
                self.replace_user(&user);
                Ok(user)
            }
            Err(e) => Err(self.record_checked(e)),
        }
    }

    fn establish(&self, response: AuthResponse) -> Result<User, ApiError> {
        let AuthResponse { token, user } = response;
        if token.trim().is_empty() {
            error!(user_id = %user.id, "Authentication response carried no token");
            return Err(self.record(ApiError::unknown(MISSING_TOKEN)));
        }

        if let Err(e) = self.tokens.set(&Token::new(token)) {
            error!(error = %e, "Failed to persist session token");
            return Err(self.record(ApiError::unknown(SESSION_SAVE_FAILED)));
        }
        self.remember_role(&user);

        info!(user_id = %user.id, role = %user.role, "Signed in");
        self.state.send_modify(|s| s.authenticate(user.clone()));
        Ok(user)
    }

    fn remember_role(&self, user: &User) {
        if let Err(e) = self.tokens.set_role(user.role) {
            warn!(error = %e, "Failed to persist role marker");
        }
    }

    fn replace_user(&self, user: &User) {
        self.state.send_if_modified(|s| {
            if !s.is_authenticated {
                return false;
            }
            s.user = Some(user.clone());
            s.error = None;
            true
        });
    }

    /// Store the error message in the session and hand the error back.
    fn record(&self, error: ApiError) -> ApiError {
        let message = error.message().to_string();
        self.state.send_modify(|s| s.error = Some(message));
        error
    }

    /// Like [`record`](Self::record), but an `Auth` failure that evicted the
    /// stored token also ends the session.
    fn record_checked(&self, error: ApiError) -> ApiError {
        if error.is_auth() && self.tokens.get().is_none() {
            info!(status = ?error.status(), "Session rejected by the server, signing out");
            let message = error.message().to_string();
            self.state.send_modify(|s| s.sign_out(Some(message)));
            return error;
        }
        self.record(error)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::{LOGIN_PATH, PROFILE_PATH, REGISTER_KYC_PATH, VERIFY_PATH};
    use crate::auth::Role;
    use crate::error::ErrorKind;
    use crate::http::{Method, TransportError};
    use crate::test_utils::{gate, kyc_submission, test_client, user_json, FakeTransport, Reply};
    use serde_json::json;
    use std::sync::Arc;

    fn manager(transport: &Arc<FakeTransport>) -> SessionManager {
        SessionManager::new(test_client(transport, TokenStore::in_memory()))
    }

    fn credentials() -> LoginRequest {
        LoginRequest::new("u1@rewards.test", "correct horse")
    }

    #[test]
    fn starts_initializing() {
        let session = Session::initializing();
        assert_eq!(session.phase(), SessionPhase::Initializing);
        assert!(session.is_loading);
        assert!(!session.is_authenticated);
    }

    #[tokio::test]
    async fn login_with_valid_credentials() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Post,
            LOGIN_PATH,
            Reply::ok(json!({ "token": "tok-1", "user": user_json("u1", "admin") })),
        );
        let session = manager(&transport);

        let user = session.login(credentials()).await.unwrap();

        assert_eq!(user.id, "u1");
        let state = session.state();
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.user.unwrap().id, "u1");
        assert_eq!(session.tokens().get(), Some(Token::new("tok-1")));
        assert_eq!(session.tokens().role(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn login_with_invalid_credentials() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Post,
            LOGIN_PATH,
            Reply::json(401, json!({ "message": "Invalid email or password" })),
        );
        let session = manager(&transport);
        session.tokens().set(&Token::new("prior")).unwrap();

        let error = session.login(credentials()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Auth);
        let state = session.state();
        assert!(!state.is_authenticated);
        assert_eq!(state.error.as_deref(), Some("Invalid email or password"));
        assert_eq!(session.tokens().get(), Some(Token::new("prior")));
    }

    #[tokio::test]
    async fn logout_twice_is_stable() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Post,
            LOGIN_PATH,
            Reply::ok(json!({ "token": "tok-1", "user": user_json("u1", "user") })),
        );
        let session = manager(&transport);
        session.login(credentials()).await.unwrap();

        session.logout();
        let first = session.state();
        session.logout();
        let second = session.state();

        assert_eq!(first, second);
        assert_eq!(second.phase(), SessionPhase::Unauthenticated);
        assert_eq!(session.tokens().get(), None);
        assert_eq!(session.tokens().role(), None);
    }

    #[tokio::test]
    async fn bootstrap_without_token_makes_no_request() {
        let transport = FakeTransport::new();
        let session = manager(&transport);

        assert_eq!(session.bootstrap().await, SessionPhase::Unauthenticated);
        assert!(transport.requests().is_empty());
        assert!(!session.state().is_loading);
    }

    #[tokio::test]
    async fn bootstrap_restores_a_valid_session() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Get,
            VERIFY_PATH,
            Reply::ok(json!({ "user": user_json("u2", "user") })),
        );
        let session = manager(&transport);
        session.tokens().set(&Token::new("persisted")).unwrap();

        assert_eq!(session.bootstrap().await, SessionPhase::Authenticated);
        assert_eq!(session.state().user.unwrap().id, "u2");
        assert_eq!(session.tokens().role(), Some(Role::User));
    }

    #[tokio::test]
    async fn bootstrap_auth_failure_clears_token() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Get,
            VERIFY_PATH,
            Reply::json(401, json!({ "message": "Token expired" })),
        );
        let session = manager(&transport);
        session.tokens().set(&Token::new("expired")).unwrap();

        assert_eq!(session.bootstrap().await, SessionPhase::Unauthenticated);
        assert_eq!(session.tokens().get(), None);
        assert_eq!(session.state().error, None);
    }

    #[tokio::test]
    async fn stale_rejection_after_relogin_keeps_the_new_session() {
        let transport = FakeTransport::new();
        let gate = gate();
        transport
            .on(
                Method::Post,
                LOGIN_PATH,
                Reply::ok(json!({ "token": "tok-a", "user": user_json("u1", "admin") })),
            )
            .on(
                Method::Post,
                LOGIN_PATH,
                Reply::ok(json!({ "token": "tok-b", "user": user_json("u1", "admin") })),
            )
            .on(
                Method::Get,
                "/admin/stats",
                Reply::gated(&gate, 401, json!({ "message": "Token expired" })),
            );
        let session = manager(&transport);
        let http = test_client(&transport, session.tokens().clone());
        session.login(credentials()).await.unwrap();

        let stale = tokio::spawn(async move { http.get::<serde_json::Value>("/admin/stats").await });
        transport.wait_for_calls(Method::Get, "/admin/stats", 1).await;
        assert_eq!(
            transport.last_request().unwrap().headers.get("authorization"),
            Some("Bearer tok-a")
        );

        session.logout();
        session.login(credentials()).await.unwrap();
        gate.add_permits(1);
        assert_eq!(stale.await.unwrap().status, 401);

        assert_eq!(session.tokens().get(), Some(Token::new("tok-b")));
        assert_eq!(session.tokens().role(), Some(Role::Admin));
        assert!(session.state().is_authenticated);
    }

    #[tokio::test]
    async fn bootstrap_rejection_does_not_end_a_newer_login() {
        let transport = FakeTransport::new();
        let gate = gate();
        transport
            .on(
                Method::Get,
                VERIFY_PATH,
                Reply::gated(&gate, 401, json!({ "message": "Token expired" })),
            )
            .on(
                Method::Post,
                LOGIN_PATH,
                Reply::ok(json!({ "token": "tok-b", "user": user_json("u1", "user") })),
            );
        let session = manager(&transport);
        session.tokens().set(&Token::new("tok-a")).unwrap();

        let restoring = tokio::spawn({
            let session = session.clone();
            async move { session.bootstrap().await }
        });
        transport.wait_for_calls(Method::Get, VERIFY_PATH, 1).await;
        session.login(credentials()).await.unwrap();
        gate.add_permits(1);

        assert_eq!(restoring.await.unwrap(), SessionPhase::Authenticated);
        assert_eq!(session.tokens().get(), Some(Token::new("tok-b")));
        assert!(session.state().is_authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_transient_failure_keeps_token() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Get,
            VERIFY_PATH,
            Reply::Fail(TransportError::Connect("offline".into())),
        );
        let session = manager(&transport);
        session.tokens().set(&Token::new("persisted")).unwrap();

        assert_eq!(session.bootstrap().await, SessionPhase::Unauthenticated);
        assert_eq!(session.tokens().get(), Some(Token::new("persisted")));
        assert_eq!(
            session.state().error.as_deref(),
            Some(crate::error::NETWORK_MESSAGE)
        );

        // Retrying once the network is back restores the session.
        transport
            .reset(Method::Get, VERIFY_PATH)
            .on(Method::Get, VERIFY_PATH, Reply::ok(json!({ "user": user_json("u2", "user") })));
        assert_eq!(session.bootstrap().await, SessionPhase::Authenticated);
        assert_eq!(session.state().error, None);
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Post,
            LOGIN_PATH,
            Reply::ok(json!({ "token": "tok-1", "user": user_json("u1", "user") })),
        );
        let session = manager(&transport);
        let mut rx = session.subscribe();
        assert!(rx.borrow_and_update().is_loading);

        session.login(credentials()).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated);

        session.logout();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().phase(), SessionPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn clear_error_keeps_phase() {
        let transport = FakeTransport::new();
        transport.on(Method::Post, LOGIN_PATH, Reply::json(401, json!({ "message": "Nope" })));
        let session = manager(&transport);
        session.bootstrap().await;
        let _ = session.login(credentials()).await;
        assert!(session.state().error.is_some());

        session.clear_error();
        let state = session.state();
        assert_eq!(state.error, None);
        assert_eq!(state.phase(), SessionPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn register_with_kyc_signs_in() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Post,
            REGISTER_KYC_PATH,
            Reply::json(201, json!({ "token": "tok-new", "user": user_json("u9", "user") })),
        );
        let session = manager(&transport);

        let request = RegisterWithKycRequest {
            account: RegisterRequest {
                name: "Ann Lee".into(),
                email: "u9@rewards.test".into(),
                password: "long-enough".into(),
                referral_code: None,
            },
            kyc: kyc_submission(),
        };
        session.register_with_kyc(request).await.unwrap();

        assert!(session.state().is_authenticated);
        assert_eq!(session.tokens().get(), Some(Token::new("tok-new")));
        let body = transport.last_body(Method::Post, REGISTER_KYC_PATH).unwrap();
        assert_eq!(body["email"], "u9@rewards.test");
        assert_eq!(body["kyc"]["fullName"], "Ann Lee");
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let transport = FakeTransport::new();
        transport.on(
            Method::Post,
            LOGIN_PATH,
            Reply::ok(json!({ "token": "", "user": user_json("u1", "user") })),
        );
        let session = manager(&transport);

        let error = session.login(credentials()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert!(!session.state().is_authenticated);
        assert_eq!(session.tokens().get(), None);
    }

    #[tokio::test]
    async fn profile_update_replaces_user() {
        let transport = FakeTransport::new();
        transport
            .on(
                Method::Post,
                LOGIN_PATH,
                Reply::ok(json!({ "token": "tok-1", "user": user_json("u1", "user") })),
            )
            .on(
                Method::Put,
                PROFILE_PATH,
                Reply::ok(json!({ "user": {
                    "id": "u1",
                    "email": "u1@rewards.test",
                    "name": "Renamed"
                } })),
            );
        let session = manager(&transport);
        session.login(credentials()).await.unwrap();

        session
            .update_profile(UpdateProfileRequest {
                name: Some("Renamed".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(session.state().user.unwrap().display_name(), "Renamed");
    }

    #[tokio::test]
    async fn rejected_profile_refresh_ends_the_session() {
        let transport = FakeTransport::new();
        transport
            .on(
                Method::Post,
                LOGIN_PATH,
                Reply::ok(json!({ "token": "tok-1", "user": user_json("u1", "user") })),
            )
            .on(Method::Get, PROFILE_PATH, Reply::json(401, json!({})));
        let session = manager(&transport);
        session.login(credentials()).await.unwrap();

        let error = session.refresh_profile().await.unwrap_err();

        assert!(error.is_auth());
        assert_eq!(session.tokens().get(), None);
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
    }
}
