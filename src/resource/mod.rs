// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Async Resource
//!
//! [`AsyncResource<T>`] wraps a sequence of API calls with observable
//! `{data, loading, error}` state. Feature hooks own one resource per piece
//! of server data they display.
//!
//! ## Guarantees
//!
//! - A trigger sets `loading` and clears `error` before its first call.
//! - While loading, the previous `data` stays visible.
//! - On settlement exactly one of `data` (success) or `error` (failure) is
//!   written, then `loading` is cleared. A failure keeps the stale `data`.
//! - Failures are recorded *and* returned to the caller.
//! - Only the most recently issued trigger may settle state. A superseded
//!   trigger still returns its own result to its caller.
//! - After [`dispose`](AsyncResource::dispose) no settlement touches state.
//!   In-flight calls are not aborted; their results are discarded.
//! - A trigger whose future is dropped before settling clears `loading` if
//!   it is still the latest one, leaving `data` and `error` untouched.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ApiError;

/// Observable state of an [`AsyncResource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

struct Inner<T> {
    name: &'static str,
    state: watch::Sender<ResourceState<T>>,
    generation: AtomicU64,
    disposed: CancellationToken,
}

/// Shared handle to one resource. Clones observe and drive the same state.
pub struct AsyncResource<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for AsyncResource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> AsyncResource<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self::with_cancellation(name, CancellationToken::new())
    }

    /// Resource disposed when `disposed` is cancelled (typically a child
    /// token of the owning hook).
    pub fn with_cancellation(name: &'static str, disposed: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                state: watch::Sender::new(ResourceState::default()),
                generation: AtomicU64::new(0),
                disposed,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn state(&self) -> ResourceState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.inner.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    /// Whether data has been loaded at least once.
    pub fn is_loaded(&self) -> bool {
        self.inner.state.borrow().data.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.inner.state.subscribe()
    }

    /// Drive `operation` and settle state with its outcome.
    pub async fn run<F>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.is_disposed() {
            return operation.await;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let mut pending = PendingTrigger {
            inner: &*self.inner,
            generation,
            settled: false,
        };
        let result = operation.await;
        pending.settled = true;

        if self.is_disposed() {
            debug!(resource = self.inner.name, generation, "Resource disposed, result discarded");
            return result;
        }
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            debug!(resource = self.inner.name, generation, "Superseded result discarded");
            return result;
        }

        match &result {
            Ok(data) => {
                let data = data.clone();
                self.inner.state.send_modify(|s| {
                    s.data = Some(data);
                    s.error = None;
                    s.loading = false;
                });
            }
            Err(e) => {
                debug!(resource = self.inner.name, kind = ?e.kind(), error = %e, "Resource load failed");
                let message = e.message().to_string();
                self.inner.state.send_modify(|s| {
                    s.error = Some(message);
                    s.loading = false;
                });
            }
        }
        result
    }

    /// Stop applying settlements. Idempotent.
    pub fn dispose(&self) {
        self.inner.disposed.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.is_cancelled()
    }
}

/// Clears `loading` when a trigger is dropped mid-flight.
struct PendingTrigger<'a, T> {
    inner: &'a Inner<T>,
    generation: u64,
    settled: bool,
}

impl<T> Drop for PendingTrigger<'_, T> {
    fn drop(&mut self) {
        if self.settled
            || self.inner.disposed.is_cancelled()
            || self.inner.generation.load(Ordering::SeqCst) != self.generation
        {
            return;
        }
        debug!(
            resource = self.inner.name,
            generation = self.generation,
            "Trigger dropped before settling"
        );
        self.inner
            .state
            .send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }
}

impl<T> std::fmt::Debug for AsyncResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("AsyncResource")
            .field("name", &self.inner.name)
            .field("loaded", &state.data.is_some())
            .field("loading", &state.loading)
            .field("error", &state.error)
            .finish()
    }
}
