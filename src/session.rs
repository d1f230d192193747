// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Manager
//!
//! Owns the single current identity and the [`RemoteHandle`] bound to it.
//!
//! ```text
//!               begin_login                 provider ok
//!  Anonymous ───────────────► Authenticating ──────────► Authenticated
//!      ▲  ▲                        │    ▲                     │
//!      │  │        provider error  ▼    │ begin_login         │
//!      │  │                      Failed ┘                     │
//!      │  └──────────────────────────────────── logout ───────┘
//!      └── resume (no visible Authenticating)
//! ```
//!
//! ## Generations
//!
//! Every identity change bumps a generation counter. Handles remember the
//! generation they were built for; controllers check it before applying a
//! response so a reply that arrives after logout is dropped instead of
//! leaking into the next session's caches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthOutcome, Identity, ProviderKind, ProviderRegistry};
use crate::error::{ClientError, ClientResult};
use crate::gateway::{Gateway, RemoteHandle, ServiceAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Anonymous => write!(f, "anonymous"),
            SessionStatus::Authenticating => write!(f, "authenticating"),
            SessionStatus::Authenticated => write!(f, "authenticated"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    /// A login attempt with this provider is in flight.
    Authenticating(ProviderKind),
    Authenticated(Arc<Identity>),
    /// The last attempt failed; `begin_login` may be retried.
    Failed(AuthError),
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Anonymous => SessionStatus::Anonymous,
            SessionState::Authenticating(_) => SessionStatus::Authenticating,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
            SessionState::Failed(_) => SessionStatus::Failed,
        }
    }

    pub fn identity(&self) -> Option<&Arc<Identity>> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AuthError> {
        match self {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Receives the session-invalidated signal.
///
/// Called synchronously from [`SessionManager::logout`] after the generation
/// has been bumped and before the provider is told to forget its state.
pub trait SessionListener: Send + Sync {
    fn on_session_invalidated(&self, generation: u64);
}

struct Inner {
    handle: Option<Arc<RemoteHandle>>,
    attempt_in_flight: bool,
}

pub struct SessionManager {
    providers: ProviderRegistry,
    gateway: Gateway,
    service: ServiceAddress,
    login_timeout: Duration,
    inner: Mutex<Inner>,
    generation: AtomicU64,
    state: watch::Sender<SessionState>,
    listeners: Mutex<Vec<Weak<dyn SessionListener>>>,
}

/// Resets the in-flight flag if a login future is dropped before it finishes.
struct AttemptGuard<'a> {
    session: &'a SessionManager,
    armed: bool,
}

impl AttemptGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon_attempt();
        }
    }
}

impl SessionManager {
    pub fn new(
        providers: ProviderRegistry,
        gateway: Gateway,
        service: ServiceAddress,
        login_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            providers,
            gateway,
            service,
            login_timeout,
            inner: Mutex::new(Inner {
                handle: None,
                attempt_in_flight: false,
            }),
            generation: AtomicU64::new(0),
            state,
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.state.borrow().identity().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether a handle built for `generation` still belongs to this session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Handle for the current identity.
    pub fn current_handle(&self) -> ClientResult<Arc<RemoteHandle>> {
        self.lock()
            .handle
            .clone()
            .ok_or(ClientError::NotAuthenticated)
    }

    pub fn add_listener(&self, listener: Weak<dyn SessionListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Try to restore a session without user interaction.
    ///
    /// Only the delegated identity provider is consulted. The session stays
    /// `Anonymous` while the check runs and when nothing can be resumed.
    pub async fn resume(&self) -> Option<Arc<Identity>> {
        {
            let mut inner = self.lock();
            if inner.attempt_in_flight || self.status() != SessionStatus::Anonymous {
                debug!("Skipping silent resume, session is busy");
                return None;
            }
            inner.attempt_in_flight = true;
        }
        let guard = AttemptGuard {
            session: self,
            armed: true,
        };

        let provider = match self.providers.get(ProviderKind::DelegatedIdentity) {
            Ok(provider) if provider.supports_silent_resume() => provider,
            _ => {
                self.release_attempt(guard);
                return None;
            }
        };

        match tokio::time::timeout(self.login_timeout, provider.resume()).await {
            Ok(Ok(Some(identity))) => {
                let identity = self.establish(guard, identity);
                info!(principal = %identity.principal(), "Session resumed");
                Some(identity)
            }
            Ok(Ok(None)) => {
                debug!("No resumable session");
                self.release_attempt(guard);
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Silent resume failed");
                self.release_attempt(guard);
                None
            }
            Err(_) => {
                warn!("Silent resume timed out");
                self.release_attempt(guard);
                None
            }
        }
    }

    /// Run an interactive login with `kind`.
    ///
    /// Valid from `Anonymous` or `Failed`. A second call while an attempt is
    /// in flight is rejected immediately and does not affect that attempt.
    pub async fn begin_login(&self, kind: ProviderKind) -> Result<Arc<Identity>, AuthError> {
        {
            let mut inner = self.lock();
            if inner.attempt_in_flight {
                return Err(AuthError::ConcurrentLoginRejected);
            }
            match self.status() {
                SessionStatus::Authenticating => return Err(AuthError::ConcurrentLoginRejected),
                SessionStatus::Authenticated => {
                    return Err(AuthError::InvalidStateTransition(
                        "already authenticated, log out first".to_string(),
                    ))
                }
                SessionStatus::Anonymous | SessionStatus::Failed => {}
            }
            inner.attempt_in_flight = true;
            self.state.send_replace(SessionState::Authenticating(kind));
        }
        let guard = AttemptGuard {
            session: self,
            armed: true,
        };
        info!(provider = %kind, "Login started");

        let result = match self.providers.get(kind) {
            Ok(provider) => tokio::time::timeout(self.login_timeout, provider.login())
                .await
                .unwrap_or(Err(AuthError::TimedOut)),
            Err(e) => Err(e),
        };

        let outcome = AuthOutcome::from(result);
        match &outcome {
            AuthOutcome::Success(_) => {}
            AuthOutcome::Cancelled => info!(provider = %kind, "Login cancelled"),
            AuthOutcome::Unavailable(_) => warn!(provider = %kind, "Login provider unavailable"),
            AuthOutcome::Error(e) => warn!(provider = %kind, error = %e, "Login failed"),
        }

        match outcome.into_result() {
            Ok(identity) => {
                let identity = self.establish(guard, identity);
                info!(
                    provider = %kind,
                    principal = %identity.principal(),
                    "Login succeeded"
                );
                Ok(identity)
            }
            Err(e) => {
                guard.disarm();
                self.lock().attempt_in_flight = false;
                self.state.send_replace(SessionState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    /// End the session and clear every downstream cache.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let (identity, generation) = {
            let mut inner = self.lock();
            let identity = match &*self.state.borrow() {
                SessionState::Authenticated(identity) => Arc::clone(identity),
                other => {
                    return Err(AuthError::InvalidStateTransition(format!(
                        "cannot log out while {}",
                        other.status()
                    )))
                }
            };
            inner.handle = None;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.state.send_replace(SessionState::Anonymous);
            (identity, generation)
        };

        self.notify_invalidated(generation);

        if let Ok(provider) = self.providers.get(identity.provider()) {
            provider.logout().await;
        }
        info!(principal = %identity.principal(), "Logged out");
        Ok(())
    }

    fn establish(&self, guard: AttemptGuard<'_>, identity: Identity) -> Arc<Identity> {
        guard.disarm();
        let identity = Arc::new(identity);
        let mut inner = self.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        inner.handle = Some(Arc::new(self.gateway.build(
            Arc::clone(&identity),
            &self.service,
            generation,
        )));
        inner.attempt_in_flight = false;
        self.state
            .send_replace(SessionState::Authenticated(Arc::clone(&identity)));
        identity
    }

    fn release_attempt(&self, guard: AttemptGuard<'_>) {
        guard.disarm();
        self.lock().attempt_in_flight = false;
    }

    fn abandon_attempt(&self) {
        self.lock().attempt_in_flight = false;
        self.state.send_if_modified(|state| {
            if state.status() == SessionStatus::Authenticating {
                *state = SessionState::Failed(AuthError::UserCancelled);
                true
            } else {
                false
            }
        });
        debug!("Login attempt abandoned");
    }

    fn notify_invalidated(&self, generation: u64) {
        let listeners: Vec<Arc<dyn SessionListener>> = {
            let mut listeners = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in listeners {
            listener.on_session_invalidated(generation);
        }
    }
}
