// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors and login outcomes.

use super::identity::{Identity, ProviderKind};

/// Authentication error type.
///
/// Returned by credential providers and by the session manager. A failed
/// attempt moves the session to `Failed` with one of these stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider is not installed, injected or registered
    ProviderUnavailable(ProviderKind),
    /// The user dismissed or declined the login flow
    UserCancelled,
    /// Another authentication attempt is already in flight
    ConcurrentLoginRejected,
    /// The provider returned a credential that failed verification
    InvalidCredential(String),
    /// Verification keys could not be fetched
    KeyFetch(String),
    /// The provider did not answer within the login timeout
    TimedOut,
    /// The requested operation is not valid in the current session state
    InvalidStateTransition(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::UserCancelled => "user_cancelled",
            AuthError::ConcurrentLoginRejected => "concurrent_login_rejected",
            AuthError::InvalidCredential(_) => "invalid_credential",
            AuthError::KeyFetch(_) => "key_fetch_error",
            AuthError::TimedOut => "login_timeout",
            AuthError::InvalidStateTransition(_) => "invalid_state_transition",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::ProviderUnavailable(kind) => write!(f, "{kind} provider is not available"),
            AuthError::UserCancelled => write!(f, "Login was cancelled by the user"),
            AuthError::ConcurrentLoginRejected => {
                write!(f, "Another login attempt is already in progress")
            }
            AuthError::InvalidCredential(msg) => write!(f, "Credential rejected: {msg}"),
            AuthError::KeyFetch(msg) => write!(f, "Failed to fetch verification keys: {msg}"),
            AuthError::TimedOut => write!(f, "Login timed out"),
            AuthError::InvalidStateTransition(msg) => write!(f, "Invalid session transition: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Provider-independent result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(Identity),
    Cancelled,
    Unavailable(ProviderKind),
    Error(AuthError),
}

impl AuthOutcome {
    /// Collapse back into the `Result` form providers return.
    pub fn into_result(self) -> Result<Identity, AuthError> {
        match self {
            AuthOutcome::Success(identity) => Ok(identity),
            AuthOutcome::Cancelled => Err(AuthError::UserCancelled),
            AuthOutcome::Unavailable(kind) => Err(AuthError::ProviderUnavailable(kind)),
            AuthOutcome::Error(err) => Err(err),
        }
    }
}

impl From<Result<Identity, AuthError>> for AuthOutcome {
    fn from(result: Result<Identity, AuthError>) -> Self {
        match result {
            Ok(identity) => AuthOutcome::Success(identity),
            Err(AuthError::UserCancelled) => AuthOutcome::Cancelled,
            Err(AuthError::ProviderUnavailable(kind)) => AuthOutcome::Unavailable(kind),
            Err(err) => AuthOutcome::Error(err),
        }
    }
}
