// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client error taxonomy.
//!
//! Every failure surfaced to the presentation layer is a [`ClientError`].
//! Authentication failures keep their own [`AuthError`] type and gateway
//! failures their [`GatewayError`]; both convert into `ClientError` so
//! workflow code can use `?` across the seams.

use crate::auth::AuthError;
use crate::gateway::GatewayError;
use crate::models::DocType;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Local pre-flight validation failed; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote call timed out")]
    Timeout,

    #[error("Remote service rejected the call ({code}): {message}")]
    RemoteRejected { code: String, message: String },

    #[error("Malformed remote response: {0}")]
    Decode(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("No staged document of type {0}")]
    MissingDocument(DocType),

    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session that issued the call was invalidated before the response
    /// arrived; the response was dropped.
    #[error("Session changed while the call was in flight")]
    StaleSession,
}

impl ClientError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => "validation_error",
            ClientError::Auth(e) => e.error_code(),
            ClientError::Network(_) => "network_error",
            ClientError::Timeout => "timeout",
            ClientError::RemoteRejected { .. } => "remote_rejected",
            ClientError::Decode(_) => "decode_error",
            ClientError::InvalidStateTransition(_) => "invalid_state_transition",
            ClientError::MissingDocument(_) => "missing_document",
            ClientError::NotAuthenticated => "not_authenticated",
            ClientError::StaleSession => "stale_session",
        }
    }
}

impl From<GatewayError> for ClientError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(msg) => ClientError::Network(msg),
            GatewayError::Timeout => ClientError::Timeout,
            GatewayError::RemoteRejected { code, message } => {
                ClientError::RemoteRejected { code, message }
            }
            GatewayError::Decode(msg) => ClientError::Decode(msg),
        }
    }
}
