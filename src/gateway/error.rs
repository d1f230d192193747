// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote call failures.

/// Failure of a single remote operation.
///
/// The gateway never retries; the calling controller decides what to do.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The service could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the configured call timeout.
    #[error("Remote call timed out")]
    Timeout,

    /// The service answered with an error.
    #[error("Remote service rejected the call ({code}): {message}")]
    RemoteRejected { code: String, message: String },

    /// The response did not have the expected shape.
    #[error("Malformed remote response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::RemoteRejected {
            code: code.into(),
            message: message.into(),
        }
    }
}
