// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Delegation token claims.

use chrono::{DateTime, TimeZone, Utc};
use data_encoding::HEXLOWER_PERMISSIVE;
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::identity::{Credential, Identity, ProviderKind};
use super::principal::Principal;

/// Claims carried by a delegation issued by the identity provider.
///
/// The delegation binds a session to the root public key of the user's
/// identity anchor; the caller's principal is derived from that key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationClaims {
    /// Subject as named by the issuer (informational)
    pub sub: String,

    /// Issuer (identity provider origin)
    pub iss: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issuer session ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Hex-encoded DER public key of the delegating identity
    pub pubkey: String,
}

impl DelegationClaims {
    /// Decode the delegating root public key.
    pub fn root_public_key(&self) -> Result<Vec<u8>, AuthError> {
        let key = HEXLOWER_PERMISSIVE
            .decode(self.pubkey.trim_start_matches("0x").as_bytes())
            .map_err(|e| AuthError::InvalidCredential(format!("pubkey is not hex: {e}")))?;
        if key.is_empty() {
            return Err(AuthError::InvalidCredential("pubkey is empty".to_string()));
        }
        Ok(key)
    }

    pub fn expires_at(&self) -> Result<DateTime<Utc>, AuthError> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidCredential("exp is out of range".to_string()))
    }

    /// Build the session identity for an already-verified delegation.
    pub fn into_identity(self, token: &str) -> Result<Identity, AuthError> {
        let principal = Principal::self_authenticating(&self.root_public_key()?);
        Ok(Identity::new(
            principal,
            ProviderKind::DelegatedIdentity,
            Credential::Delegation {
                token: token.to_string(),
                expires_at: self.expires_at()?,
            },
        ))
    }
}
