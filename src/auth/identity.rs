// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated identity representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::principal::Principal;

/// The authentication mechanism an identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Redirect/popup delegation from an external identity issuer
    DelegatedIdentity,
    /// In-browser wallet extension
    BrowserWallet,
    /// Injected external chain wallet
    ChainWallet,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::DelegatedIdentity,
        ProviderKind::BrowserWallet,
        ProviderKind::ChainWallet,
    ];

    /// Parse a provider kind from string (case-insensitive).
    pub fn parse(s: &str) -> Option<ProviderKind> {
        match s.to_ascii_lowercase().as_str() {
            "delegated_identity" | "internet_identity" => Some(ProviderKind::DelegatedIdentity),
            "browser_wallet" | "plug" => Some(ProviderKind::BrowserWallet),
            "chain_wallet" | "metamask" => Some(ProviderKind::ChainWallet),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::DelegatedIdentity => write!(f, "delegated_identity"),
            ProviderKind::BrowserWallet => write!(f, "browser_wallet"),
            ProviderKind::ChainWallet => write!(f, "chain_wallet"),
        }
    }
}

/// Proof material backing an identity. Used by transports to authorize calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// A verified delegation token from the identity issuer
    Delegation {
        token: String,
        expires_at: DateTime<Utc>,
    },
    /// Public key the wallet extension signs with
    WalletKey { public_key_der: Vec<u8> },
    /// Checksummed chain account address
    ChainAccount { address: String },
}

/// Authenticated caller identity.
///
/// Created on successful login and immutable for the lifetime of the
/// session; a new login produces a new `Identity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    principal: Principal,
    provider: ProviderKind,
    credential: Credential,
}

impl Identity {
    pub fn new(principal: Principal, provider: ProviderKind, credential: Credential) -> Self {
        Self {
            principal,
            provider,
            credential,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Stable textual principal id.
    pub fn principal_id(&self) -> String {
        self.principal.to_text()
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Bearer token to attach to remote calls, if the credential has one.
    pub fn bearer_token(&self) -> Option<&str> {
        match &self.credential {
            Credential::Delegation { token, .. } => Some(token),
            _ => None,
        }
    }
}
