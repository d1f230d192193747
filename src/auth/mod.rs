// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential providers that turn a user interaction into an [`Identity`].
//!
//! ## Providers
//!
//! - [`DelegatedIdentityProvider`]: redirect/popup delegation from an
//!   external identity issuer, verified against JWKS or a pinned key
//! - [`BrowserWalletProvider`]: in-browser wallet extension
//! - [`ChainWalletProvider`]: injected chain wallet; [`LocalKeyChainProvider`]
//!   for hosts that hold the account key themselves
//!
//! ## Security
//!
//! - Delegations are verified for signature, expiry, not-before and issuer
//! - JWKS is fetched over HTTPS only and cached with a TTL
//! - Clock skew tolerance is 60 seconds

pub mod browser_wallet;
pub mod chain_wallet;
pub mod claims;
pub mod delegated;
pub mod error;
pub mod identity;
pub mod jwks;
pub mod principal;
pub mod provider;
pub mod signing;

pub use browser_wallet::{BrowserWalletProvider, WalletConnection, WalletExtension};
pub use chain_wallet::{ChainWalletProvider, InjectedChainProvider, LocalKeyChainProvider};
pub use delegated::{
    DelegatedIdentityProvider, DelegationIssuer, DelegationStore, MemoryDelegationStore,
};
pub use error::{AuthError, AuthOutcome};
pub use identity::{Credential, Identity, ProviderKind};
pub use jwks::{JwksManager, KeySource, StaticKeySource};
pub use principal::{Principal, PrincipalError};
pub use provider::{CredentialProvider, ProviderRegistry};
