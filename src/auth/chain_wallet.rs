// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External chain wallet providers.
//!
//! The caller principal for a chain account is derived from the account
//! address, so the same account maps to the same principal regardless of
//! which wallet software exposes it.

use std::sync::Arc;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::info;

use super::error::AuthError;
use super::identity::{Credential, Identity, ProviderKind};
use super::principal::Principal;
use super::provider::CredentialProvider;

/// Derivation domain for chain account principals.
pub const CHAIN_WALLET_DOMAIN: &str = "chain-wallet";

/// Bridge to an injected chain wallet (`eth_requestAccounts`).
#[async_trait]
pub trait InjectedChainProvider: Send + Sync {
    /// Ask the wallet to expose its accounts. An empty list means the
    /// user declined.
    async fn request_accounts(&self) -> Result<Vec<String>, AuthError>;
}

/// Identity for a chain account address.
pub fn chain_identity(address: Address) -> Result<Identity, AuthError> {
    let principal = Principal::derived(CHAIN_WALLET_DOMAIN, address.as_slice())
        .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
    Ok(Identity::new(
        principal,
        ProviderKind::ChainWallet,
        Credential::ChainAccount {
            address: address.to_checksum(None),
        },
    ))
}

/// Credential provider for an injected chain wallet.
pub struct ChainWalletProvider {
    wallet: Option<Arc<dyn InjectedChainProvider>>,
}

impl ChainWalletProvider {
    pub fn new(wallet: Option<Arc<dyn InjectedChainProvider>>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl CredentialProvider for ChainWalletProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ChainWallet
    }

    async fn login(&self) -> Result<Identity, AuthError> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or(AuthError::ProviderUnavailable(ProviderKind::ChainWallet))?;

        let accounts = wallet.request_accounts().await?;
        let first = accounts.first().ok_or(AuthError::UserCancelled)?;
        let address: Address = first
            .parse()
            .map_err(|e| AuthError::InvalidCredential(format!("invalid account {first}: {e}")))?;

        let identity = chain_identity(address)?;
        info!(
            address = %address,
            principal = %identity.principal(),
            "Chain wallet connected"
        );
        Ok(identity)
    }
}

/// Chain wallet backed by a locally held key, for headless hosts.
pub struct LocalKeyChainProvider {
    signer: PrivateKeySigner,
}

impl LocalKeyChainProvider {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, AuthError> {
        Ok(Self::new(super::signing::signer_from_pem(pem_bytes)?))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl CredentialProvider for LocalKeyChainProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ChainWallet
    }

    async fn login(&self) -> Result<Identity, AuthError> {
        chain_identity(self.signer.address())
    }
}
