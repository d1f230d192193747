// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Browser wallet extension provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::error::AuthError;
use super::identity::{Credential, Identity, ProviderKind};
use super::principal::Principal;
use super::provider::CredentialProvider;

/// Connection granted by the wallet extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    /// DER-encoded public key the wallet signs calls with
    pub public_key_der: Vec<u8>,
}

/// Bridge to an in-browser wallet extension.
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Ask the user to connect the wallet for the whitelisted services.
    async fn request_connect(&self, whitelist: &[String]) -> Result<WalletConnection, AuthError>;

    async fn disconnect(&self) {}
}

/// Credential provider for a browser wallet extension.
///
/// `extension` is `None` when the extension is not installed.
pub struct BrowserWalletProvider {
    extension: Option<Arc<dyn WalletExtension>>,
    whitelist: Vec<String>,
}

impl BrowserWalletProvider {
    pub fn new(extension: Option<Arc<dyn WalletExtension>>, whitelist: Vec<String>) -> Self {
        Self {
            extension,
            whitelist,
        }
    }
}

#[async_trait]
impl CredentialProvider for BrowserWalletProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::BrowserWallet
    }

    async fn login(&self) -> Result<Identity, AuthError> {
        let extension = self
            .extension
            .as_ref()
            .ok_or(AuthError::ProviderUnavailable(ProviderKind::BrowserWallet))?;

        let connection = extension.request_connect(&self.whitelist).await?;
        if connection.public_key_der.is_empty() {
            return Err(AuthError::InvalidCredential(
                "wallet returned an empty public key".to_string(),
            ));
        }

        let principal = Principal::self_authenticating(&connection.public_key_der);
        info!(principal = %principal, "Browser wallet connected");

        Ok(Identity::new(
            principal,
            ProviderKind::BrowserWallet,
            Credential::WalletKey {
                public_key_der: connection.public_key_der,
            },
        ))
    }

    async fn logout(&self) {
        if let Some(extension) = &self.extension {
            extension.disconnect().await;
        }
    }
}
