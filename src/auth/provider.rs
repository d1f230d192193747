// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential provider capability and registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::AuthError;
use super::identity::{Identity, ProviderKind};

/// Uniform capability over one authentication mechanism.
///
/// Implementations never surface user cancellation as anything other than
/// `Err(AuthError::UserCancelled)`.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// The mechanism this provider implements.
    fn kind(&self) -> ProviderKind;

    /// Run the interactive login flow.
    async fn login(&self) -> Result<Identity, AuthError>;

    /// Whether [`CredentialProvider::resume`] can restore a session without
    /// user interaction.
    fn supports_silent_resume(&self) -> bool {
        false
    }

    /// Restore a previously authenticated session, if one exists.
    ///
    /// `Ok(None)` means there is nothing to resume.
    async fn resume(&self) -> Result<Option<Identity>, AuthError> {
        Ok(None)
    }

    /// Forget any provider-side session state (stored delegations,
    /// wallet connections).
    async fn logout(&self) {}
}

/// The set of providers available to a session, at most one per kind.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn CredentialProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any earlier one of the same kind.
    pub fn with(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn CredentialProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// Look up the provider for `kind`.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn CredentialProvider>, AuthError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(AuthError::ProviderUnavailable(kind))
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }
}
