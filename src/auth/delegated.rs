// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Delegated identity provider.
//!
//! ## Login Flow
//!
//! 1. The host opens the identity issuer (redirect or popup) through a
//!    [`DelegationIssuer`]
//! 2. The issuer returns a signed delegation token
//! 3. The token is verified against a [`KeySource`]:
//!    - signature, `exp`, `nbf`, `iss`
//!    - root public key → caller principal
//! 4. The verified token is kept in a [`DelegationStore`] so a later start of
//!    the client can resume silently while it is unexpired

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use tracing::{debug, info, warn};
use url::Url;

use super::claims::DelegationClaims;
use super::error::AuthError;
use super::identity::{Identity, ProviderKind};
use super::jwks::KeySource;
use super::provider::CredentialProvider;

/// Clock skew tolerance for delegation expiry checks, in seconds.
const LEEWAY_SECS: u64 = 60;

/// Host-side half of the delegation flow (the redirect or popup).
#[async_trait]
pub trait DelegationIssuer: Send + Sync {
    /// Open the issuer at `identity_provider` and wait for a signed
    /// delegation token. Dismissal resolves to `Err(UserCancelled)`.
    async fn authorize(&self, identity_provider: &Url) -> Result<String, AuthError>;
}

/// Where a verified delegation token survives between client starts.
pub trait DelegationStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// Process-local delegation store.
#[derive(Default)]
pub struct MemoryDelegationStore {
    token: Mutex<Option<String>>,
}

impl MemoryDelegationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelegationStore for MemoryDelegationStore {
    fn load(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Credential provider backed by an external delegated-identity issuer.
pub struct DelegatedIdentityProvider {
    identity_provider: Url,
    expected_issuer: String,
    issuer: Arc<dyn DelegationIssuer>,
    keys: Arc<dyn KeySource>,
    store: Arc<dyn DelegationStore>,
}

impl DelegatedIdentityProvider {
    pub fn new(
        identity_provider: Url,
        expected_issuer: impl Into<String>,
        issuer: Arc<dyn DelegationIssuer>,
        keys: Arc<dyn KeySource>,
    ) -> Self {
        Self {
            identity_provider,
            expected_issuer: expected_issuer.into(),
            issuer,
            keys,
            store: Arc::new(MemoryDelegationStore::new()),
        }
    }

    /// Use a host-provided store instead of the process-local one.
    pub fn with_store(mut self, store: Arc<dyn DelegationStore>) -> Self {
        self.store = store;
        self
    }

    /// Verify a delegation token and build the identity it grants.
    pub async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidCredential(format!("malformed delegation: {e}")))?;
        let (key, algorithm) = self.keys.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[self.expected_issuer.as_str()]);
        validation.leeway = LEEWAY_SECS;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        let data = decode::<DelegationClaims>(token, &key, &validation).map_err(map_jwt_error)?;
        data.claims.into_identity(token)
    }
}

#[async_trait]
impl CredentialProvider for DelegatedIdentityProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DelegatedIdentity
    }

    async fn login(&self) -> Result<Identity, AuthError> {
        let token = self.issuer.authorize(&self.identity_provider).await?;
        let identity = self.verify(&token).await?;
        self.store.save(&token);

        info!(principal = %identity.principal(), "Delegation verified");
        Ok(identity)
    }

    fn supports_silent_resume(&self) -> bool {
        true
    }

    async fn resume(&self) -> Result<Option<Identity>, AuthError> {
        let Some(token) = self.store.load() else {
            debug!("No stored delegation to resume");
            return Ok(None);
        };

        match self.verify(&token).await {
            Ok(identity) => Ok(Some(identity)),
            // Keys unreachable: keep the delegation, it may still be valid.
            Err(err @ AuthError::KeyFetch(_)) => Err(err),
            Err(err) => {
                warn!(error = %err, "Stored delegation is no longer valid, discarding");
                self.store.clear();
                Ok(None)
            }
        }
    }

    async fn logout(&self) {
        self.store.clear();
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    let reason = match err.kind() {
        ErrorKind::ExpiredSignature => "delegation has expired".to_string(),
        ErrorKind::ImmatureSignature => "delegation is not yet valid".to_string(),
        ErrorKind::InvalidSignature => "delegation signature is invalid".to_string(),
        ErrorKind::InvalidIssuer => "delegation was issued by an unexpected issuer".to_string(),
        _ => format!("delegation rejected: {err}"),
    };
    AuthError::InvalidCredential(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::StaticKeySource;
    use crate::auth::principal::Principal;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"delegation-test-secret";
    const ISSUER: &str = "https://identity.ic0.app";
    const ROOT_KEY_HEX: &str = "302a300506032b6570032100aabbccdd";

    fn claims(exp_offset: i64) -> DelegationClaims {
        let now = chrono::Utc::now().timestamp();
        DelegationClaims {
            sub: "anchor-10042".into(),
            iss: ISSUER.into(),
            iat: now,
            exp: now + exp_offset,
            nbf: None,
            sid: None,
            pubkey: ROOT_KEY_HEX.into(),
        }
    }

    fn sign(claims: &DelegationClaims) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    /// Issuer that hands out a fixed result.
    struct FixedIssuer(Result<String, AuthError>);

    #[async_trait]
    impl DelegationIssuer for FixedIssuer {
        async fn authorize(&self, _identity_provider: &Url) -> Result<String, AuthError> {
            self.0.clone()
        }
    }

    fn provider(issued: Result<String, AuthError>) -> DelegatedIdentityProvider {
        DelegatedIdentityProvider::new(
            Url::parse("https://identity.ic0.app/").unwrap(),
            ISSUER,
            Arc::new(FixedIssuer(issued)),
            Arc::new(StaticKeySource::from_secret(SECRET)),
        )
    }

    fn expected_principal() -> Principal {
        let key = data_encoding::HEXLOWER.decode(ROOT_KEY_HEX.as_bytes()).unwrap();
        Principal::self_authenticating(&key)
    }

    #[tokio::test]
    async fn login_verifies_and_stores_delegation() {
        let token = sign(&claims(3600));
        let provider = provider(Ok(token.clone()));

        let identity = provider.login().await.unwrap();
        assert_eq!(identity.principal(), &expected_principal());
        assert_eq!(provider.store.load(), Some(token));
    }

    #[tokio::test]
    async fn cancellation_passes_through() {
        let provider = provider(Err(AuthError::UserCancelled));
        assert_eq!(provider.login().await, Err(AuthError::UserCancelled));
        assert!(provider.store.load().is_none());
    }

    #[tokio::test]
    async fn rejects_wrong_issuer_and_bad_signature() {
        let mut foreign = claims(3600);
        foreign.iss = "https://evil.example".into();
        let wrong_issuer = provider(Ok(sign(&foreign)));
        assert!(matches!(
            wrong_issuer.login().await,
            Err(AuthError::InvalidCredential(_))
        ));

        let forged = encode(
            &Header::default(),
            &claims(3600),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();
        assert!(matches!(
            provider(Ok(forged)).login().await,
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[tokio::test]
    async fn resume_uses_stored_delegation() {
        let provider = provider(Err(AuthError::UserCancelled));
        assert_eq!(provider.resume().await, Ok(None));

        provider.store.save(&sign(&claims(3600)));
        let resumed = provider.resume().await.unwrap().unwrap();
        assert_eq!(resumed.principal(), &expected_principal());
    }

    #[tokio::test]
    async fn expired_delegation_is_discarded_on_resume() {
        let provider = provider(Err(AuthError::UserCancelled));
        provider.store.save(&sign(&claims(-2 * LEEWAY_SECS as i64)));

        assert_eq!(provider.resume().await, Ok(None));
        assert!(provider.store.load().is_none());
    }

    #[tokio::test]
    async fn logout_forgets_delegation() {
        let provider = provider(Ok(sign(&claims(3600))));
        provider.login().await.unwrap();
        provider.logout().await;
        assert_eq!(provider.resume().await, Ok(None));
    }
}
