// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification keys for delegation tokens.
//!
//! ## Security
//!
//! Issuer keys are fetched over HTTPS only. A failed reload is an error and
//! an expired snapshot is never used in its place.
//!
//! ## Usage
//!
//! Build a [`JwksManager`] from `IDENTITY_JWKS_URL` when the identity issuer
//! publishes its keys, or a [`StaticKeySource`] when the key is pinned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use super::error::AuthError;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of keys that delegation tokens are verified against.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Key for the token header's `kid`, or any usable key when absent.
    async fn decoding_key(&self, kid: Option<&str>) -> Result<(DecodingKey, Algorithm), AuthError>;
}

/// A single pinned verification key.
#[derive(Clone)]
pub struct StaticKeySource {
    key: DecodingKey,
    algorithm: Algorithm,
}

impl StaticKeySource {
    pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
        Self { key, algorithm }
    }

    /// Shared-secret (HS256) verification.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// ES256 verification with a PEM-encoded public key.
    pub fn from_ec_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_ec_pem(pem)
            .map_err(|e| AuthError::KeyFetch(format!("invalid EC public key: {e}")))?;
        Ok(Self::new(key, Algorithm::ES256))
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn decoding_key(&self, _kid: Option<&str>) -> Result<(DecodingKey, Algorithm), AuthError> {
        Ok((self.key.clone(), self.algorithm))
    }
}

/// Key set as last fetched from the issuer.
struct Snapshot {
    keys: JwkSet,
    taken: Instant,
}

impl Snapshot {
    fn fresh(&self, max_age: Duration) -> bool {
        self.taken.elapsed() < max_age
    }

    fn knows(&self, kid: &str) -> bool {
        self.keys
            .keys
            .iter()
            .any(|k| k.common.key_id.as_deref() == Some(kid))
    }
}

/// Keys published by the identity issuer at a JWKS endpoint.
///
/// The set is re-fetched once it is older than the max age, and also when a
/// token names a `kid` the snapshot does not contain, so issuer key rotation
/// is picked up without waiting for expiry.
#[derive(Clone)]
pub struct JwksManager {
    endpoint: Url,
    max_age: Duration,
    snapshot: Arc<RwLock<Option<Snapshot>>>,
    http: reqwest::Client,
}

impl JwksManager {
    pub fn new(endpoint: Url) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .https_only(true)
            .build()
            .map_err(|e| AuthError::KeyFetch(format!("key set client: {e}")))?;

        Ok(Self {
            endpoint,
            max_age: DEFAULT_CACHE_TTL,
            snapshot: Arc::new(RwLock::new(None)),
            http,
        })
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a snapshot younger than the max age is held.
    pub async fn has_fresh_keys(&self) -> bool {
        self.snapshot
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.fresh(self.max_age))
    }

    /// Cached key set when it is fresh and covers `kid`, else a new fetch.
    async fn keys_for(&self, kid: Option<&str>) -> Result<JwkSet, AuthError> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            let covers = kid.is_none_or(|kid| snapshot.knows(kid));
            if snapshot.fresh(self.max_age) && covers {
                return Ok(snapshot.keys.clone());
            }
        }
        self.reload().await
    }

    /// Fetch the key set and replace the snapshot.
    pub async fn reload(&self) -> Result<JwkSet, AuthError> {
        debug!(endpoint = %self.endpoint, "Loading issuer key set");

        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeyFetch(format!(
                "key set endpoint answered {status}"
            )));
        }
        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("malformed key set: {e}")))?;

        *self.snapshot.write().await = Some(Snapshot {
            keys: keys.clone(),
            taken: Instant::now(),
        });
        Ok(keys)
    }
}

#[async_trait]
impl KeySource for JwksManager {
    async fn decoding_key(&self, kid: Option<&str>) -> Result<(DecodingKey, Algorithm), AuthError> {
        let keys = self.keys_for(kid).await?;
        select_key(&keys, kid)
    }
}

/// Pick the key matching `kid`, or the first usable key when `kid` is absent.
fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Result<(DecodingKey, Algorithm), AuthError> {
    match kid {
        Some(kid) => {
            let jwk = jwks
                .keys
                .iter()
                .find(|k| k.common.key_id.as_deref() == Some(kid))
                .ok_or_else(|| AuthError::InvalidCredential(format!("no key with kid {kid}")))?;
            to_decoding_key(jwk)
        }
        None => jwks
            .keys
            .iter()
            .find_map(|jwk| to_decoding_key(jwk).ok())
            .ok_or_else(|| AuthError::InvalidCredential("no usable key in JWKS".to_string())),
    }
}

fn to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    let hinted = jwk.common.key_algorithm;
    let (key, algorithm) = match &jwk.algorithm {
        AlgorithmParameters::RSA(params) => (
            DecodingKey::from_rsa_components(&params.n, &params.e),
            match hinted {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            },
        ),
        AlgorithmParameters::EllipticCurve(params) => (
            DecodingKey::from_ec_components(&params.x, &params.y),
            match hinted {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            },
        ),
        _ => {
            return Err(AuthError::KeyFetch(
                "key set entry has an unsupported key type".to_string(),
            ))
        }
    };
    let key = key.map_err(|e| AuthError::KeyFetch(format!("unusable key set entry: {e}")))?;
    Ok((key, algorithm))
}
