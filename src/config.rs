// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the client. Configuration is loaded from the environment once,
//! when the client is constructed.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `INSURANCE_SERVICE_URL` | Base URL of the replica hosting the service | `http://127.0.0.1:4943/` |
//! | `INSURANCE_SERVICE_ID` | Identifier of the insurance service | `bkyz2-fmaaa-aaaaa-qaaaq-cai` |
//! | `IDENTITY_PROVIDER_URL` | Delegated identity issuer login page | `https://identity.ic0.app/` |
//! | `IDENTITY_JWKS_URL` | Issuer JWKS endpoint for delegation verification | Optional |
//! | `IDENTITY_ISSUER` | Expected delegation issuer claim | `https://identity.ic0.app` |
//! | `INSURANCE_CALL_TIMEOUT_SECS` | Per-call remote timeout | `30` |
//! | `INSURANCE_LOGIN_TIMEOUT_SECS` | Interactive login timeout | `300` |
//! | `INSURANCE_POLL_INTERVAL_SECS` | Status poller interval | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use url::Url;

use crate::gateway::ServiceAddress;

/// Environment variable name for the service base URL.
pub const SERVICE_URL_ENV: &str = "INSURANCE_SERVICE_URL";

/// Environment variable name for the service identifier.
pub const SERVICE_ID_ENV: &str = "INSURANCE_SERVICE_ID";

/// Environment variable name for the delegated identity issuer.
///
/// # Default
/// `https://identity.ic0.app/`
pub const IDENTITY_PROVIDER_URL_ENV: &str = "IDENTITY_PROVIDER_URL";

/// Environment variable name for the issuer JWKS endpoint.
///
/// When unset, the host must supply a pinned verification key.
pub const IDENTITY_JWKS_URL_ENV: &str = "IDENTITY_JWKS_URL";

/// Environment variable name for the expected delegation issuer (`iss`).
pub const IDENTITY_ISSUER_ENV: &str = "IDENTITY_ISSUER";

pub const CALL_TIMEOUT_ENV: &str = "INSURANCE_CALL_TIMEOUT_SECS";
pub const LOGIN_TIMEOUT_ENV: &str = "INSURANCE_LOGIN_TIMEOUT_SECS";
pub const POLL_INTERVAL_ENV: &str = "INSURANCE_POLL_INTERVAL_SECS";

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:4943/";
pub const DEFAULT_SERVICE_ID: &str = "bkyz2-fmaaa-aaaaa-qaaaq-cai";
pub const DEFAULT_IDENTITY_PROVIDER_URL: &str = "https://identity.ic0.app/";
pub const DEFAULT_IDENTITY_ISSUER: &str = "https://identity.ic0.app";

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub service_address: Url,
    pub service_id: String,
    pub identity_provider_url: Url,
    pub identity_jwks_url: Option<Url>,
    pub identity_issuer: String,
    pub call_timeout: Duration,
    pub login_timeout: Duration,
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let or_default = |var: &str, default: &str| get(var).unwrap_or_else(|| default.to_string());

        let service_id = match lookup(SERVICE_ID_ENV) {
            Some(id) if id.trim().is_empty() => return Err(ConfigError::Empty(SERVICE_ID_ENV)),
            Some(id) => id.trim().to_string(),
            None => DEFAULT_SERVICE_ID.to_string(),
        };

        Ok(Self {
            service_address: parse_url(
                SERVICE_URL_ENV,
                &or_default(SERVICE_URL_ENV, DEFAULT_SERVICE_URL),
            )?,
            service_id,
            identity_provider_url: parse_url(
                IDENTITY_PROVIDER_URL_ENV,
                &or_default(IDENTITY_PROVIDER_URL_ENV, DEFAULT_IDENTITY_PROVIDER_URL),
            )?,
            identity_jwks_url: get(IDENTITY_JWKS_URL_ENV)
                .map(|v| parse_url(IDENTITY_JWKS_URL_ENV, &v))
                .transpose()?,
            identity_issuer: or_default(IDENTITY_ISSUER_ENV, DEFAULT_IDENTITY_ISSUER),
            call_timeout: secs_var(CALL_TIMEOUT_ENV, get(CALL_TIMEOUT_ENV))?
                .unwrap_or(DEFAULT_CALL_TIMEOUT),
            login_timeout: secs_var(LOGIN_TIMEOUT_ENV, get(LOGIN_TIMEOUT_ENV))?
                .unwrap_or(DEFAULT_LOGIN_TIMEOUT),
            poll_interval: secs_var(POLL_INTERVAL_ENV, get(POLL_INTERVAL_ENV))?
                .unwrap_or(DEFAULT_POLL_INTERVAL),
        })
    }

    /// Built-in defaults, ignoring the environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_lookup(|_| None)
    }

    pub fn service(&self) -> ServiceAddress {
        ServiceAddress::new(self.service_address.clone(), self.service_id.clone())
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })
}

fn secs_var(var: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    value
        .map(|v| match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidDuration { var, value: v }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ClientConfig::defaults().unwrap());
        assert_eq!(config.service_address.as_str(), DEFAULT_SERVICE_URL);
        assert_eq!(config.service().service_id(), DEFAULT_SERVICE_ID);
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert!(config.identity_jwks_url.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            (SERVICE_URL_ENV, "https://icp0.io"),
            (SERVICE_ID_ENV, " rrkah-fqaaa-aaaaa-aaaaq-cai "),
            (IDENTITY_JWKS_URL_ENV, "https://identity.example/.well-known/jwks.json"),
            (CALL_TIMEOUT_ENV, "5"),
        ])
        .unwrap();

        assert_eq!(config.service_address.as_str(), "https://icp0.io/");
        assert_eq!(config.service_id, "rrkah-fqaaa-aaaaa-aaaaq-cai");
        assert!(config.identity_jwks_url.is_some());
        assert_eq!(config.call_timeout, Duration::from_secs(5));
        assert_eq!(config.login_timeout, Duration::from_secs(300));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[(SERVICE_URL_ENV, "not a url")]),
            Err(ConfigError::InvalidUrl { var: SERVICE_URL_ENV, .. })
        ));
        assert!(matches!(
            load(&[(POLL_INTERVAL_ENV, "0")]),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert!(matches!(
            load(&[(CALL_TIMEOUT_ENV, "soon")]),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert_eq!(
            load(&[(SERVICE_ID_ENV, "  ")]),
            Err(ConfigError::Empty(SERVICE_ID_ENV))
        );
    }
}
