// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire-level seam between [`RemoteHandle`](super::RemoteHandle) and the
//! insurance service.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::error::GatewayError;
use crate::auth::Identity;

/// Operations exposed by the insurance service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteMethod {
    GetCallerPrincipal,
    SubmitClaim,
    GetUserClaims,
    GetClaim,
    ProcessClaim,
    SubmitDocument,
    GetDocuments,
    ProcessUnderwriting,
    GetUnderwritingResult,
    GetUserInfo,
    IsAdmin,
    GetPremiumTransactions,
}

impl RemoteMethod {
    /// Method name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteMethod::GetCallerPrincipal => "getCallerPrincipal",
            RemoteMethod::SubmitClaim => "submitClaim",
            RemoteMethod::GetUserClaims => "getUserClaims",
            RemoteMethod::GetClaim => "getClaim",
            RemoteMethod::ProcessClaim => "processClaim",
            RemoteMethod::SubmitDocument => "submitDocument",
            RemoteMethod::GetDocuments => "getDocuments",
            RemoteMethod::ProcessUnderwriting => "processUnderwriting",
            RemoteMethod::GetUnderwritingResult => "getUnderwritingResult",
            RemoteMethod::GetUserInfo => "getUserInfo",
            RemoteMethod::IsAdmin => "isAdmin",
            RemoteMethod::GetPremiumTransactions => "getPremiumTransactions",
        }
    }
}

impl fmt::Display for RemoteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the insurance service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddress {
    base_url: Url,
    service_id: String,
}

impl ServiceAddress {
    pub fn new(mut base_url: Url, service_id: impl Into<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            service_id: service_id.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }
}

/// Everything a transport needs to authorize one call.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub service: &'a ServiceAddress,
    pub identity: &'a Identity,
}

/// Carries a single call to the service and returns its raw payload.
///
/// Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        ctx: CallContext<'_>,
        method: RemoteMethod,
        args: Value,
    ) -> Result<Value, GatewayError>;
}
