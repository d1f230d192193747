// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed remote operations bound to one identity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use data_encoding::BASE64;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::error::GatewayError;
use super::transport::{CallContext, RemoteMethod, ServiceAddress, Transport};
use crate::auth::{Identity, Principal};
use crate::models::{
    Claim, ClaimDescription, ClaimId, ClaimOutcome, DocType, Document, DocumentId,
    PremiumTransaction, UnderwritingResult, UserProfile,
};

/// Result shape of lookups that distinguish "not found" from failure.
#[derive(Deserialize)]
enum Lookup<T> {
    Ok(T),
    Err(LookupError),
}

#[derive(Deserialize)]
enum LookupError {
    NotFound,
}

/// Capability for invoking remote operations as one identity.
///
/// Handles are immutable. The session replaces its handle on every identity
/// change; `generation` records which session state the handle belongs to.
#[derive(Clone)]
pub struct RemoteHandle {
    transport: Arc<dyn Transport>,
    identity: Arc<Identity>,
    service: ServiceAddress,
    call_timeout: Duration,
    generation: u64,
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("principal", &self.identity.principal_id())
            .field("service_id", &self.service.service_id())
            .field("generation", &self.generation)
            .finish()
    }
}

impl RemoteHandle {
    pub fn new(
        transport: Arc<dyn Transport>,
        identity: Arc<Identity>,
        service: ServiceAddress,
        call_timeout: Duration,
        generation: u64,
    ) -> Self {
        Self {
            transport,
            identity,
            service,
            call_timeout,
            generation,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn principal(&self) -> &Principal {
        self.identity.principal()
    }

    pub fn service(&self) -> &ServiceAddress {
        &self.service
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        method: RemoteMethod,
        args: Value,
    ) -> Result<T, GatewayError> {
        let ctx = CallContext {
            service: &self.service,
            identity: &self.identity,
        };
        let started = Instant::now();

        let value =
            match tokio::time::timeout(self.call_timeout, self.transport.call(ctx, method, args))
                .await
            {
                Ok(result) => result.inspect_err(|e| {
                    warn!(method = %method, error = %e, "Remote call failed");
                })?,
                Err(_) => {
                    warn!(
                        method = %method,
                        timeout_secs = self.call_timeout.as_secs_f64(),
                        "Remote call timed out"
                    );
                    return Err(GatewayError::Timeout);
                }
            };

        debug!(
            method = %method,
            generation = self.generation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Remote call completed"
        );

        serde_json::from_value(value).map_err(|e| GatewayError::Decode(format!("{method}: {e}")))
    }

    pub async fn get_caller_principal(&self) -> Result<Principal, GatewayError> {
        self.invoke(RemoteMethod::GetCallerPrincipal, Value::Null)
            .await
    }

    pub async fn submit_claim(
        &self,
        description: &ClaimDescription,
    ) -> Result<ClaimId, GatewayError> {
        self.invoke(
            RemoteMethod::SubmitClaim,
            json!({ "description": description.as_str() }),
        )
        .await
    }

    pub async fn get_user_claims(&self, owner: &Principal) -> Result<Vec<ClaimId>, GatewayError> {
        self.invoke(RemoteMethod::GetUserClaims, json!({ "owner": owner }))
            .await
    }

    /// `Ok(None)` when the service has no claim with this id.
    pub async fn get_claim(&self, id: &ClaimId) -> Result<Option<Claim>, GatewayError> {
        self.invoke(RemoteMethod::GetClaim, json!({ "claimId": id }))
            .await
    }

    pub async fn process_claim(&self, id: &ClaimId) -> Result<ClaimOutcome, GatewayError> {
        self.invoke(RemoteMethod::ProcessClaim, json!({ "claimId": id }))
            .await
    }

    pub async fn submit_document(
        &self,
        doc_type: &DocType,
        content: &[u8],
    ) -> Result<DocumentId, GatewayError> {
        self.invoke(
            RemoteMethod::SubmitDocument,
            json!({
                "docType": doc_type.as_str(),
                "content": BASE64.encode(content),
            }),
        )
        .await
    }

    pub async fn get_documents(&self, owner: &Principal) -> Result<Vec<Document>, GatewayError> {
        self.invoke(RemoteMethod::GetDocuments, json!({ "owner": owner }))
            .await
    }

    /// Trigger evaluation. The returned payload is advisory only.
    pub async fn process_underwriting(
        &self,
    ) -> Result<Option<UnderwritingResult>, GatewayError> {
        self.invoke(RemoteMethod::ProcessUnderwriting, Value::Null)
            .await
    }

    /// `Ok(None)` when no evaluation exists yet.
    pub async fn get_underwriting_result(
        &self,
    ) -> Result<Option<UnderwritingResult>, GatewayError> {
        let lookup: Lookup<UnderwritingResult> = self
            .invoke(RemoteMethod::GetUnderwritingResult, Value::Null)
            .await?;
        Ok(match lookup {
            Lookup::Ok(result) => Some(result),
            Lookup::Err(LookupError::NotFound) => None,
        })
    }

    pub async fn get_user_info(&self) -> Result<UserProfile, GatewayError> {
        self.invoke(RemoteMethod::GetUserInfo, Value::Null).await
    }

    pub async fn is_admin(&self) -> Result<bool, GatewayError> {
        self.invoke(RemoteMethod::IsAdmin, Value::Null).await
    }

    pub async fn get_premium_transactions(
        &self,
    ) -> Result<Vec<PremiumTransaction>, GatewayError> {
        self.invoke(RemoteMethod::GetPremiumTransactions, Value::Null)
            .await
    }
}
