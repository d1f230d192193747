// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Common test utilities for insurance-client integration tests.
//!
//! [`FakeService`] is an in-memory stand-in for the insurance service that
//! speaks the same method/args shapes as the real one.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use data_encoding::BASE64;
use insurance_client::auth::{
    AuthError, Credential, CredentialProvider, Identity, Principal, ProviderKind, ProviderRegistry,
};
use insurance_client::gateway::{CallContext, GatewayError, RemoteMethod, Transport};
use insurance_client::models::{
    Claim, ClaimId, ClaimOutcome, ClaimStatus, CurrencyAmount, DocType, Document, DocumentId,
    PremiumTransaction, UnderwritingResult, UnderwritingStatus, UserProfile,
};
use insurance_client::{ClientConfig, InsuranceClient};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// Identity backed by a wallet key derived from `seed`.
pub fn wallet_identity(seed: &str) -> Identity {
    Identity::new(
        Principal::self_authenticating(seed.as_bytes()),
        ProviderKind::BrowserWallet,
        Credential::WalletKey {
            public_key_der: seed.as_bytes().to_vec(),
        },
    )
}

pub fn delegated_identity(seed: &str) -> Identity {
    Identity::new(
        Principal::self_authenticating(seed.as_bytes()),
        ProviderKind::DelegatedIdentity,
        Credential::Delegation {
            token: format!("delegation-{seed}"),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        },
    )
}

pub fn quotation(minor_units: u64) -> CurrencyAmount {
    CurrencyAmount {
        currency: "KES".to_string(),
        minor_units,
    }
}

/// A call that is held until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub reached: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct ServiceState {
    next_id: u64,
    claims: BTreeMap<ClaimId, (Principal, Claim)>,
    /// Listed by `getUserClaims` but not returned by `getClaim`
    hidden: HashSet<ClaimId>,
    documents: Vec<(Principal, Document)>,
    underwriting: HashMap<Principal, UnderwritingResult>,
    /// What `processUnderwriting` records for the caller
    evaluation: Option<UnderwritingResult>,
    admins: HashSet<Principal>,
    premiums: Vec<PremiumTransaction>,
}

/// In-memory insurance service.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<ServiceState>,
    calls: Mutex<Vec<RemoteMethod>>,
    failures: Mutex<HashMap<RemoteMethod, GatewayError>>,
    hanging: Mutex<HashSet<RemoteMethod>>,
    gates: Mutex<HashMap<RemoteMethod, Arc<Gate>>>,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, method: RemoteMethod) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    /// Fail every call to `method` with `error` until cleared.
    pub fn fail(&self, method: RemoteMethod, error: GatewayError) {
        self.failures.lock().unwrap().insert(method, error);
    }

    pub fn clear_failure(&self, method: RemoteMethod) {
        self.failures.lock().unwrap().remove(&method);
    }

    /// Never answer calls to `method`.
    pub fn hang(&self, method: RemoteMethod) {
        self.hanging.lock().unwrap().insert(method);
    }

    /// Hold the next calls to `method` until the returned gate is released.
    pub fn gate(&self, method: RemoteMethod) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().unwrap().insert(method, Arc::clone(&gate));
        gate
    }

    /// Seed a claim owned by `owner` in the given status.
    pub fn seed_claim(&self, owner: &Principal, description: &str, status: ClaimStatus) -> ClaimId {
        let mut state = self.state.lock().unwrap();
        let id = next_claim_id(&mut state);
        let claim = Claim {
            id: id.clone(),
            description: description.to_string(),
            status,
            submitted_at: Utc::now(),
            processed_at: None,
        };
        state.claims.insert(id.clone(), (owner.clone(), claim));
        id
    }

    pub fn set_claim_status(&self, id: &ClaimId, status: ClaimStatus) {
        if let Some((_, claim)) = self.state.lock().unwrap().claims.get_mut(id) {
            claim.status = status;
        }
    }

    /// Keep `id` in listings but make `getClaim` return nothing.
    pub fn hide_claim(&self, id: &ClaimId) {
        self.state.lock().unwrap().hidden.insert(id.clone());
    }

    pub fn claims_of(&self, owner: &Principal) -> Vec<Claim> {
        self.state
            .lock()
            .unwrap()
            .claims
            .values()
            .filter(|(o, _)| o == owner)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn documents_of(&self, owner: &Principal) -> Vec<Document> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|(o, _)| o == owner)
            .map(|(_, d)| d.clone())
            .collect()
    }

    pub fn set_underwriting(&self, owner: &Principal, result: UnderwritingResult) {
        self.state
            .lock()
            .unwrap()
            .underwriting
            .insert(owner.clone(), result);
    }

    /// Result that `processUnderwriting` will record.
    pub fn set_evaluation(&self, result: UnderwritingResult) {
        self.state.lock().unwrap().evaluation = Some(result);
    }

    pub fn make_admin(&self, principal: &Principal) {
        self.state.lock().unwrap().admins.insert(principal.clone());
    }

    pub fn add_premium(&self, transaction: PremiumTransaction) {
        self.state.lock().unwrap().premiums.push(transaction);
    }

    fn dispatch(&self, caller: &Principal, method: RemoteMethod, args: &Value) -> Result<Value, GatewayError> {
        let mut state = self.state.lock().unwrap();
        match method {
            RemoteMethod::GetCallerPrincipal => Ok(json!(caller.to_text())),
            RemoteMethod::SubmitClaim => {
                let description = str_arg(args, "description")?;
                let id = next_claim_id(&mut state);
                let claim = Claim {
                    id: id.clone(),
                    description,
                    status: ClaimStatus::Submitted,
                    submitted_at: Utc::now(),
                    processed_at: None,
                };
                state.claims.insert(id.clone(), (caller.clone(), claim));
                Ok(json!(id))
            }
            RemoteMethod::GetUserClaims => {
                let owner: Principal = str_arg(args, "owner")?
                    .parse()
                    .map_err(|_| GatewayError::rejected("invalid_owner", "bad principal"))?;
                let ids: Vec<&ClaimId> = state
                    .claims
                    .iter()
                    .filter(|(_, (o, _))| *o == owner)
                    .map(|(id, _)| id)
                    .collect();
                Ok(json!(ids))
            }
            RemoteMethod::GetClaim => {
                let id = ClaimId(str_arg(args, "claimId")?);
                if state.hidden.contains(&id) {
                    return Ok(Value::Null);
                }
                Ok(state
                    .claims
                    .get(&id)
                    .map(|(_, c)| json!(c))
                    .unwrap_or(Value::Null))
            }
            RemoteMethod::ProcessClaim => {
                let id = ClaimId(str_arg(args, "claimId")?);
                let (_, claim) = state
                    .claims
                    .get_mut(&id)
                    .ok_or_else(|| GatewayError::rejected("not_found", "no such claim"))?;
                if claim.status != ClaimStatus::Submitted {
                    return Err(GatewayError::rejected("claim_closed", "claim already processed"));
                }
                claim.status = ClaimStatus::Approved;
                claim.processed_at = Some(Utc::now());
                Ok(json!(ClaimOutcome {
                    claim_id: id,
                    status: ClaimStatus::Approved,
                    message: Some("Claim approved".to_string()),
                }))
            }
            RemoteMethod::SubmitDocument => {
                let doc_type = DocType::from(str_arg(args, "docType")?);
                let content = BASE64
                    .decode(str_arg(args, "content")?.as_bytes())
                    .map_err(|_| GatewayError::rejected("invalid_content", "not base64"))?;
                state.next_id += 1;
                let id = DocumentId(format!("doc-{}", state.next_id));
                let document = Document {
                    id: id.clone(),
                    doc_type,
                    content,
                    uploaded_at: Utc::now(),
                };
                state.documents.push((caller.clone(), document));
                Ok(json!(id))
            }
            RemoteMethod::GetDocuments => {
                let owner: Principal = str_arg(args, "owner")?
                    .parse()
                    .map_err(|_| GatewayError::rejected("invalid_owner", "bad principal"))?;
                let documents: Vec<&Document> = state
                    .documents
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, d)| d)
                    .collect();
                Ok(json!(documents))
            }
            RemoteMethod::ProcessUnderwriting => {
                if let Some(evaluation) = state.evaluation.clone() {
                    state.underwriting.insert(caller.clone(), evaluation);
                }
                // The trigger's own payload is deliberately different from
                // what is stored.
                Ok(json!({ "status": "Denied", "comments": "provisional" }))
            }
            RemoteMethod::GetUnderwritingResult => Ok(match state.underwriting.get(caller) {
                Some(result) => json!({ "Ok": result }),
                None => json!({ "Err": "NotFound" }),
            }),
            RemoteMethod::GetUserInfo => Ok(json!(UserProfile {
                name: "Amina Wanjiru".to_string(),
                email: Some("amina@example.com".to_string()),
                account_type: "Business".to_string(),
                total_policies: 3,
                active_policies: 2,
                total_claims: state.claims.values().filter(|(o, _)| o == caller).count() as u32,
            })),
            RemoteMethod::IsAdmin => Ok(json!(state.admins.contains(caller))),
            RemoteMethod::GetPremiumTransactions => Ok(json!(state.premiums)),
        }
    }
}

fn next_claim_id(state: &mut ServiceState) -> ClaimId {
    state.next_id += 1;
    ClaimId(format!("claim-{}", state.next_id))
}

fn str_arg(args: &Value, name: &str) -> Result<String, GatewayError> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GatewayError::rejected("invalid_args", format!("missing {name}")))
}

#[async_trait]
impl Transport for FakeService {
    async fn call(
        &self,
        ctx: CallContext<'_>,
        method: RemoteMethod,
        args: Value,
    ) -> Result<Value, GatewayError> {
        self.calls.lock().unwrap().push(method);

        let gate = self.gates.lock().unwrap().get(&method).cloned();
        if let Some(gate) = gate {
            gate.reached.notify_one();
            gate.release.notified().await;
        }
        let hangs = self.hanging.lock().unwrap().contains(&method);
        if hangs {
            std::future::pending::<()>().await;
        }
        let failure = self.failures.lock().unwrap().get(&method).cloned();
        if let Some(error) = failure {
            return Err(error);
        }

        self.dispatch(ctx.identity.principal(), method, &args)
    }
}

/// Provider that returns a fixed identity, optionally after a gate opens.
pub struct ScriptedProvider {
    pub kind: ProviderKind,
    pub result: Result<Identity, AuthError>,
    pub gate: Option<Arc<Notify>>,
    pub resumable: Option<Identity>,
    pub logins: AtomicU64,
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind, result: Result<Identity, AuthError>) -> Self {
        Self {
            kind,
            result,
            gate: None,
            resumable: None,
            logins: AtomicU64::new(0),
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn resumable(mut self, identity: Identity) -> Self {
        self.resumable = Some(identity);
        self
    }
}

#[async_trait]
impl CredentialProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn login(&self) -> Result<Identity, AuthError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.clone()
    }

    fn supports_silent_resume(&self) -> bool {
        self.kind == ProviderKind::DelegatedIdentity
    }

    async fn resume(&self) -> Result<Option<Identity>, AuthError> {
        Ok(self.resumable.clone())
    }
}

pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::defaults().unwrap();
    config.call_timeout = Duration::from_secs(2);
    config.login_timeout = Duration::from_secs(2);
    config
}

pub fn client_with(
    service: &Arc<FakeService>,
    providers: ProviderRegistry,
    config: ClientConfig,
) -> InsuranceClient {
    InsuranceClient::new(config, providers, Arc::clone(service) as Arc<dyn Transport>)
}

/// Client with a single browser wallet provider that logs in as `seed`.
pub fn wallet_client(service: &Arc<FakeService>, seed: &str) -> InsuranceClient {
    client_with(
        service,
        ProviderRegistry::new().with(Arc::new(ScriptedProvider::new(
            ProviderKind::BrowserWallet,
            Ok(wallet_identity(seed)),
        ))),
        test_config(),
    )
}

/// Signed-in client for `seed`.
pub async fn signed_in(service: &Arc<FakeService>, seed: &str) -> InsuranceClient {
    let client = wallet_client(service, seed);
    client
        .begin_login(ProviderKind::BrowserWallet)
        .await
        .unwrap();
    client
}

pub fn pending_result() -> UnderwritingResult {
    UnderwritingResult {
        status: UnderwritingStatus::Pending,
        quotation: None,
        comments: None,
    }
}

pub fn approved_result(minor_units: u64) -> UnderwritingResult {
    UnderwritingResult {
        status: UnderwritingStatus::Approved,
        quotation: Some(quotation(minor_units)),
        comments: Some("Low risk profile".to_string()),
    }
}
