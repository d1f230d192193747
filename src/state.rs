// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client facade handed to the presentation layer.
//!
//! One [`InsuranceClient`] owns the session and every workflow controller.
//! It is cheap to clone; clones share the same session.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::{
    AuthError, DelegatedIdentityProvider, DelegationIssuer, Identity, JwksManager, KeySource,
    Principal, ProviderKind, ProviderRegistry,
};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::gateway::{Gateway, HttpTransport, Transport};
use crate::models::{
    Claim, ClaimCache, ClaimId, ClaimOutcome, DocType, Document, DocumentId, PremiumTransaction,
    UnderwritingResult, UserProfile,
};
use crate::session::{SessionManager, SessionState};
use crate::workflow::{ClaimsController, ProfileController, StatusPoller, UnderwritingController};

#[derive(Clone)]
pub struct InsuranceClient {
    config: Arc<ClientConfig>,
    session: Arc<SessionManager>,
    claims: Arc<ClaimsController>,
    underwriting: Arc<UnderwritingController>,
    profile: Arc<ProfileController>,
}

impl InsuranceClient {
    pub fn new(
        config: ClientConfig,
        providers: ProviderRegistry,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let gateway = Gateway::new(transport, config.call_timeout);
        let session = Arc::new(SessionManager::new(
            providers,
            gateway,
            config.service(),
            config.login_timeout,
        ));

        Self {
            claims: ClaimsController::new(Arc::clone(&session)),
            underwriting: UnderwritingController::new(Arc::clone(&session)),
            profile: ProfileController::new(Arc::clone(&session)),
            session,
            config: Arc::new(config),
        }
    }

    /// Client talking to the configured service over HTTP.
    pub fn with_http_transport(
        config: ClientConfig,
        providers: ProviderRegistry,
    ) -> ClientResult<Self> {
        let transport = HttpTransport::new()?;
        Ok(Self::new(config, providers, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn claims(&self) -> &Arc<ClaimsController> {
        &self.claims
    }

    pub fn underwriting(&self) -> &Arc<UnderwritingController> {
        &self.underwriting
    }

    pub fn profile(&self) -> &Arc<ProfileController> {
        &self.profile
    }

    /// Poller for undecided claims and pending underwriting, using the
    /// configured interval.
    pub fn status_poller(&self) -> StatusPoller {
        StatusPoller::new(
            Arc::clone(&self.session),
            Arc::clone(&self.claims),
            Arc::clone(&self.underwriting),
        )
        .with_interval(self.config.poll_interval)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Attempt silent resume. Call once at application start.
    pub async fn start(&self) -> Option<Arc<Identity>> {
        let identity = self.session.resume().await?;
        self.sync_after_login().await;
        Some(identity)
    }

    pub async fn begin_login(&self, kind: ProviderKind) -> ClientResult<Arc<Identity>> {
        let identity = self.session.begin_login(kind).await?;
        self.sync_after_login().await;
        Ok(identity)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.session.logout().await?;
        Ok(())
    }

    /// Principal the service sees for the current session.
    pub async fn caller_principal(&self) -> ClientResult<Principal> {
        let handle = self.session.current_handle()?;
        Ok(handle.get_caller_principal().await?)
    }

    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.session.providers().kinds()
    }

    async fn sync_after_login(&self) {
        if let Err(e) = self.claims.list().await {
            warn!(error = %e, "Initial claim listing failed");
        }
        if let Err(e) = self.claims.refresh_admin().await {
            debug!(error = %e, "Admin check failed");
        }
    }

    // =========================================================================
    // Claims
    // =========================================================================

    pub async fn submit_claim(&self, description: &str) -> ClientResult<ClaimId> {
        self.claims.submit(description).await
    }

    pub async fn list_claims(&self) -> ClientResult<Vec<Claim>> {
        self.claims.list().await
    }

    pub async fn process_claim(&self, id: &ClaimId) -> ClientResult<ClaimOutcome> {
        self.claims.process(id).await
    }

    // =========================================================================
    // Underwriting
    // =========================================================================

    pub fn stage_document(&self, doc_type: DocType, content: Vec<u8>) {
        self.underwriting.stage_document(doc_type, content);
    }

    pub async fn upload_staged(&self, doc_type: &DocType) -> ClientResult<DocumentId> {
        self.underwriting.upload_staged(doc_type).await
    }

    pub async fn list_uploaded(&self) -> ClientResult<Vec<Document>> {
        self.underwriting.list_uploaded().await
    }

    pub async fn process_underwriting(&self) -> ClientResult<UnderwritingResult> {
        self.underwriting.process_underwriting().await
    }

    pub async fn refresh_underwriting_result(&self) -> ClientResult<Option<UnderwritingResult>> {
        self.underwriting.refresh_result().await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub async fn load_profile(&self) -> ClientResult<UserProfile> {
        self.profile.load_profile().await
    }

    pub async fn list_premium_transactions(&self) -> ClientResult<Vec<PremiumTransaction>> {
        self.profile.list_premium_transactions().await
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn subscribe_claims(&self) -> watch::Receiver<ClaimCache> {
        self.claims.subscribe()
    }

    pub fn subscribe_documents(&self) -> watch::Receiver<Vec<Document>> {
        self.underwriting.subscribe_documents()
    }

    pub fn subscribe_underwriting(&self) -> watch::Receiver<Option<UnderwritingResult>> {
        self.underwriting.subscribe_result()
    }

    pub fn subscribe_admin(&self) -> watch::Receiver<bool> {
        self.claims.subscribe_admin()
    }

    pub fn subscribe_profile(&self) -> watch::Receiver<Option<UserProfile>> {
        self.profile.subscribe_profile()
    }
}

/// Delegated identity provider verifying against the configured JWKS.
pub fn delegated_identity_provider(
    config: &ClientConfig,
    issuer: Arc<dyn DelegationIssuer>,
) -> Result<DelegatedIdentityProvider, AuthError> {
    let jwks_url = config.identity_jwks_url.as_ref().ok_or_else(|| {
        AuthError::KeyFetch(format!(
            "{} is not set",
            crate::config::IDENTITY_JWKS_URL_ENV
        ))
    })?;
    let keys: Arc<dyn KeySource> = Arc::new(JwksManager::new(jwks_url.clone())?);

    Ok(DelegatedIdentityProvider::new(
        config.identity_provider_url.clone(),
        config.identity_issuer.clone(),
        issuer,
        keys,
    ))
}
