// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claims workflow.
//!
//! Submissions are not deduplicated: two `submit` calls with the same text
//! create two claims. Concurrent `process` calls for one claim are not
//! serialized here either; the service decides which one wins.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::apply_if_current;
use crate::auth::Principal;
use crate::error::{ClientError, ClientResult};
use crate::gateway::RemoteHandle;
use crate::models::{Claim, ClaimCache, ClaimDescription, ClaimId, ClaimOutcome, ClaimStatus};
use crate::session::{SessionListener, SessionManager};

pub struct ClaimsController {
    session: Arc<SessionManager>,
    cache: watch::Sender<ClaimCache>,
    is_admin: watch::Sender<bool>,
}

impl ClaimsController {
    /// Create the controller and subscribe it to session invalidation.
    pub fn new(session: Arc<SessionManager>) -> Arc<Self> {
        let (cache, _) = watch::channel(ClaimCache::new());
        let (is_admin, _) = watch::channel(false);
        let controller = Arc::new(Self {
            session,
            cache,
            is_admin,
        });
        let listener: Weak<dyn SessionListener> = Arc::downgrade(&controller) as Weak<dyn SessionListener>;
        controller.session.add_listener(listener);
        controller
    }

    pub fn subscribe(&self) -> watch::Receiver<ClaimCache> {
        self.cache.subscribe()
    }

    pub fn subscribe_admin(&self) -> watch::Receiver<bool> {
        self.is_admin.subscribe()
    }

    /// Cached claims, ordered by id.
    pub fn claims(&self) -> Vec<Claim> {
        self.cache.borrow().values().cloned().collect()
    }

    pub fn cached(&self, id: &ClaimId) -> Option<Claim> {
        self.cache.borrow().get(id).cloned()
    }

    pub fn is_admin(&self) -> bool {
        *self.is_admin.borrow()
    }

    /// Ids of cached claims the service has not decided yet.
    pub fn pending_ids(&self) -> Vec<ClaimId> {
        self.cache
            .borrow()
            .values()
            .filter(|claim| !claim.status.is_terminal())
            .map(|claim| claim.id.clone())
            .collect()
    }

    /// Submit a new claim and re-list.
    ///
    /// Blank descriptions are rejected before anything is sent.
    pub async fn submit(&self, description: &str) -> ClientResult<ClaimId> {
        let description = ClaimDescription::parse(description)?;
        let handle = self.session.current_handle()?;

        let id = handle.submit_claim(&description).await?;
        info!(claim_id = %id, "Claim submitted");

        if let Err(e) = self.list_with(&handle, handle.principal()).await {
            warn!(claim_id = %id, error = %e, "Claim list refresh after submit failed");
            if let Err(e) = self.refresh_with(&handle, &id).await {
                warn!(claim_id = %id, error = %e, "Claim refresh after submit failed");
            }
        }
        Ok(id)
    }

    /// List the caller's claims and replace the cache with them.
    pub async fn list(&self) -> ClientResult<Vec<Claim>> {
        let handle = self.session.current_handle()?;
        self.list_with(&handle, handle.principal()).await
    }

    /// List the claims owned by `owner` and replace the cache with them.
    pub async fn list_owned_by(&self, owner: &Principal) -> ClientResult<Vec<Claim>> {
        let handle = self.session.current_handle()?;
        self.list_with(&handle, owner).await
    }

    async fn list_with(&self, handle: &RemoteHandle, owner: &Principal) -> ClientResult<Vec<Claim>> {
        let ids = handle.get_user_claims(owner).await?;

        let mut claims = Vec::with_capacity(ids.len());
        for id in ids {
            match handle.get_claim(&id).await? {
                Some(claim) => claims.push(claim),
                None => debug!(claim_id = %id, "Listed claim is no longer visible, skipping"),
            }
        }

        apply_if_current(&self.session, handle, &self.cache, |cache| {
            *cache = claims
                .iter()
                .map(|claim| (claim.id.clone(), claim.clone()))
                .collect();
        })?;
        debug!(owner = %owner, count = claims.len(), "Claims listed");
        Ok(claims)
    }

    /// Ask the service to process a claim.
    ///
    /// Only claims cached as `Submitted` are sent; anything else fails
    /// locally with `InvalidStateTransition`. The service makes the final
    /// decision.
    pub async fn process(&self, id: &ClaimId) -> ClientResult<ClaimOutcome> {
        let handle = self.session.current_handle()?;

        let status = self.cache.borrow().get(id).map(|claim| claim.status);
        match status {
            Some(ClaimStatus::Submitted) => {}
            Some(status) => {
                return Err(ClientError::InvalidStateTransition(format!(
                    "claim {id} is {status}, only Submitted claims can be processed"
                )))
            }
            None => {
                return Err(ClientError::InvalidStateTransition(format!(
                    "claim {id} is not in the local cache"
                )))
            }
        }

        let outcome = handle.process_claim(id).await?;
        info!(claim_id = %id, status = %outcome.status, "Claim processed");

        if let Err(e) = self.refresh_with(&handle, id).await {
            warn!(claim_id = %id, error = %e, "Claim refresh after processing failed");
        }
        Ok(outcome)
    }

    /// Re-fetch one claim. A claim the service no longer returns is dropped
    /// from the cache.
    pub async fn refresh_claim(&self, id: &ClaimId) -> ClientResult<Option<Claim>> {
        let handle = self.session.current_handle()?;
        self.refresh_with(&handle, id).await
    }

    async fn refresh_with(&self, handle: &RemoteHandle, id: &ClaimId) -> ClientResult<Option<Claim>> {
        let claim = handle.get_claim(id).await?;
        apply_if_current(&self.session, handle, &self.cache, |cache| match &claim {
            Some(claim) => {
                cache.insert(claim.id.clone(), claim.clone());
            }
            None => {
                cache.remove(id);
            }
        })?;
        Ok(claim)
    }

    /// Re-check whether the caller may act as an administrator.
    pub async fn refresh_admin(&self) -> ClientResult<bool> {
        let handle = self.session.current_handle()?;
        let is_admin = handle.is_admin().await?;
        apply_if_current(&self.session, &handle, &self.is_admin, |value| {
            *value = is_admin
        })?;
        Ok(is_admin)
    }
}

impl SessionListener for ClaimsController {
    fn on_session_invalidated(&self, generation: u64) {
        self.cache.send_replace(ClaimCache::new());
        self.is_admin.send_replace(false);
        debug!(generation, "Claims cache cleared");
    }
}
