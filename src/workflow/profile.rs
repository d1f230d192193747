// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account profile and premium history.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::debug;

use super::apply_if_current;
use crate::error::ClientResult;
use crate::models::{PremiumTransaction, UserProfile};
use crate::session::{SessionListener, SessionManager};

pub struct ProfileController {
    session: Arc<SessionManager>,
    profile: watch::Sender<Option<UserProfile>>,
    premiums: watch::Sender<Vec<PremiumTransaction>>,
}

impl ProfileController {
    pub fn new(session: Arc<SessionManager>) -> Arc<Self> {
        let (profile, _) = watch::channel(None);
        let (premiums, _) = watch::channel(Vec::new());
        let controller = Arc::new(Self {
            session,
            profile,
            premiums,
        });
        let listener: Weak<dyn SessionListener> = Arc::downgrade(&controller) as Weak<dyn SessionListener>;
        controller.session.add_listener(listener);
        controller
    }

    pub fn subscribe_profile(&self) -> watch::Receiver<Option<UserProfile>> {
        self.profile.subscribe()
    }

    pub fn subscribe_premiums(&self) -> watch::Receiver<Vec<PremiumTransaction>> {
        self.premiums.subscribe()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.profile.borrow().clone()
    }

    pub async fn load_profile(&self) -> ClientResult<UserProfile> {
        let handle = self.session.current_handle()?;
        let profile = handle.get_user_info().await?;
        apply_if_current(&self.session, &handle, &self.profile, |cache| {
            *cache = Some(profile.clone());
        })?;
        Ok(profile)
    }

    /// Premium payments, newest first.
    pub async fn list_premium_transactions(&self) -> ClientResult<Vec<PremiumTransaction>> {
        let handle = self.session.current_handle()?;
        let mut transactions = handle.get_premium_transactions().await?;
        transactions.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        apply_if_current(&self.session, &handle, &self.premiums, |cache| {
            *cache = transactions.clone();
        })?;
        Ok(transactions)
    }
}

impl SessionListener for ProfileController {
    fn on_session_invalidated(&self, generation: u64) {
        self.profile.send_replace(None);
        self.premiums.send_replace(Vec::new());
        debug!(generation, "Profile cache cleared");
    }
}
