// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Status Poller
//!
//! Background task that keeps undecided claims and a pending underwriting
//! result in step with the service while the user is signed in.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 15 s) the poller:
//! 1. Skips the sweep entirely when the session is not authenticated.
//! 2. Re-fetches every cached claim in `Submitted` or `Processing`.
//! 3. Re-fetches the underwriting result if the cached one is `Pending`.
//!
//! Failures are logged and retried on the next sweep.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::claims::ClaimsController;
use super::underwriting::UnderwritingController;
use crate::models::UnderwritingStatus;
use crate::session::{SessionManager, SessionStatus};

/// Default interval between polling sweeps.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// What one sweep did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub claims_refreshed: usize,
    pub result_refreshed: bool,
    pub failures: usize,
}

pub struct StatusPoller {
    session: Arc<SessionManager>,
    claims: Arc<ClaimsController>,
    underwriting: Arc<UnderwritingController>,
    poll_interval: Duration,
}

impl StatusPoller {
    pub fn new(
        session: Arc<SessionManager>,
        claims: Arc<ClaimsController>,
        underwriting: Arc<UnderwritingController>,
    ) -> Self {
        Self {
            session,
            claims,
            underwriting,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Status poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Status poller shutting down");
                return;
            }

            self.poll_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Status poller shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep.
    pub async fn poll_once(&self) -> SweepReport {
        let mut report = SweepReport::default();
        if self.session.status() != SessionStatus::Authenticated {
            return report;
        }

        let pending = self.claims.pending_ids();
        if !pending.is_empty() {
            debug!(count = pending.len(), "Status poller: refreshing undecided claims");
        }
        for claim_id in &pending {
            match self.claims.refresh_claim(claim_id).await {
                Ok(_) => report.claims_refreshed += 1,
                Err(e) => {
                    report.failures += 1;
                    warn!(
                        claim_id = %claim_id,
                        error = %e,
                        "Status poller: failed to refresh claim"
                    );
                }
            }
        }

        let result_pending = matches!(
            self.underwriting.result(),
            Some(result) if result.status == UnderwritingStatus::Pending
        );
        if result_pending {
            match self.underwriting.refresh_result().await {
                Ok(_) => report.result_refreshed = true,
                Err(e) => {
                    report.failures += 1;
                    warn!(error = %e, "Status poller: failed to refresh underwriting result");
                }
            }
        }

        report
    }
}
