// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Workflow Controllers
//!
//! Each controller keeps a read-through cache of authoritative remote state
//! in a [`tokio::sync::watch`] channel. Caches are only ever replaced from a
//! remote response, never mutated to anticipate one.
//!
//! Responses are applied only if the handle that fetched them still belongs
//! to the current session; otherwise the call fails with
//! [`ClientError::StaleSession`] and the cache is left alone.

pub mod claims;
pub mod poller;
pub mod profile;
pub mod underwriting;

pub use claims::ClaimsController;
pub use poller::StatusPoller;
pub use profile::ProfileController;
pub use underwriting::UnderwritingController;

use tokio::sync::watch;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::gateway::RemoteHandle;
use crate::session::SessionManager;

/// Apply `update` to `cache` if `handle` is still the session's handle.
pub(crate) fn apply_if_current<T>(
    session: &SessionManager,
    handle: &RemoteHandle,
    cache: &watch::Sender<T>,
    update: impl FnOnce(&mut T),
) -> ClientResult<()> {
    let applied = cache.send_if_modified(|value| {
        if session.is_current(handle.generation()) {
            update(value);
            true
        } else {
            false
        }
    });

    if applied {
        Ok(())
    } else {
        debug!(
            generation = handle.generation(),
            current = session.generation(),
            "Dropping response for an invalidated session"
        );
        Err(ClientError::StaleSession)
    }
}
