// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Remote Call Gateway
//!
//! Builds [`RemoteHandle`]s bound to an identity and the configured service.
//! Handles are the only way workflow controllers reach the insurance service.
//! The gateway never retries; callers re-invoke an operation if they want to.

pub mod error;
pub mod handle;
pub mod http;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

pub use error::GatewayError;
pub use handle::RemoteHandle;
pub use http::HttpTransport;
pub use transport::{CallContext, RemoteMethod, ServiceAddress, Transport};

use crate::auth::Identity;

/// Factory for remote handles.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    call_timeout: Duration,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, call_timeout: Duration) -> Self {
        Self {
            transport,
            call_timeout,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Bind `identity` to `service`. No network traffic.
    pub fn build(
        &self,
        identity: Arc<Identity>,
        service: &ServiceAddress,
        generation: u64,
    ) -> RemoteHandle {
        RemoteHandle::new(
            Arc::clone(&self.transport),
            identity,
            service.clone(),
            self.call_timeout,
            generation,
        )
    }
}
