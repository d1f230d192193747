// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Insurance Client - session, remote gateway and workflow core
//!
//! This crate provides the non-UI core of an insurance client: users sign in
//! with one of three credential providers, then submit and track claims and
//! upload underwriting documents against a remote insurance service.
//!
//! ## Modules
//!
//! - `auth` - Credential providers (delegated identity, browser wallet, chain wallet)
//! - `session` - Session state machine and handle ownership
//! - `gateway` - Remote handles and the HTTP transport
//! - `workflow` - Claims, underwriting and profile controllers
//! - `state` - `InsuranceClient` facade for the presentation layer

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod session;
pub mod state;
pub mod workflow;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use state::InsuranceClient;
