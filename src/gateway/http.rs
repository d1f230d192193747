// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP transport for the insurance service.
//!
//! ## Wire format
//!
//! `POST {base_url}/api/v2/canister/{service_id}/call`
//!
//! ```json
//! { "method": "submitClaim", "args": { "description": "..." } }
//! ```
//!
//! Replies are `{"ok": <payload>}` or `{"err": {"code": "...", "message": "..."}}`.
//! The caller is identified by `X-Caller-Principal`; delegated identities
//! also send their delegation as a bearer token.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::error::GatewayError;
use super::transport::{CallContext, RemoteMethod, ServiceAddress, Transport};

pub const CALLER_PRINCIPAL_HEADER: &str = "X-Caller-Principal";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Serialize)]
struct CallRequest<'a> {
    method: &'a str,
    args: &'a Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Ok(Value),
    Err(Rejection),
}

#[derive(Deserialize)]
struct Rejection {
    code: String,
    #[serde(default)]
    message: String,
}

/// [`Transport`] over HTTPS (or plain HTTP for a local replica).
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Call endpoint for `service`.
    pub fn endpoint(service: &ServiceAddress) -> Result<Url, GatewayError> {
        service
            .base_url()
            .join(&format!("api/v2/canister/{}/call", service.service_id()))
            .map_err(|e| GatewayError::Network(format!("invalid service address: {e}")))
    }
}

fn map_send_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        ctx: CallContext<'_>,
        method: RemoteMethod,
        args: Value,
    ) -> Result<Value, GatewayError> {
        let url = Self::endpoint(ctx.service)?;
        let request_id = Uuid::new_v4();

        let mut request = self
            .client
            .post(url)
            .header(CALLER_PRINCIPAL_HEADER, ctx.identity.principal_id())
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(&CallRequest {
                method: method.as_str(),
                args: &args,
            });
        if let Some(token) = ctx.identity.bearer_token() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        debug!(method = %method, request_id = %request_id, "Sending remote call");

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_send_error)?;

        match serde_json::from_slice::<Reply>(&body) {
            Ok(Reply::Err(rejection)) => Err(GatewayError::RemoteRejected {
                code: rejection.code,
                message: rejection.message,
            }),
            Ok(Reply::Ok(_)) | Err(_) if !status.is_success() => Err(GatewayError::RemoteRejected {
                code: format!("http_{}", status.as_u16()),
                message: String::from_utf8_lossy(&body).into_owned(),
            }),
            Ok(Reply::Ok(value)) => Ok(value),
            Err(e) => Err(GatewayError::Decode(format!("{method}: {e}"))),
        }
    }
}
