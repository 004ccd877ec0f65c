// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret guard for the transplant pingback endpoint.
//!
//! A request passes only when pingbacks are enabled and its `API-Key` header
//! equals the configured secret. Both failures produce the same 403 body;
//! the distinction is only logged.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "API-Key";

/// Pingback credential and feature flag.
#[derive(Clone)]
pub struct PingbackAuthenticator {
    enabled: bool,
    api_key: Option<String>,
}

impl PingbackAuthenticator {
    pub fn new(enabled: bool, api_key: Option<String>) -> Self {
        Self { enabled, api_key }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check a request's headers.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if !self.enabled {
            tracing::warn!("Attempt to access a disabled pingback");
            return Err(not_authorized());
        }

        let supplied = headers
            .get(API_KEY_HEADER)
            .map(|value| value.as_bytes())
            .unwrap_or_default();

        let matches = match &self.api_key {
            Some(secret) => bool::from(supplied.ct_eq(secret.as_bytes())),
            None => false,
        };

        if !matches {
            tracing::warn!("Pingback rejected: wrong API key");
            return Err(not_authorized());
        }

        Ok(())
    }
}

impl std::fmt::Debug for PingbackAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PingbackAuthenticator")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn not_authorized() -> ApiError {
    ApiError::forbidden("You're not authorized to proceed.")
}

/// Guard for the pingback route.
pub async fn require_pingback_key(
    State(pingback): State<Arc<PingbackAuthenticator>>,
    request: Request,
    next: Next,
) -> Response {
    match pingback.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
