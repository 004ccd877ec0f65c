// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transplant service integration.
//!
//! Transplant performs the actual push. A landing is handed over with
//! `POST {TRANSPLANT_URL}/autoland`; the outcome arrives later as a
//! pingback on `/landings/update`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum TransplantError {
    #[error("Transplant request failed: {0}")]
    Request(String),

    #[error("Transplant returned HTTP {0}")]
    Status(u16),

    #[error("Transplant response was invalid: {0}")]
    InvalidResponse(String),
}

/// Body of an autoland request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransplantRequest {
    pub ldap_username: String,
    pub tree: String,
    pub rev: String,
    pub destination: String,
    pub pingback_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_bookmark: Option<String>,
}

#[async_trait]
pub trait TransplantClient: Send + Sync {
    /// Submit a landing; returns transplant's request id.
    async fn land(&self, request: &TransplantRequest) -> Result<u64, TransplantError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransplantClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct AutolandResponse {
    request_id: Value,
}

impl HttpTransplantClient {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Client for the configured transplant service, bounded by
    /// `TRANSPLANT_TIMEOUT_SECONDS`.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.transplant_timeout)
            .connect_timeout(config.transplant_timeout)
            .build()?;
        Ok(Self::new(config.transplant_url.clone(), http))
    }

    fn autoland_url(&self) -> String {
        format!("{}/autoland", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TransplantClient for HttpTransplantClient {
    async fn land(&self, request: &TransplantRequest) -> Result<u64, TransplantError> {
        let response = self
            .http
            .post(self.autoland_url())
            .json(request)
            .send()
            .await
            .map_err(|e| TransplantError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransplantError::Status(status.as_u16()));
        }

        let body: AutolandResponse = response
            .json()
            .await
            .map_err(|e| TransplantError::InvalidResponse(e.to_string()))?;

        // Transplant has sent the id both as a number and as a string.
        let request_id = match &body.request_id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            TransplantError::InvalidResponse(format!("unusable request_id {}", body.request_id))
        })?;

        info!(
            request_id,
            rev = %request.rev,
            tree = %request.tree,
            "Landing submitted to transplant"
        );
        Ok(request_id)
    }
}
