// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Userinfo exchange with the identity provider.
//!
//! Every way the call can fail maps to its own [`UserinfoError`] variant:
//! a timeout calls for a retry, a 429 for backoff, a 401 for a new token.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::claims::BearerToken;
use super::error::UserinfoError;

/// Profile document returned by the userinfo endpoint.
///
/// Members other than the standard ones (such as the namespaced groups
/// claim) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client for the identity provider's userinfo endpoint.
pub struct IdentityResolver {
    userinfo_url: String,
    client: reqwest::Client,
}

impl IdentityResolver {
    /// The client is expected to carry the outbound timeouts.
    pub fn new(userinfo_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            userinfo_url: userinfo_url.into(),
            client,
        }
    }

    pub fn userinfo_url(&self) -> &str {
        &self.userinfo_url
    }

    pub async fn resolve(&self, token: &BearerToken) -> Result<UserInfo, UserinfoError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(classify_transport)?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(UserinfoError::RateLimited),
            StatusCode::UNAUTHORIZED => return Err(UserinfoError::Unauthorized),
            status => return Err(UserinfoError::UnexpectedStatus(status)),
        }

        let body = response.bytes().await.map_err(classify_transport)?;
        serde_json::from_slice(&body).map_err(|e| UserinfoError::ResponseNotJson(e.to_string()))
    }
}

fn classify_transport(err: reqwest::Error) -> UserinfoError {
    if err.is_timeout() {
        UserinfoError::Timeout
    } else if err.is_connect() {
        UserinfoError::ConnectionProblem(err.to_string())
    } else if err.is_body() || err.is_decode() || err.is_redirect() || is_protocol_error(&err) {
        UserinfoError::HttpError(err.to_string())
    } else {
        UserinfoError::Request(err.to_string())
    }
}

/// Whether the peer answered with something that is not valid HTTP.
fn is_protocol_error(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            return hyper_err.is_parse()
                || hyper_err.is_parse_status()
                || hyper_err.is_incomplete_message();
        }
        source = cause.source();
    }
    false
}
