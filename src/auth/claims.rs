// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token extraction and validated claim sets.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::{HeaderProblem, TokenError};

const BEARER_SCHEME: &str = "Bearer";

/// Raw bearer token taken from an `Authorization: Bearer <token>` header.
///
/// The token itself is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Parse the `Authorization` header of a request.
    ///
    /// The header must be exactly `Bearer <token>`: case-sensitive scheme,
    /// one space, a non-empty token and nothing after it.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, TokenError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(TokenError::HeaderMalformed(HeaderProblem::Missing))?
            .to_str()
            .map_err(|_| TokenError::HeaderMalformed(HeaderProblem::NotAscii))?;
        Self::parse(value)
    }

    /// Parse a raw `Authorization` header value.
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        if value.is_empty() {
            return Err(TokenError::HeaderMalformed(HeaderProblem::Empty));
        }

        let mut parts = value.split(' ');
        if parts.next() != Some(BEARER_SCHEME) {
            return Err(TokenError::HeaderMalformed(HeaderProblem::WrongScheme));
        }

        let token = match parts.next() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(TokenError::HeaderMalformed(HeaderProblem::MissingToken)),
        };

        if parts.next().is_some() || token.chars().any(char::is_whitespace) {
            return Err(TokenError::HeaderMalformed(HeaderProblem::ExtraTokens));
        }

        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// `aud` is either a single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum AudienceClaim {
    Single(String),
    Many(Vec<String>),
}

/// Claims as they come off the wire, before they are wrapped.
#[derive(Debug, Deserialize)]
pub(super) struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    pub iss: String,
    pub aud: AudienceClaim,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token payload that passed signature, expiry, issuer and audience checks.
///
/// Only [`TokenValidator`](super::TokenValidator) creates these.
#[derive(Debug, Clone)]
pub struct ValidatedClaims {
    subject: Option<String>,
    expires_at: i64,
    issuer: String,
    audience: Vec<String>,
    extra: Map<String, Value>,
}

impl ValidatedClaims {
    pub(super) fn from_verified(claims: TokenClaims) -> Self {
        let audience = match claims.aud {
            AudienceClaim::Single(aud) => vec![aud],
            AudienceClaim::Many(auds) => auds,
        };
        Self {
            subject: claims.sub,
            expires_at: claims.exp,
            issuer: claims.iss,
            audience,
            extra: claims.extra,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Expiry as a Unix timestamp.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// Any non-registered claim, e.g. a namespaced groups claim.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}
