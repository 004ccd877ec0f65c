// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Cache policy
//!
//! - The key set is held as an `Arc` snapshot; a refresh swaps the whole
//!   snapshot, readers never observe a partially updated set
//! - Snapshots expire after a TTL
//! - A token whose `kid` is not in the snapshot triggers at most one
//!   refresh, and refreshes are throttled by a minimum interval so that
//!   garbage key ids cannot drive the provider into rate limiting
//! - Fetch failures are surfaced, never retried here; a readiness check
//!   after a failure waits out the same minimum interval before refetching

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::error::{KeyFetchError, TokenError};

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum spacing between refreshes triggered by unknown key ids.
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

struct CacheEntry {
    jwks: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Process-wide cache of the identity provider's signing keys.
pub struct KeySetCache {
    jwks_url: String,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    cache: RwLock<Option<CacheEntry>>,
    last_failure: RwLock<Option<Instant>>,
    client: reqwest::Client,
}

impl KeySetCache {
    /// Create a cache for the given JWKS endpoint.
    ///
    /// The client is expected to carry the outbound timeouts.
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: RwLock::new(None),
            last_failure: RwLock::new(None),
            client,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Current key set, fetching it if absent or expired.
    pub async fn get_keys(&self) -> Result<Arc<JwkSet>, KeyFetchError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(Arc::clone(&entry.jwks));
                }
            }
        }

        self.refresh().await
    }

    /// Fetch the key set unconditionally and replace the snapshot.
    pub async fn refresh(&self) -> Result<Arc<JwkSet>, KeyFetchError> {
        let jwks = match self.fetch_jwks().await {
            Ok(jwks) => Arc::new(jwks),
            Err(e) => {
                *self.last_failure.write().await = Some(Instant::now());
                return Err(e);
            }
        };
        *self.last_failure.write().await = None;
        tracing::debug!(
            jwks_url = %self.jwks_url,
            keys = jwks.keys.len(),
            "Signing key set refreshed"
        );

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: Arc::clone(&jwks),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    /// Whether a non-expired snapshot is held.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        match &*cache {
            Some(entry) => entry.fetched_at.elapsed() < self.cache_ttl,
            None => false,
        }
    }

    /// Whether keys can be served right now.
    ///
    /// Fetches when the snapshot is missing or expired, but not again within
    /// the minimum refresh interval of a failed fetch.
    pub async fn check_available(&self) -> bool {
        if self.is_cached().await {
            return true;
        }
        if let Some(failed_at) = *self.last_failure.read().await {
            if failed_at.elapsed() < self.min_refresh_interval {
                return false;
            }
        }
        match self.refresh().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(jwks_url = %self.jwks_url, error = %e, "Signing key set unavailable");
                false
            }
        }
    }

    /// Look up a key by id, refreshing once on a miss.
    pub async fn find(&self, kid: &str) -> Result<Option<Jwk>, KeyFetchError> {
        let jwks = self.get_keys().await?;
        if let Some(jwk) = jwks.find(kid) {
            return Ok(Some(jwk.clone()));
        }

        if !self.refresh_allowed().await {
            return Ok(None);
        }

        tracing::info!(kid, "Unknown signing key id, refreshing key set");
        let jwks = self.refresh().await?;
        Ok(jwks.find(kid).cloned())
    }

    /// Decoding key and algorithm for the given key id.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), TokenError> {
        let jwk = self.find(kid).await?.ok_or(TokenError::KeyNotFound)?;
        jwk_to_decoding_key(&jwk).ok_or(TokenError::KeyNotFound)
    }

    async fn refresh_allowed(&self) -> bool {
        let cache = self.cache.read().await;
        match &*cache {
            Some(entry) => entry.fetched_at.elapsed() >= self.min_refresh_interval,
            None => true,
        }
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, KeyFetchError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status()));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| KeyFetchError::InvalidResponse(e.to_string()))
    }
}

/// Signing algorithm named by a JWK `alg` member, if it is one we verify.
fn signing_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

/// Convert a JWK to a decoding key.
///
/// The algorithm comes from the key, never from the token header.
fn jwk_to_decoding_key(jwk: &Jwk) -> Option<(DecodingKey, Algorithm)> {
    let declared = jwk.common.key_algorithm.and_then(signing_algorithm);

    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e).ok()?;
            Some((key, declared.unwrap_or(Algorithm::RS256)))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y).ok()?;
            let default = match ec.curve {
                EllipticCurve::P384 => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Some((key, declared.unwrap_or(default)))
        }
        AlgorithmParameters::OctetKeyPair(okp) => {
            let key = DecodingKey::from_ed_components(&okp.x).ok()?;
            Some((key, declared.unwrap_or(Algorithm::EdDSA)))
        }
        AlgorithmParameters::OctetKey(oct) => {
            let key = DecodingKey::from_base64_secret(&oct.value).ok()?;
            Some((key, declared.unwrap_or(Algorithm::HS256)))
        }
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
