// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{
    Authenticator, IdentityResolver, KeySetCache, PingbackAuthenticator, TokenValidator,
};
use crate::config::Config;
use crate::store::LandingStore;
use crate::transplant::TransplantClient;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<Authenticator>,
    pub pingback: Arc<PingbackAuthenticator>,
    pub store: Arc<dyn LandingStore>,
    pub transplant: Arc<dyn TransplantClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn LandingStore>,
        transplant: Arc<dyn TransplantClient>,
    ) -> Result<Self, StateError> {
        // One client for JWKS and userinfo so both share the provider timeout.
        let provider_http = reqwest::Client::builder()
            .timeout(config.auth0_timeout)
            .connect_timeout(config.auth0_timeout)
            .build()?;

        let keys = Arc::new(
            KeySetCache::new(config.jwks_url.clone(), provider_http.clone())
                .with_cache_ttl(config.jwks_cache_ttl),
        );
        let validator = TokenValidator::new(keys, config.issuer.clone(), config.audience.clone())
            .with_leeway(config.token_leeway);
        let resolver = IdentityResolver::new(config.userinfo_url.clone(), provider_http);
        let auth = Authenticator::new(
            validator,
            resolver,
            config.groups_claim.clone(),
            Arc::clone(&config.landing_groups),
        );
        let pingback =
            PingbackAuthenticator::new(config.pingback_enabled, config.transplant_api_key.clone());

        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            pingback: Arc::new(pingback),
            store,
            transplant,
        })
    }
}

impl FromRef<AppState> for Arc<Authenticator> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.auth)
    }
}

impl FromRef<AppState> for Arc<PingbackAuthenticator> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.pingback)
    }
}
