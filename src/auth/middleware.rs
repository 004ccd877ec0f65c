// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication guards for Axum.
//!
//! Two guards wrap route subtrees:
//!
//! - [`require_access_token`] verifies the bearer token and stores an
//!   [`AccessToken`] in the request extensions
//! - [`require_auth0_userinfo`] additionally exchanges the token for a
//!   userinfo profile and stores an [`AuthorizedUser`]
//!
//! The userinfo guard reuses an `AccessToken` left by an outer
//! `require_access_token` layer and validates the token itself otherwise, so
//! either guard works alone.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/landings", post(landings::post))
//!     .layer(from_fn_with_state(auth.clone(), require_auth0_userinfo))
//!     .layer(from_fn_with_state(auth.clone(), require_access_token));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::claims::{BearerToken, ValidatedClaims};
use super::error::{TokenError, UserinfoError};
use super::user::AuthorizedUser;
use super::userinfo::IdentityResolver;
use super::validator::TokenValidator;

/// A bearer token that passed validation, with its claims.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: BearerToken,
    pub claims: ValidatedClaims,
}

/// Everything the guards need, built once at startup.
pub struct Authenticator {
    validator: TokenValidator,
    resolver: IdentityResolver,
    groups_claim: String,
    landing_groups: Arc<[String]>,
}

impl Authenticator {
    pub fn new(
        validator: TokenValidator,
        resolver: IdentityResolver,
        groups_claim: impl Into<String>,
        landing_groups: Arc<[String]>,
    ) -> Self {
        Self {
            validator,
            resolver,
            groups_claim: groups_claim.into(),
            landing_groups,
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Extract and validate the bearer token of a request.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AccessToken, TokenError> {
        let token = BearerToken::from_headers(headers)?;
        let claims = self.validator.validate(&token).await?;
        Ok(AccessToken { token, claims })
    }

    /// Exchange a validated token for the caller's profile.
    pub async fn authorize(&self, access: &AccessToken) -> Result<AuthorizedUser, UserinfoError> {
        let userinfo = self.resolver.resolve(&access.token).await?;
        Ok(AuthorizedUser::new(
            access.token.clone(),
            userinfo,
            &self.groups_claim,
            Arc::clone(&self.landing_groups),
        ))
    }
}

/// Reject requests without a valid access token.
pub async fn require_access_token(
    State(auth): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.authenticate(request.headers()).await {
        Ok(access) => {
            request.extensions_mut().insert(access);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %request.uri().path(), "Access token rejected");
            e.into_response()
        }
    }
}

/// Reject requests whose caller cannot be resolved to a userinfo profile.
pub async fn require_auth0_userinfo(
    State(auth): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let access = match request.extensions().get::<AccessToken>().cloned() {
        Some(access) => access,
        None => match auth.authenticate(request.headers()).await {
            Ok(access) => {
                request.extensions_mut().insert(access.clone());
                access
            }
            Err(e) => {
                tracing::debug!(error = %e, path = %request.uri().path(), "Access token rejected");
                return e.into_response();
            }
        },
    };

    match auth.authorize(&access).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                subject = access.claims.subject().unwrap_or_default(),
                "Userinfo exchange failed"
            );
            e.into_response()
        }
    }
}
