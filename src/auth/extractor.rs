// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Behind the guards these read what the guard left in the request
//! extensions. On a route without a guard they run the same checks
//! themselves, so a handler can never observe an unauthenticated caller.
//!
//! ```rust,ignore
//! async fn post(CurrentUser(user): CurrentUser) -> impl IntoResponse {
//!     // user is AuthorizedUser
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::middleware::{AccessToken, Authenticator};
use super::user::AuthorizedUser;
use crate::error::ApiError;

/// Extractor for a validated access token.
pub struct Access(pub AccessToken);

impl<S> FromRequestParts<S> for Access
where
    Arc<Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(access) = parts.extensions.get::<AccessToken>().cloned() {
            return Ok(Access(access));
        }

        let auth = Arc::<Authenticator>::from_ref(state);
        let access = auth.authenticate(&parts.headers).await?;
        parts.extensions.insert(access.clone());
        Ok(Access(access))
    }
}

/// Extractor for the caller's resolved profile.
pub struct CurrentUser(pub AuthorizedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthorizedUser>().cloned() {
            return Ok(CurrentUser(user));
        }

        let Access(access) = Access::from_request_parts(parts, state).await?;
        let auth = Arc::<Authenticator>::from_ref(state);
        let user = auth.authorize(&access).await?;
        parts.extensions.insert(user.clone());
        Ok(CurrentUser(user))
    }
}
