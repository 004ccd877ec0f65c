// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! OIDC bearer-token authentication for the landing API, plus the
//! shared-secret check on transplant pingbacks.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with the identity provider (Auth0)
//! 2. Client sends `Authorization: Bearer <access token>`
//! 3. Server:
//!    - Fetches the provider's JWKS (cached, refreshed on unknown `kid`)
//!    - Verifies signature, then expiry, issuer and audience
//!    - Exchanges the token at the userinfo endpoint
//!    - Derives verified email and group membership
//!
//! ## Security
//!
//! - The verification algorithm comes from the JWK, not the token header
//! - Claims are only inspected after the signature verifies
//! - Pingback secrets are compared in constant time

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod pingback;
pub mod user;
pub mod userinfo;
pub mod validator;

#[cfg(test)]
pub(crate) mod testutil;

pub use claims::{BearerToken, ValidatedClaims};
pub use error::{HeaderProblem, KeyFetchError, TokenError, UserinfoError};
pub use extractor::{Access, CurrentUser};
pub use jwks::KeySetCache;
pub use middleware::{require_access_token, require_auth0_userinfo, AccessToken, Authenticator};
pub use pingback::{require_pingback_key, PingbackAuthenticator};
pub use user::{AuthorizedUser, GroupsClaim};
pub use userinfo::{IdentityResolver, UserInfo};
pub use validator::TokenValidator;
