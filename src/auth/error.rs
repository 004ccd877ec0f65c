// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Each failure kind carries its own HTTP status, title and detail so that
//! operators can tell client misuse apart from identity-provider outages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Why an `Authorization` header was rejected before any token work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProblem {
    /// No `Authorization` header at all
    Missing,
    /// Header present but empty
    Empty,
    /// Header is not valid visible ASCII
    NotAscii,
    /// Scheme other than `Bearer`
    WrongScheme,
    /// `Bearer` without a token
    MissingToken,
    /// More than one token after the scheme
    ExtraTokens,
}

impl HeaderProblem {
    fn title(&self) -> &'static str {
        match self {
            HeaderProblem::Missing => "Authorization Header Required",
            _ => "Authorization Header Invalid",
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            HeaderProblem::Missing => "Authorization header is required and was not provided",
            HeaderProblem::Empty => "Authorization header must not be empty",
            HeaderProblem::NotAscii => "Authorization header contains invalid characters",
            HeaderProblem::WrongScheme => "Authorization header must begin with Bearer",
            HeaderProblem::MissingToken => "Token not found in Authorization header",
            HeaderProblem::ExtraTokens => "Authorization header must be a Bearer token",
        }
    }
}

/// Failure to fetch or decode the signing key set.
#[derive(Debug, thiserror::Error)]
pub enum KeyFetchError {
    #[error("JWKS request failed: {0}")]
    Request(String),

    #[error("JWKS endpoint returned HTTP {0}")]
    Status(StatusCode),

    #[error("JWKS response was invalid: {0}")]
    InvalidResponse(String),
}

/// Access token validation failure.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed authorization header: {0:?}")]
    HeaderMalformed(HeaderProblem),

    #[error("token header could not be parsed")]
    TokenMalformed,

    #[error("no signing key matches the token")]
    KeyNotFound,

    #[error("token has expired")]
    TokenExpired,

    #[error("token claims are invalid")]
    InvalidClaims,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error(transparent)]
    KeyFetch(#[from] KeyFetchError),
}

impl TokenError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenError::HeaderMalformed(_)
            | TokenError::TokenExpired
            | TokenError::InvalidClaims
            | TokenError::SignatureInvalid => StatusCode::UNAUTHORIZED,
            TokenError::TokenMalformed | TokenError::KeyNotFound => StatusCode::BAD_REQUEST,
            TokenError::KeyFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TokenError::HeaderMalformed(problem) => problem.title(),
            TokenError::TokenMalformed
            | TokenError::KeyNotFound
            | TokenError::SignatureInvalid => "Authorization Header Invalid",
            TokenError::TokenExpired => "Token Expired",
            TokenError::InvalidClaims => "Invalid Claims",
            TokenError::KeyFetch(_) => "Auth0 Key Fetch Error",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            TokenError::HeaderMalformed(problem) => problem.detail(),
            TokenError::TokenMalformed => "Unable to parse authorization token",
            TokenError::KeyNotFound => {
                "Appropriate key for Authorization header could not be found"
            }
            TokenError::TokenExpired => "Token has expired",
            TokenError::InvalidClaims => "Invalid Authorization token claims",
            TokenError::SignatureInvalid => "Authorization token signature could not be verified",
            TokenError::KeyFetch(_) => {
                "Unable to retrieve signing keys from the authentication server, try again later"
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::new(err.status_code(), err.title(), err.detail())
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Userinfo exchange failure.
#[derive(Debug, thiserror::Error)]
pub enum UserinfoError {
    #[error("userinfo request timed out")]
    Timeout,

    #[error("could not connect to userinfo endpoint: {0}")]
    ConnectionProblem(String),

    #[error("userinfo response was malformed: {0}")]
    HttpError(String),

    #[error("userinfo endpoint rate limited the request")]
    RateLimited,

    #[error("userinfo endpoint rejected the token")]
    Unauthorized,

    #[error("userinfo response was not a valid document: {0}")]
    ResponseNotJson(String),

    #[error("userinfo endpoint returned HTTP {0}")]
    UnexpectedStatus(StatusCode),

    #[error("userinfo request failed: {0}")]
    Request(String),
}

impl UserinfoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserinfoError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            UserinfoError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            UserinfoError::Timeout => "Auth0 Timeout",
            UserinfoError::ConnectionProblem(_) => "Auth0 Connection Problem",
            UserinfoError::HttpError(_)
            | UserinfoError::ResponseNotJson(_)
            | UserinfoError::UnexpectedStatus(_) => "Auth0 Response Error",
            UserinfoError::RateLimited => "Auth0 Rate Limit",
            UserinfoError::Unauthorized => "Auth0 Userinfo Unauthorized",
            UserinfoError::Request(_) => "Auth0 Error",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            UserinfoError::Timeout => "Authentication server timed out, try again later",
            UserinfoError::ConnectionProblem(_) => {
                "Can't connect to authentication server, try again later"
            }
            UserinfoError::HttpError(_)
            | UserinfoError::ResponseNotJson(_)
            | UserinfoError::UnexpectedStatus(_) => {
                "Authentication server response was invalid, try again later"
            }
            UserinfoError::RateLimited => {
                "Too many requests to the authentication server, try again later"
            }
            UserinfoError::Unauthorized => "Unauthorized to access userinfo, check openid scope",
            UserinfoError::Request(_) => "Problem communicating with Auth0, try again later",
        }
    }
}

impl From<UserinfoError> for ApiError {
    fn from(err: UserinfoError) -> Self {
        ApiError::new(err.status_code(), err.title(), err.detail())
    }
}

impl IntoResponse for UserinfoError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
