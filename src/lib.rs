// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Landing API - revision landing request service
//!
//! Accepts requests to land reviewed revisions, hands them to the transplant
//! service and records the outcome transplant reports back. Callers are
//! authenticated with identity provider access tokens; transplant
//! authenticates with a shared API key.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Access tokens, userinfo and pingback authentication
//! - `config` - Environment configuration
//! - `store` - Landing persistence
//! - `transplant` - Transplant service client

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
pub mod transplant;
