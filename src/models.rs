// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the landings API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and the
//! OpenAPI document.
//!
//! ## Revision Identifiers
//!
//! Revisions are addressed externally as `D<integer>` (for example `D123`)
//! and stored as the bare integer. [`revision_id_to_int`] performs the
//! conversion and rejects anything else with a 400.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

// =============================================================================
// Revision Identifiers
// =============================================================================

/// Parse a `D<integer>` revision identifier.
pub fn revision_id_to_int(revision_id: &str) -> Result<u64, ApiError> {
    revision_id
        .strip_prefix('D')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            ApiError::bad_request("Revision IDs must be of the form 'D<integer>'.")
        })
}

pub fn format_revision_id(revision_id: u64) -> String {
    format!("D{revision_id}")
}

// =============================================================================
// Landing
// =============================================================================

/// Lifecycle of a landing request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LandingStatus {
    /// Accepted by the transplant service, waiting for its pingback.
    Submitted,
    Landed,
    Failed,
    Aborted,
}

impl std::fmt::Display for LandingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LandingStatus::Submitted => "submitted",
            LandingStatus::Landed => "landed",
            LandingStatus::Failed => "failed",
            LandingStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// A stored landing request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Landing {
    pub id: u64,
    /// Transplant request id; absent until transplant accepted the request.
    pub request_id: Option<u64>,
    /// Revision in `D<integer>` form.
    pub revision_id: String,
    pub diff_id: u64,
    /// The diff that was active when the landing was requested.
    pub active_diff_id: u64,
    pub requester_email: String,
    pub tree: String,
    pub status: LandingStatus,
    /// Transplant error message when the landing failed.
    pub error: String,
    /// Pushed changeset when the landing succeeded.
    pub result: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a landing.
#[derive(Debug, Clone)]
pub struct NewLanding {
    pub revision_id: u64,
    pub diff_id: u64,
    pub active_diff_id: u64,
    pub requester_email: String,
    pub tree: String,
}

/// Request to land a revision.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLandingRequest {
    /// Revision to land, for example `D123`.
    pub revision_id: String,
    pub diff_id: u64,
    /// Land this diff even if it is not the newest one of the revision.
    #[serde(default)]
    pub force_override_of_diff_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LandingCreated {
    pub id: u64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLandingsQuery {
    /// Only landings of this revision (`D<integer>`).
    pub revision_id: Option<String>,
    pub status: Option<LandingStatus>,
}

// =============================================================================
// Transplant Pingback
// =============================================================================

/// Result notification sent by the transplant service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PingbackRequest {
    pub request_id: u64,
    pub landed: bool,
    #[serde(default)]
    pub tree: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub trysyntax: Option<String>,
    /// Empty when `landed` is true.
    #[serde(default)]
    pub error_msg: Option<String>,
    /// Pushed changeset; empty when `landed` is false.
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PingbackAccepted {}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn revision_ids_parse() {
        assert_eq!(revision_id_to_int("D123").unwrap(), 123);
        assert_eq!(revision_id_to_int("D0").unwrap(), 0);
        assert_eq!(format_revision_id(42), "D42");
    }

    #[test]
    fn malformed_revision_ids_are_bad_requests() {
        for raw in ["123", "D", "d123", "D12a", "D-1", "D 1", ""] {
            let err = revision_id_to_int(raw).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "{raw:?}");
            assert_eq!(err.title, "Bad Request");
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(LandingStatus::Submitted).unwrap(),
            serde_json::json!("submitted")
        );
        let status: LandingStatus = serde_json::from_str("\"aborted\"").unwrap();
        assert_eq!(status, LandingStatus::Aborted);
        assert_eq!(LandingStatus::Landed.to_string(), "landed");
    }

    #[test]
    fn pingback_optional_fields_default() {
        let pingback: PingbackRequest =
            serde_json::from_value(serde_json::json!({ "request_id": 3, "landed": false }))
                .unwrap();
        assert_eq!(pingback.request_id, 3);
        assert!(!pingback.landed);
        assert!(pingback.error_msg.is_none());
        assert!(pingback.result.is_none());
    }
}
