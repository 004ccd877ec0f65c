// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::{
    auth::CurrentUser,
    error::{ApiError, Problem},
    models::{
        format_revision_id, revision_id_to_int, CreateLandingRequest, Landing, LandingCreated,
        ListLandingsQuery, NewLanding, PingbackAccepted, PingbackRequest,
    },
    state::AppState,
    transplant::TransplantRequest,
};

fn landing_not_found() -> ApiError {
    ApiError::not_found("Landing not found", "The requested Landing does not exist")
}

#[utoipa::path(
    post,
    path = "/landings",
    request_body = CreateLandingRequest,
    tag = "Landings",
    responses(
        (status = 202, description = "Landing submitted", body = LandingCreated),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
        (status = 403, body = Problem),
        (status = 502, description = "Transplant rejected the landing", body = Problem)
    )
)]
pub async fn post_landing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateLandingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LandingCreated>), ApiError> {
    let Some(email) = user.email() else {
        return Err(ApiError::forbidden(
            "You do not have a Mozilla verified email address.",
        ));
    };
    if !user.can_land_changes() {
        return Err(ApiError::forbidden(
            "You do not have the required permissions to request landing.",
        ));
    }

    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let revision_id = revision_id_to_int(&request.revision_id)?;
    info!(
        revision_id,
        diff_id = request.diff_id,
        requester = %email,
        "Landing requested"
    );

    let config = &state.config;
    let landing = state
        .store
        .create(NewLanding {
            revision_id,
            diff_id: request.diff_id,
            active_diff_id: request.force_override_of_diff_id.unwrap_or(request.diff_id),
            requester_email: email.to_string(),
            tree: config.transplant_tree.clone(),
        })
        .await?;

    let submission = TransplantRequest {
        ldap_username: email.to_string(),
        tree: config.transplant_tree.clone(),
        rev: format_revision_id(revision_id),
        destination: config.transplant_destination.clone(),
        pingback_url: config.pingback_url.clone(),
        push_bookmark: None,
    };

    match state.transplant.land(&submission).await {
        Ok(request_id) => {
            state.store.set_request_id(landing.id, request_id).await?;
            info!(landing_id = landing.id, request_id, "Landing created");
            Ok((StatusCode::ACCEPTED, Json(LandingCreated { id: landing.id })))
        }
        Err(e) => {
            warn!(landing_id = landing.id, revision_id, error = %e, "Error creating landing");
            state.store.mark_failed(landing.id, e.to_string()).await?;
            Err(ApiError::new(
                StatusCode::BAD_GATEWAY,
                "Landing not created",
                "The requested revision does exist, but landing failed. \
                 Please retry your request at a later time.",
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/landings",
    params(ListLandingsQuery),
    tag = "Landings",
    responses(
        (status = 200, body = [Landing]),
        (status = 400, body = Problem)
    )
)]
pub async fn list_landings(
    State(state): State<AppState>,
    query: Result<Query<ListLandingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Landing>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let revision_id = query
        .revision_id
        .as_deref()
        .map(revision_id_to_int)
        .transpose()?;
    Ok(Json(state.store.list(revision_id, query.status).await?))
}

#[utoipa::path(
    get,
    path = "/landings/{landing_id}",
    params(
        ("landing_id" = u64, Path, description = "Identifier of the landing")
    ),
    tag = "Landings",
    responses(
        (status = 200, body = Landing),
        (status = 404, body = Problem)
    )
)]
pub async fn get_landing(
    State(state): State<AppState>,
    Path(landing_id): Path<u64>,
) -> Result<Json<Landing>, ApiError> {
    state
        .store
        .get(landing_id)
        .await?
        .map(Json)
        .ok_or_else(landing_not_found)
}

/// Transplant pingback. Guarded by the `API-Key` header.
#[utoipa::path(
    post,
    path = "/landings/update",
    request_body = PingbackRequest,
    tag = "Landings",
    responses(
        (status = 200, body = PingbackAccepted),
        (status = 403, body = Problem),
        (status = 404, body = Problem)
    )
)]
pub async fn update_landing(
    State(state): State<AppState>,
    body: Result<Json<PingbackRequest>, JsonRejection>,
) -> Result<Json<PingbackAccepted>, ApiError> {
    let Json(pingback) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let landing = state
        .store
        .update_from_transplant(
            pingback.request_id,
            pingback.landed,
            pingback.error_msg.unwrap_or_default(),
            pingback.result.unwrap_or_default(),
        )
        .await?;

    info!(
        landing_id = landing.id,
        request_id = pingback.request_id,
        status = %landing.status,
        "Landing updated from transplant"
    );
    Ok(Json(PingbackAccepted {}))
}
