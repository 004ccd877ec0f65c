// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_auth0_userinfo, require_pingback_key},
    error::Problem,
    models::{
        CreateLandingRequest, Landing, LandingCreated, LandingStatus, PingbackAccepted,
        PingbackRequest,
    },
    state::AppState,
};

pub mod health;
pub mod landings;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let request_landing = post(landings::post_landing).route_layer(from_fn_with_state(
        state.auth.clone(),
        require_auth0_userinfo,
    ));
    let pingback = post(landings::update_landing).route_layer(from_fn_with_state(
        state.pingback.clone(),
        require_pingback_key,
    ));

    let routes = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/landings",
            get(landings::list_landings).merge(request_landing),
        )
        .route("/landings/update", pingback)
        .route("/landings/{landing_id}", get(landings::get_landing))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let http_layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id));

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(http_layers)
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        landings::post_landing,
        landings::list_landings,
        landings::get_landing,
        landings::update_landing
    ),
    components(
        schemas(
            Landing,
            LandingStatus,
            LandingCreated,
            CreateLandingRequest,
            PingbackRequest,
            PingbackAccepted,
            Problem,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Landings", description = "Landing requests and transplant pingbacks"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::{test_config, test_state};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use wiremock::MockServer;

    #[tokio::test]
    async fn liveness_route_sets_request_id() {
        let server = MockServer::start().await;
        let app = router(test_state(test_config(&server)));

        let response = app
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn existing_request_id_is_propagated() {
        let server = MockServer::start().await;
        let app = router(test_state(test_config(&server)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    }

    #[test]
    fn openapi_lists_landing_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/landings"));
        assert!(doc.paths.paths.contains_key("/landings/update"));
        assert!(doc.paths.paths.contains_key("/landings/{landing_id}"));
    }
}
