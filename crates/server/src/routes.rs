pub mod auth;
pub mod clients;
pub mod oauth;
pub mod services;
pub mod users;

use axum::{
    middleware,
    routing::{get, put, MethodRouter},
    Json, Router,
};
use serde::Deserialize;
use service::ServiceError;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::errors::ApiError;
use crate::metrics;
use crate::negotiation::{require_accept_json, require_json};
use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Opaque position returned in a previous page's `next` link.
    pub cursor: Option<String>,
}

/// Path ids are store-assigned integers; anything else cannot name a record.
pub(crate) fn parse_id(raw: &str, missing: fn() -> ServiceError) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| missing().into())
}

async fn collection_405() -> ApiError {
    ApiError::MethodNotAllowed("GET, POST")
}

async fn users_405() -> ApiError {
    ApiError::MethodNotAllowed("GET")
}

// Negotiation wraps only the methods a route serves, so unsupported verbs
// reach the 405 fallback whatever their headers say.
fn with_body(routes: MethodRouter<ServerState>) -> MethodRouter<ServerState> {
    routes.route_layer(middleware::from_fn(require_json))
}

fn without_body(routes: MethodRouter<ServerState>) -> MethodRouter<ServerState> {
    routes.route_layer(middleware::from_fn(require_accept_json))
}

/// Build the full application router: resources, OAuth flow, health, metrics and docs
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let resources = Router::new()
        .route("/clients", with_body(get(clients::list).post(clients::create)).fallback(collection_405))
        .route(
            "/clients/:id",
            with_body(get(clients::get).put(clients::replace).patch(clients::patch).delete(clients::delete)),
        )
        .route("/services", with_body(get(services::list).post(services::create)).fallback(collection_405))
        .route(
            "/services/:id",
            with_body(get(services::get).put(services::replace).patch(services::patch).delete(services::delete)),
        );

    let links = Router::new()
        .route(
            "/clients/:id/services/:service_id",
            without_body(put(clients::assign_service).delete(clients::unlink_service)),
        )
        .route("/users", without_body(get(users::list)).fallback(users_405));

    let public = Router::new()
        .route("/", get(oauth::index))
        .route("/authorize", get(oauth::authorize))
        .route("/oauth", get(oauth::callback))
        .route("/health", get(health))
        .route("/metrics", get(metrics::render));

    Router::new()
        .merge(resources)
        .merge(links)
        .merge(public)
        .route_layer(middleware::from_fn_with_state(state.metrics.clone(), metrics::track))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
