use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::pagination::parse_cursor;
use service::ServiceError;

use super::auth::{Caller, ServerState};
use super::{parse_id, ListParams};
use crate::errors::ApiError;
use crate::responder::{envelope, service_view, Origin, ServiceView, SERVICES};

#[utoipa::path(
    post, path = "/services", tag = "services",
    request_body = crate::openapi::ServiceInput,
    responses(
        (status = 201, description = "Created, unassigned", body = ServiceView),
        (status = 400, description = "Invalid attributes"),
        (status = 401, description = "Missing or invalid JWTs")
    ),
    security(("bearer" = []))
)]
pub async fn create(
    State(state): State<ServerState>,
    origin: Origin,
    _caller: Caller,
    body: Bytes,
) -> Result<Response, ApiError> {
    let created = state.services.create(&body).await?;
    let view = service_view(&origin, created);
    Ok((StatusCode::CREATED, [(header::LOCATION, view.self_link.clone())], Json(view)).into_response())
}

#[utoipa::path(
    get, path = "/services", tag = "services",
    params(ListParams),
    responses((status = 200, description = "All services, five per page"))
)]
pub async fn list(
    State(state): State<ServerState>,
    origin: Origin,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cursor = parse_cursor(params.cursor.as_deref()).map_err(ServiceError::from)?;
    let listing = state.services.list(cursor).await?;
    Ok(Json(envelope(&origin, SERVICES, "services", listing, |s| service_view(&origin, s))))
}

#[utoipa::path(
    get, path = "/services/{id}", tag = "services",
    params(("id" = i64, Path, description = "Service id")),
    responses((status = 200, description = "OK", body = ServiceView), (status = 404, description = "No such service"))
)]
pub async fn get(
    State(state): State<ServerState>,
    origin: Origin,
    Path(id): Path<String>,
) -> Result<Json<ServiceView>, ApiError> {
    let id = parse_id(&id, ServiceError::no_service)?;
    let service = state.services.get(id).await?;
    Ok(Json(service_view(&origin, service)))
}

#[utoipa::path(
    put, path = "/services/{id}", tag = "services",
    params(("id" = i64, Path, description = "Service id")),
    request_body = crate::openapi::ServiceInput,
    responses(
        (status = 200, description = "Replaced; Location points at the service", body = ServiceView),
        (status = 400, description = "Invalid attributes"),
        (status = 403, description = "Immutable attribute"),
        (status = 404, description = "No such service")
    ),
    security(("bearer" = []))
)]
pub async fn replace(
    State(state): State<ServerState>,
    origin: Origin,
    _caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, ServiceError::no_service)?;
    let service = state.services.replace(id, &body).await?;
    let view = service_view(&origin, service);
    Ok((StatusCode::OK, [(header::LOCATION, view.self_link.clone())], Json(view)).into_response())
}

#[utoipa::path(
    patch, path = "/services/{id}", tag = "services",
    params(("id" = i64, Path, description = "Service id")),
    request_body = crate::openapi::ServicePatchInput,
    responses(
        (status = 200, description = "Updated", body = ServiceView),
        (status = 400, description = "Invalid attributes"),
        (status = 403, description = "Immutable attribute"),
        (status = 404, description = "No such service")
    ),
    security(("bearer" = []))
)]
pub async fn patch(
    State(state): State<ServerState>,
    origin: Origin,
    _caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ServiceView>, ApiError> {
    let id = parse_id(&id, ServiceError::no_service)?;
    let service = state.services.patch(id, &body).await?;
    Ok(Json(service_view(&origin, service)))
}

#[utoipa::path(
    delete, path = "/services/{id}", tag = "services",
    params(("id" = i64, Path, description = "Service id")),
    responses(
        (status = 204, description = "Deleted; detached from its client"),
        (status = 404, description = "No such service")
    ),
    security(("bearer" = []))
)]
pub async fn delete(
    State(state): State<ServerState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, ServiceError::no_service)?;
    state.services.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
