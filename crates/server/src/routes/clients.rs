use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::pagination::parse_cursor;
use service::ServiceError;
use tracing::info;

use super::auth::{Caller, ServerState};
use super::{parse_id, ListParams};
use crate::errors::ApiError;
use crate::responder::{client_view, envelope, ClientView, Origin, CLIENTS};

#[utoipa::path(
    post, path = "/clients", tag = "clients",
    request_body = crate::openapi::ClientInput,
    responses(
        (status = 201, description = "Created", body = ClientView),
        (status = 400, description = "Invalid attributes"),
        (status = 401, description = "Missing or invalid JWTs"),
        (status = 406, description = "Not acceptable"),
        (status = 415, description = "Unsupported media type")
    ),
    security(("bearer" = []))
)]
pub async fn create(
    State(state): State<ServerState>,
    origin: Origin,
    caller: Caller,
    body: Bytes,
) -> Result<Response, ApiError> {
    let created = state.clients.create(caller.subject(), &body).await?;
    let view = client_view(&origin, created);
    info!(client_id = view.id, "client created");
    Ok((StatusCode::CREATED, [(header::LOCATION, view.self_link.clone())], Json(view)).into_response())
}

#[utoipa::path(
    get, path = "/clients", tag = "clients",
    params(ListParams),
    responses((status = 200, description = "The caller's clients, five per page"), (status = 401, description = "Missing or invalid JWTs")),
    security(("bearer" = []))
)]
pub async fn list(
    State(state): State<ServerState>,
    origin: Origin,
    caller: Caller,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cursor = parse_cursor(params.cursor.as_deref()).map_err(ServiceError::from)?;
    let listing = state.clients.list(caller.subject(), cursor).await?;
    Ok(Json(envelope(&origin, CLIENTS, "clients", listing, |c| client_view(&origin, c))))
}

#[utoipa::path(
    get, path = "/clients/{id}", tag = "clients",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "OK", body = ClientView),
        (status = 403, description = "Owned by someone else"),
        (status = 404, description = "No such client")
    ),
    security(("bearer" = []))
)]
pub async fn get(
    State(state): State<ServerState>,
    origin: Origin,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ClientView>, ApiError> {
    let id = parse_id(&id, ServiceError::no_client)?;
    let client = state.clients.get(caller.subject(), id).await?;
    Ok(Json(client_view(&origin, client)))
}

#[utoipa::path(
    put, path = "/clients/{id}", tag = "clients",
    params(("id" = i64, Path, description = "Client id")),
    request_body = crate::openapi::ClientInput,
    responses(
        (status = 200, description = "Replaced; Location points at the client", body = ClientView),
        (status = 400, description = "Invalid attributes"),
        (status = 403, description = "Immutable attribute or not the owner"),
        (status = 404, description = "No such client")
    ),
    security(("bearer" = []))
)]
pub async fn replace(
    State(state): State<ServerState>,
    origin: Origin,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, ServiceError::no_client)?;
    let client = state.clients.replace(caller.subject(), id, &body).await?;
    let view = client_view(&origin, client);
    Ok((StatusCode::OK, [(header::LOCATION, view.self_link.clone())], Json(view)).into_response())
}

#[utoipa::path(
    patch, path = "/clients/{id}", tag = "clients",
    params(("id" = i64, Path, description = "Client id")),
    request_body = crate::openapi::ClientPatchInput,
    responses(
        (status = 200, description = "Updated", body = ClientView),
        (status = 400, description = "Invalid attributes"),
        (status = 403, description = "Immutable attribute or not the owner"),
        (status = 404, description = "No such client")
    ),
    security(("bearer" = []))
)]
pub async fn patch(
    State(state): State<ServerState>,
    origin: Origin,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ClientView>, ApiError> {
    let id = parse_id(&id, ServiceError::no_client)?;
    let client = state.clients.patch(caller.subject(), id, &body).await?;
    Ok(Json(client_view(&origin, client)))
}

#[utoipa::path(
    delete, path = "/clients/{id}", tag = "clients",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 204, description = "Deleted; its service is detached"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such client")
    ),
    security(("bearer" = []))
)]
pub async fn delete(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, ServiceError::no_client)?;
    state.clients.delete(caller.subject(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put, path = "/clients/{id}/services/{service_id}", tag = "clients",
    params(
        ("id" = i64, Path, description = "Client id"),
        ("service_id" = i64, Path, description = "Service id")
    ),
    responses(
        (status = 204, description = "Assigned"),
        (status = 403, description = "Not the owner, or the service already has a client"),
        (status = 404, description = "No such client or service")
    ),
    security(("bearer" = []))
)]
pub async fn assign_service(
    State(state): State<ServerState>,
    caller: Caller,
    Path((client_id, service_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let client_id = parse_id(&client_id, ServiceError::no_client)?;
    let service_id = parse_id(&service_id, ServiceError::no_service)?;
    state.clients.assign_service(caller.subject(), client_id, service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete, path = "/clients/{id}/services/{service_id}", tag = "clients",
    params(
        ("id" = i64, Path, description = "Client id"),
        ("service_id" = i64, Path, description = "Service id")
    ),
    responses(
        (status = 204, description = "Unlinked"),
        (status = 403, description = "Not the owner, or assigned to a different client"),
        (status = 404, description = "No such client or service")
    ),
    security(("bearer" = []))
)]
pub async fn unlink_service(
    State(state): State<ServerState>,
    caller: Caller,
    Path((client_id, service_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let client_id = parse_id(&client_id, ServiceError::no_client)?;
    let service_id = parse_id(&service_id, ServiceError::no_service)?;
    state.clients.unlink_service(caller.subject(), client_id, service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
