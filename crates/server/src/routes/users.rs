use axum::extract::{Query, State};
use axum::Json;
use service::pagination::parse_cursor;
use service::ServiceError;

use super::auth::ServerState;
use super::ListParams;
use crate::errors::ApiError;
use crate::responder::{envelope, user_view, Origin, USERS};

#[utoipa::path(
    get, path = "/users", tag = "users",
    params(ListParams),
    responses((status = 200, description = "Registered users, five per page"))
)]
pub async fn list(
    State(state): State<ServerState>,
    origin: Origin,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cursor = parse_cursor(params.cursor.as_deref()).map_err(ServiceError::from)?;
    let listing = state.users.list(cursor).await?;
    Ok(Json(envelope(&origin, USERS, "users", listing, user_view)))
}
