use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::auth::AuthError;
use service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// Every failure a handler can answer with. Bodies are `{"Error": "<reason>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Server only accepts application/json data")]
    UnsupportedMediaType,
    #[error("Client must accept application/json")]
    NotAcceptable,
    #[error("Missing or invalid JWTs")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed(&'static str),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let allowed = match &self {
            ApiError::MethodNotAllowed(methods) => Some(*methods),
            _ => None,
        };
        let mut resp = (status, Json(ErrorBody::new(self.to_string()))).into_response();
        if let Some(methods) = allowed {
            resp.headers_mut().insert(header::ACCEPT, HeaderValue::from_static(methods));
        }
        resp
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Exchange(_) => ApiError::BadRequest("The authorization code could not be exchanged".into()),
            AuthError::StateMismatch => ApiError::BadRequest("The state parameter does not match".into()),
            AuthError::Store(e) => ServiceError::from(e).into(),
            _ => ApiError::Unauthorized,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(v) if v.is_forbidden() => ApiError::Forbidden(v.to_string()),
            ServiceError::Validation(v) => ApiError::BadRequest(v.to_string()),
            ServiceError::Auth(a) => a.into(),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::InvalidCursor => ApiError::BadRequest("The cursor is invalid".into()),
            ServiceError::Store(e) => {
                error!(err = %e, "store failure");
                ApiError::Internal
            }
            ServiceError::Model(e) => {
                error!(err = %e, "stored document could not be read");
                ApiError::Internal
            }
        }
    }
}

/// Log and convert a bearer-token failure without echoing its cause.
pub fn unauthorized(e: AuthError) -> ApiError {
    warn!(code = e.code(), "request rejected: {e}");
    ApiError::Unauthorized
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::validation::ValidationError;
    use service::storage::StoreError;

    #[test]
    fn validation_errors_split_between_400_and_403() {
        let bad: ApiError = ServiceError::from(ValidationError::MissingAttribute).into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let forbidden: ApiError = ServiceError::from(ValidationError::ImmutableAttribute("owner".into())).into();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_failures_do_not_leak_detail() {
        let e: ApiError = ServiceError::from(StoreError::Backend("connection reset by 10.0.0.3".into())).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Internal server error");
    }

    #[test]
    fn oauth_failures_map_by_step() {
        assert_eq!(ApiError::from(AuthError::Exchange("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(AuthError::UserInfo("x".into())).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::InvalidToken("x".into())).status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn method_not_allowed_names_allowed_methods() {
        let resp = ApiError::MethodNotAllowed("GET, POST").into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[header::ACCEPT], "GET, POST");
    }
}
