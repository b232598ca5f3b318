use models::validation::ValidationError;
use models::ModelError;
use thiserror::Error;

use crate::auth::errors::AuthError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("authentication failed: {0}")]
    Auth(AuthError),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("invalid cursor")]
    InvalidCursor,
    #[error("storage error: {0}")]
    Store(StoreError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidCursor => ServiceError::InvalidCursor,
            StoreError::Model(m) => ServiceError::Model(m),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Store(s) => s.into(),
            other => ServiceError::Auth(other),
        }
    }
}

impl ServiceError {
    pub fn no_client() -> Self {
        Self::NotFound("No client with this client_id exists".into())
    }

    pub fn no_service() -> Self {
        Self::NotFound("No service with this service_id exists".into())
    }

    pub fn not_owner() -> Self {
        Self::Forbidden("The user does not have access privileges to this client".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::Kind;

    #[test]
    fn store_errors_map_by_cause() {
        assert!(matches!(ServiceError::from(StoreError::InvalidCursor), ServiceError::InvalidCursor));
        let missing = ServiceError::from(StoreError::Missing { kind: Kind::Client, id: 3 });
        assert!(matches!(missing, ServiceError::Store(_)));
        let bad_token = ServiceError::from(AuthError::MissingToken);
        assert!(matches!(bad_token, ServiceError::Auth(AuthError::MissingToken)));
    }

    #[test]
    fn messages_are_client_facing() {
        assert_eq!(ServiceError::no_client().to_string(), "No client with this client_id exists");
        assert_eq!(
            ServiceError::from(ValidationError::InvalidPrice).to_string(),
            "The price attribute must be a non-negative number"
        );
    }
}
