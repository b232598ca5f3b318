use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use service::auth::{bearer_token, AuthService, IdentityVerifier, OAuthProvider, Subject};
use service::storage::DocumentStore;
use service::{ClientService, Repository, ServiceCatalog, UserService};

use crate::errors::{unauthorized, ApiError};
use crate::metrics::Metrics;

/// Everything the handlers share.
#[derive(Clone)]
pub struct ServerState {
    pub clients: ClientService,
    pub services: ServiceCatalog,
    pub users: UserService,
    pub login: AuthService,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub metrics: Arc<Metrics>,
}

impl ServerState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn IdentityVerifier>,
        provider: Arc<dyn OAuthProvider>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let repo = Repository::new(store);
        let users = UserService::new(repo.clone());
        Self {
            clients: ClientService::new(repo.clone()),
            services: ServiceCatalog::new(repo),
            login: AuthService::new(provider, users.clone()),
            users,
            verifier,
            metrics,
        }
    }
}

impl FromRef<ServerState> for Arc<Metrics> {
    fn from_ref(state: &ServerState) -> Self {
        state.metrics.clone()
    }
}

/// The authenticated caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct Caller(pub Subject);

impl Caller {
    pub fn subject(&self) -> &str {
        self.0.as_str()
    }
}

#[async_trait]
impl FromRequestParts<ServerState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
        let token = bearer_token(header).map_err(unauthorized)?;
        let subject = state.verifier.verify(token).await.map_err(unauthorized)?;
        Ok(Caller(subject))
    }
}
