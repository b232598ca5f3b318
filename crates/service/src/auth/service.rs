use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::domain::LoginOutcome;
use super::errors::AuthError;
use super::verifier::OAuthProvider;
use crate::errors::ServiceError;
use crate::user_service::UserService;

/// Completes the authorization-code flow. Each login returns its tokens to
/// its own caller; nothing is kept between requests.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn OAuthProvider>,
    users: UserService,
}

impl AuthService {
    pub fn new(provider: Arc<dyn OAuthProvider>, users: UserService) -> Self {
        Self { provider, users }
    }

    pub fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        self.provider.authorization_url(state)
    }

    /// Exchange `code`, look up the profile and register the subject on first login.
    #[instrument(skip_all)]
    pub async fn complete_login(&self, code: &str) -> Result<LoginOutcome, ServiceError> {
        let tokens = self.provider.exchange_code(code).await.map_err(|e| {
            warn!(err = %e, "code exchange failed");
            ServiceError::Auth(e)
        })?;
        let profile = self.provider.user_info(&tokens.access_token).await.map_err(|e| {
            warn!(err = %e, "userinfo lookup failed");
            ServiceError::Auth(e)
        })?;
        let (user, created) = self.users.ensure_user(&profile.id).await?;
        info!(user_id = user.id, created, "login_completed");
        Ok(LoginOutcome {
            name: profile.name,
            subject: profile.id,
            id_token: tokens.id_token,
            user_id: user.id,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{TokenSet, UserInfo};
    use crate::test_support::memory_repo;
    use async_trait::async_trait;

    struct FakeProvider;

    #[async_trait]
    impl OAuthProvider for FakeProvider {
        fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
            Ok(format!("https://idp.test/auth?state={state}"))
        }
        async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
            if code == "good" {
                Ok(TokenSet { access_token: "at".into(), id_token: "idt".into() })
            } else {
                Err(AuthError::Exchange("invalid_grant".into()))
            }
        }
        async fn user_info(&self, _access_token: &str) -> Result<UserInfo, AuthError> {
            Ok(UserInfo { id: "sub-42".into(), name: "Ada".into() })
        }
    }

    #[tokio::test]
    async fn login_registers_subject_once() -> Result<(), anyhow::Error> {
        let users = UserService::new(memory_repo());
        let auth = AuthService::new(Arc::new(FakeProvider), users.clone());
        let first = auth.complete_login("good").await?;
        assert!(first.created);
        assert_eq!(first.subject, "sub-42");
        assert_eq!(first.id_token, "idt");
        let second = auth.complete_login("good").await?;
        assert!(!second.created);
        assert_eq!(second.user_id, first.user_id);
        assert_eq!(users.list(None).await?.total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_exchange_creates_nothing() -> Result<(), anyhow::Error> {
        let users = UserService::new(memory_repo());
        let auth = AuthService::new(Arc::new(FakeProvider), users.clone());
        let err = auth.complete_login("bad").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::Exchange(_))));
        assert_eq!(users.list(None).await?.total, 0);
        Ok(())
    }
}
