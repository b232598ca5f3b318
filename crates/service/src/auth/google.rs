use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use configs::OAuthConfig;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::domain::{Claims, Subject, TokenSet, UserInfo};
use super::errors::AuthError;
use super::verifier::{IdentityVerifier, OAuthProvider};

const JWKS_TTL: Duration = Duration::from_secs(3600);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: String,
}

/// Google as identity provider: ID token verification and the
/// authorization-code flow.
#[derive(Clone)]
pub struct GoogleIdentity {
    http: reqwest::Client,
    cfg: OAuthConfig,
    keys: Cache<String, Arc<JwkSet>>,
}

impl GoogleIdentity {
    pub fn new(cfg: OAuthConfig) -> Self {
        let keys = Cache::builder().max_capacity(1).time_to_live(JWKS_TTL).build();
        Self { http: reqwest::Client::new(), cfg, keys }
    }

    async fn key_set(&self) -> Result<Arc<JwkSet>, AuthError> {
        let uri = self.cfg.jwks_uri.clone();
        let http = self.http.clone();
        self.keys
            .try_get_with(uri.clone(), async move {
                debug!(%uri, "fetching signing keys");
                let set = http
                    .get(&uri)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| e.to_string())?
                    .json::<JwkSet>()
                    .await
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>(Arc::new(set))
            })
            .await
            .map_err(|e| AuthError::Keys(e.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::RS256);
        v.set_audience(&[self.cfg.client_id.as_str()]);
        v.set_issuer(&self.cfg.issuers);
        v
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentity {
    #[instrument(skip_all)]
    async fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let kid = header.kid.ok_or_else(|| AuthError::InvalidToken("token has no key id".into()))?;

        let mut set = self.key_set().await?;
        if set.find(&kid).is_none() {
            // Keys rotate; refetch once before giving up.
            self.keys.invalidate(&self.cfg.jwks_uri).await;
            set = self.key_set().await?;
        }
        let jwk = set.find(&kid).ok_or_else(|| AuthError::InvalidToken(format!("unknown key id {kid}")))?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| AuthError::Keys(e.to_string()))?;

        let data = decode::<Claims>(token, &key, &self.validation()).map_err(|e| {
            warn!(err = %e, "id token rejected");
            AuthError::InvalidToken(e.to_string())
        })?;
        Ok(Subject(data.claims.sub))
    }
}

#[async_trait]
impl OAuthProvider for GoogleIdentity {
    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let scope = self.cfg.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.cfg.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.cfg.client_id.as_str()),
                ("redirect_uri", self.cfg.redirect_url.as_str()),
                ("scope", scope.as_str()),
                ("access_type", "online"),
                ("include_granted_scopes", "true"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Exchange(e.to_string()))?;
        Ok(url.into())
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        let form = [
            ("code", code),
            ("client_id", self.cfg.client_id.as_str()),
            ("client_secret", self.cfg.client_secret.as_str()),
            ("redirect_uri", self.cfg.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let resp = self
            .http
            .post(&self.cfg.token_uri)
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Exchange(e.to_string()))?;
        let tokens: TokenResponse = resp.json().await.map_err(|e| AuthError::Exchange(e.to_string()))?;
        Ok(TokenSet { access_token: tokens.access_token, id_token: tokens.id_token })
    }

    #[instrument(skip_all)]
    async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        self.http
            .get(&self.cfg.userinfo_uri)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::UserInfo(e.to_string()))?
            .json::<UserInfo>()
            .await
            .map_err(|e| AuthError::UserInfo(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> OAuthConfig {
        OAuthConfig {
            client_id: "cid.apps.googleusercontent.com".into(),
            redirect_url: "http://localhost:8080/oauth".into(),
            ..OAuthConfig::default()
        }
    }

    #[test]
    fn authorization_url_carries_flow_parameters() {
        let url = GoogleIdentity::new(cfg()).authorization_url("st4te").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        assert_eq!(params["state"], "st4te");
        assert_eq!(params["access_type"], "online");
        assert_eq!(params["include_granted_scopes"], "true");
        assert_eq!(params["scope"], "openid profile email");
        assert_eq!(params["redirect_uri"], "http://localhost:8080/oauth");
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_before_key_lookup() {
        let err = GoogleIdentity::new(cfg()).verify("garbage").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
