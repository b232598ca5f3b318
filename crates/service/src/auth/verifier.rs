use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::warn;

use super::domain::{Claims, Subject, TokenSet, UserInfo};
use super::errors::AuthError;

/// Turns a bearer token into the subject it was issued to.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Subject, AuthError>;
}

/// The authorization-code side of the identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Where to send the browser, carrying `state` back to the callback.
    fn authorization_url(&self, state: &str) -> Result<String, AuthError>;
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError>;
    async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// # Examples
/// ```
/// use service::auth::bearer_token;
/// assert_eq!(bearer_token(Some("Bearer  abc.def")).unwrap(), "abc.def");
/// assert!(bearer_token(Some("Basic abc")).is_err());
/// assert!(bearer_token(None).is_err());
/// ```
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let mut parts = header.ok_or(AuthError::MissingToken)?.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

/// HS256 tokens signed with a configured secret.
pub struct SharedSecretVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    audience: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str, audience: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.into(),
        }
    }

    /// Mint a token for `subject` valid for `ttl_secs`.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{IdentityVerifier, SharedSecretVerifier};
    /// let v = SharedSecretVerifier::new("secret", "client-services");
    /// let token = v.issue("sub-1", 60).unwrap();
    /// let subject = tokio_test::block_on(v.verify(&token)).unwrap();
    /// assert_eq!(subject.as_str(), "sub-1");
    /// ```
    pub fn issue(&self, subject: &str, ttl_secs: i64) -> Result<String, AuthError> {
        let exp = (chrono::Utc::now() + chrono::Duration::seconds(ttl_secs)).timestamp().max(0) as usize;
        let claims = Claims { sub: subject.to_string(), aud: self.audience.clone(), iss: None, exp };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(err = %e, "bearer token rejected");
            AuthError::InvalidToken(e.to_string())
        })?;
        Ok(Subject(data.claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_shapes() {
        assert_eq!(bearer_token(Some("Bearer tok")).unwrap(), "tok");
        assert_eq!(bearer_token(Some("bearer   tok")).unwrap(), "tok");
        assert!(bearer_token(Some("Bearer")).is_err());
        assert!(bearer_token(Some("Bearer a b")).is_err());
        assert!(bearer_token(Some("")).is_err());
    }

    #[tokio::test]
    async fn issued_tokens_verify_to_their_subject() {
        let v = SharedSecretVerifier::new("s3cret", "client-services");
        let token = v.issue("user-1", 60).unwrap();
        assert_eq!(v.verify(&token).await.unwrap(), Subject::new("user-1"));
    }

    #[tokio::test]
    async fn wrong_secret_audience_or_expiry_is_rejected() {
        let v = SharedSecretVerifier::new("s3cret", "client-services");
        let other_secret = SharedSecretVerifier::new("different", "client-services").issue("u", 60).unwrap();
        let other_aud = SharedSecretVerifier::new("s3cret", "elsewhere").issue("u", 60).unwrap();
        let expired = v.issue("u", -3600).unwrap();
        for token in [other_secret, other_aud, expired, "not-a-jwt".to_string()] {
            assert!(matches!(v.verify(&token).await, Err(AuthError::InvalidToken(_))));
        }
    }
}
