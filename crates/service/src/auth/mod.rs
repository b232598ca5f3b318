//! Auth module: identity verification and the OAuth login flow.
//!
//! - `verifier` turns a bearer token into a [`Subject`] (HS256 shared secret).
//! - `google` talks to Google: RS256 ID tokens checked against cached JWKS,
//!   authorization URL, code exchange and userinfo.
//! - `service` completes a login and lazily registers the user.

pub mod domain;
pub mod errors;
pub mod google;
pub mod service;
pub mod verifier;

pub use domain::{LoginOutcome, Subject, TokenSet, UserInfo};
pub use errors::AuthError;
pub use google::GoogleIdentity;
pub use service::AuthService;
pub use verifier::{bearer_token, IdentityVerifier, OAuthProvider, SharedSecretVerifier};
