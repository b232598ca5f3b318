use thiserror::Error;

use crate::storage::StoreError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("signing keys unavailable: {0}")]
    Keys(String),
    #[error("code exchange failed: {0}")]
    Exchange(String),
    #[error("userinfo request failed: {0}")]
    UserInfo(String),
    #[error("state mismatch")]
    StateMismatch,
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::MissingToken => 1001,
            AuthError::InvalidToken(_) => 1002,
            AuthError::Keys(_) => 1003,
            AuthError::Exchange(_) => 1101,
            AuthError::UserInfo(_) => 1102,
            AuthError::StateMismatch => 1103,
            AuthError::Store(_) => 1200,
        }
    }
}
