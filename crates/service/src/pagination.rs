//! Pagination utilities for service layer
//!
//! List endpoints serve fixed-size pages and hand out an opaque cursor for
//! the next one. The cursor wraps the id of the last record served; scans
//! run in ascending id order so the next page starts strictly after it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::storage::StoreError;

/// Records per page on every list endpoint.
pub const PAGE_SIZE: u64 = 5;

/// Position after which the next page starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor(pub i64);

impl Cursor {
    pub fn after(id: i64) -> Self {
        Self(id)
    }

    pub fn last_id(self) -> i64 {
        self.0
    }

    pub fn encode(self) -> String {
        URL_SAFE_NO_PAD.encode(format!("after:{}", self.0))
    }

    pub fn decode(token: &str) -> Result<Self, StoreError> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| StoreError::InvalidCursor)?;
        let text = String::from_utf8(bytes).map_err(|_| StoreError::InvalidCursor)?;
        text.strip_prefix("after:")
            .and_then(|id| id.parse::<i64>().ok())
            .map(Cursor)
            .ok_or(StoreError::InvalidCursor)
    }
}

/// Decode an optional `?cursor=` query value.
pub fn parse_cursor(token: Option<&str>) -> Result<Option<Cursor>, StoreError> {
    match token {
        None => Ok(None),
        Some(t) if t.is_empty() => Ok(None),
        Some(t) => Cursor::decode(t).map(Some),
    }
}

/// One page of typed records with the total size of the filtered collection.
#[derive(Clone, Debug)]
pub struct Listing<T> {
    pub records: Vec<models::Stored<T>>,
    pub total: u64,
    pub next: Option<Cursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_survives_encoding() {
        let c = Cursor::after(1234567890123);
        assert_eq!(Cursor::decode(&c.encode()).unwrap(), c);
    }

    #[test]
    fn cursor_is_url_safe() {
        let token = Cursor::after(i64::MAX).encode();
        assert!(token.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        assert!(matches!(Cursor::decode("%%%"), Err(StoreError::InvalidCursor)));
        let not_ours = URL_SAFE_NO_PAD.encode("before:3");
        assert!(matches!(Cursor::decode(&not_ours), Err(StoreError::InvalidCursor)));
    }

    #[test]
    fn empty_cursor_means_first_page() {
        assert_eq!(parse_cursor(None).unwrap(), None);
        assert_eq!(parse_cursor(Some("")).unwrap(), None);
    }
}
