//! Pieces shared by every crate in the workspace: wire types, logging setup
//! and runtime directory helpers.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn error_body_uses_capitalized_key() {
        let body = types::ErrorBody::new("Missing or invalid JWTs");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"Error": "Missing or invalid JWTs"}));
    }
}
