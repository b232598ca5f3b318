//! Service layer providing the business rules on top of models.
//! - `storage`: the document store trait and its backends.
//! - `repository`: typed record access over a store.
//! - `relationship`: the Client ↔ Service link rules and delete cascades.
//! - `client_service`, `service_catalog`, `user_service`: per-resource operations.
//! - `auth`: bearer token verification and the OAuth login flow.

pub mod errors;
pub mod auth;
pub mod pagination;
pub mod storage;
pub mod repository;
pub mod relationship;
pub mod client_service;
pub mod service_catalog;
pub mod user_service;
#[cfg(test)]
pub mod test_support;

pub use client_service::ClientService;
pub use errors::ServiceError;
pub use repository::Repository;
pub use service_catalog::ServiceCatalog;
pub use user_service::UserService;
