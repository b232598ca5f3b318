//! Domain records and the attribute rules that guard them.
//!
//! Records are stored as JSON documents; [`Record`] ties each type to its
//! [`Kind`] and converts between the typed form and the stored body.

pub mod errors;
pub mod db;
pub mod document;
pub mod kind;
pub mod validation;
pub mod client;
pub mod service;
pub mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use client::{ClientFields, ClientPatch, ClientRecord, ServiceRef, CLIENT_SCHEMA};
pub use errors::ModelError;
pub use kind::Kind;
pub use service::{ClientRef, ServiceFields, ServicePatch, ServiceRecord, SERVICE_SCHEMA};
pub use user::UserRecord;

/// A typed document stored under a fixed kind.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const KIND: Kind;

    fn to_document(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::Validation(e.to_string()))
    }

    fn from_document(id: i64, doc: Value) -> Result<Self, ModelError> {
        serde_json::from_value(doc).map_err(|e| ModelError::Corrupt {
            kind: Self::KIND.as_str(),
            id,
            reason: e.to_string(),
        })
    }
}

/// A record together with the id the store assigned to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<T> {
    pub id: i64,
    pub data: T,
}

impl<T> Stored<T> {
    pub fn new(id: i64, data: T) -> Self {
        Self { id, data }
    }
}
