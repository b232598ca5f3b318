use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::kind::Kind;
use crate::validation::{FieldRule, Schema, IMMUTABLE_ATTRIBUTES};
use crate::Record;

pub static SERVICE_SCHEMA: Schema = Schema {
    fields: &[
        ("name", FieldRule::Text),
        ("type", FieldRule::Text),
        ("price", FieldRule::NonNegativeNumber),
    ],
    immutable: IMMUTABLE_ATTRIBUTES,
};

/// Reference from a service back to the client it is assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: i64,
}

/// Stored service document. `client` is `None` while unassigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: Number,
    #[serde(default)]
    pub client: Option<ClientRef>,
}

impl Record for ServiceRecord {
    const KIND: Kind = Kind::Service;
}

/// Body of `POST /services` and `PUT /services/:id`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceFields {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: Number,
}

/// Body of `PATCH /services/:id`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServicePatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub price: Option<Number>,
}

impl ServiceRecord {
    pub fn new(fields: ServiceFields) -> Self {
        Self { name: fields.name, kind: fields.kind, price: fields.price, client: None }
    }

    pub fn client_id(&self) -> Option<i64> {
        self.client.map(|c| c.id)
    }

    pub fn is_assigned(&self) -> bool {
        self.client.is_some()
    }

    pub fn is_assigned_to(&self, client_id: i64) -> bool {
        self.client_id() == Some(client_id)
    }

    pub fn assign_to(&mut self, client_id: i64) {
        self.client = Some(ClientRef { id: client_id });
    }

    pub fn unassign(&mut self) {
        self.client = None;
    }

    pub fn replace(&mut self, fields: ServiceFields) {
        self.name = fields.name;
        self.kind = fields.kind;
        self.price = fields.price;
    }

    pub fn apply(&mut self, patch: ServicePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}
