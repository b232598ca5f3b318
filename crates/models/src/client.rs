use serde::{Deserialize, Serialize};

use crate::kind::Kind;
use crate::validation::{FieldRule, Schema, IMMUTABLE_ATTRIBUTES};
use crate::Record;

pub static CLIENT_SCHEMA: Schema = Schema {
    fields: &[
        ("name", FieldRule::Text),
        ("contact_manager", FieldRule::Text),
        ("email", FieldRule::Email),
    ],
    immutable: IMMUTABLE_ATTRIBUTES,
};

/// Reference from a client to one of its services.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub id: i64,
}

/// Stored client document. `owner` is the subject id of the creator and never
/// changes; `services` is only touched by the relationship operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub name: String,
    pub contact_manager: String,
    pub email: String,
    pub owner: String,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
}

impl Record for ClientRecord {
    const KIND: Kind = Kind::Client;
}

/// Body of `POST /clients` and `PUT /clients/:id`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientFields {
    pub name: String,
    pub contact_manager: String,
    pub email: String,
}

/// Body of `PATCH /clients/:id`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub contact_manager: Option<String>,
    pub email: Option<String>,
}

impl ClientRecord {
    pub fn new(fields: ClientFields, owner: impl Into<String>) -> Self {
        Self {
            name: fields.name,
            contact_manager: fields.contact_manager,
            email: fields.email,
            owner: owner.into(),
            services: Vec::new(),
        }
    }

    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner == subject
    }

    pub fn holds_service(&self, service_id: i64) -> bool {
        self.services.iter().any(|s| s.id == service_id)
    }

    pub fn attach_service(&mut self, service_id: i64) {
        if !self.holds_service(service_id) {
            self.services.push(ServiceRef { id: service_id });
        }
    }

    /// Drop every reference to `service_id`, keeping the others in order.
    pub fn detach_service(&mut self, service_id: i64) -> bool {
        let before = self.services.len();
        self.services.retain(|s| s.id != service_id);
        self.services.len() != before
    }

    pub fn replace(&mut self, fields: ClientFields) {
        self.name = fields.name;
        self.contact_manager = fields.contact_manager;
        self.email = fields.email;
    }

    pub fn apply(&mut self, patch: ClientPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(contact_manager) = patch.contact_manager {
            self.contact_manager = contact_manager;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
    }
}
