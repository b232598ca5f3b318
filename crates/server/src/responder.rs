//! Turns stored records into API representations with self links, and lists
//! into `{ <name>: [...], items, next? }` envelopes.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use models::{ClientRecord, ServiceRecord, Stored, UserRecord};
use serde::Serialize;
use serde_json::{Map, Value};
use service::pagination::{Cursor, Listing};
use utoipa::ToSchema;

pub const CLIENTS: &str = "/clients";
pub const SERVICES: &str = "/services";
pub const USERS: &str = "/users";

/// Scheme and host the request was addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
}

impl Origin {
    pub fn link(&self, mount: &str, id: i64) -> String {
        format!("{}://{}{}/{}", self.scheme, self.host, mount, id)
    }

    pub fn next_page(&self, mount: &str, cursor: Cursor) -> String {
        format!("{}://{}{}?cursor={}", self.scheme, self.host, mount, cursor.encode())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Origin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let scheme = header_str("x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| v == "http" || v == "https")
            .unwrap_or_else(|| "http".to_string());
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        Ok(Origin { scheme, host })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Link {
    pub id: i64,
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientView {
    pub id: i64,
    pub name: String,
    pub contact_manager: String,
    pub email: String,
    pub owner: String,
    pub services: Vec<Link>,
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceView {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = f64)]
    pub price: serde_json::Number,
    pub client: Option<Link>,
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    pub id: i64,
    pub subject: String,
}

pub fn client_view(origin: &Origin, client: Stored<ClientRecord>) -> ClientView {
    let Stored { id, data } = client;
    ClientView {
        id,
        services: data
            .services
            .iter()
            .map(|s| Link { id: s.id, self_link: origin.link(SERVICES, s.id) })
            .collect(),
        name: data.name,
        contact_manager: data.contact_manager,
        email: data.email,
        owner: data.owner,
        self_link: origin.link(CLIENTS, id),
    }
}

pub fn service_view(origin: &Origin, service: Stored<ServiceRecord>) -> ServiceView {
    let Stored { id, data } = service;
    ServiceView {
        id,
        client: data.client.map(|c| Link { id: c.id, self_link: origin.link(CLIENTS, c.id) }),
        name: data.name,
        kind: data.kind,
        price: data.price,
        self_link: origin.link(SERVICES, id),
    }
}

pub fn user_view(user: Stored<UserRecord>) -> UserView {
    UserView { id: user.id, subject: user.data.subject }
}

/// Build the list envelope. `next` appears only when another page exists.
pub fn envelope<T, V: Serialize>(
    origin: &Origin,
    mount: &str,
    name: &str,
    listing: Listing<T>,
    view: impl Fn(Stored<T>) -> V,
) -> Value {
    let items: Vec<Value> = listing
        .records
        .into_iter()
        .map(|r| serde_json::to_value(view(r)).unwrap_or(Value::Null))
        .collect();
    let mut body = Map::new();
    body.insert(name.to_string(), Value::Array(items));
    body.insert("items".to_string(), Value::from(listing.total));
    if let Some(cursor) = listing.next {
        body.insert("next".to_string(), Value::String(origin.next_page(mount, cursor)));
    }
    Value::Object(body)
}
