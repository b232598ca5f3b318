use models::validation::Shape;
use models::{ClientFields, ClientPatch, ClientRecord, Stored, CLIENT_SCHEMA};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::pagination::{Cursor, Listing};
use crate::relationship::Relationships;
use crate::repository::Repository;
use crate::storage::Filter;

/// Client operations, always on behalf of an authenticated owner.
///
/// Lookups by id check existence before ownership: another owner's client is
/// reported as forbidden, not as missing.
#[derive(Clone)]
pub struct ClientService {
    repo: Repository,
    links: Relationships,
}

impl ClientService {
    pub fn new(repo: Repository) -> Self {
        let links = Relationships::new(repo.clone());
        Self { repo, links }
    }

    async fn owned(&self, owner: &str, id: i64) -> Result<Stored<ClientRecord>, ServiceError> {
        let client = self.repo.get::<ClientRecord>(id).await?.ok_or_else(ServiceError::no_client)?;
        if !client.data.is_owned_by(owner) {
            return Err(ServiceError::not_owner());
        }
        Ok(client)
    }

    #[instrument(skip(self, owner, body))]
    pub async fn create(&self, owner: &str, body: &[u8]) -> Result<Stored<ClientRecord>, ServiceError> {
        let fields: ClientFields = CLIENT_SCHEMA.parse(Shape::Create, body)?;
        let created = self.repo.create(ClientRecord::new(fields, owner)).await?;
        info!(client_id = created.id, "client_created");
        Ok(created)
    }

    pub async fn list(&self, owner: &str, cursor: Option<Cursor>) -> Result<Listing<ClientRecord>, ServiceError> {
        self.repo.list(Some(Filter::eq("owner", owner)), cursor).await
    }

    pub async fn get(&self, owner: &str, id: i64) -> Result<Stored<ClientRecord>, ServiceError> {
        self.owned(owner, id).await
    }

    #[instrument(skip(self, owner, body))]
    pub async fn replace(&self, owner: &str, id: i64, body: &[u8]) -> Result<Stored<ClientRecord>, ServiceError> {
        let mut client = self.owned(owner, id).await?;
        let fields: ClientFields = CLIENT_SCHEMA.parse(Shape::Replace, body)?;
        client.data.replace(fields);
        self.repo.put(&client).await?;
        info!(client_id = id, "client_replaced");
        Ok(client)
    }

    #[instrument(skip(self, owner, body))]
    pub async fn patch(&self, owner: &str, id: i64, body: &[u8]) -> Result<Stored<ClientRecord>, ServiceError> {
        let mut client = self.owned(owner, id).await?;
        let patch: ClientPatch = CLIENT_SCHEMA.parse(Shape::Patch, body)?;
        client.data.apply(patch);
        self.repo.put(&client).await?;
        info!(client_id = id, "client_patched");
        Ok(client)
    }

    pub async fn delete(&self, owner: &str, id: i64) -> Result<(), ServiceError> {
        let client = self.owned(owner, id).await?;
        self.links.delete_client(client).await
    }

    pub async fn assign_service(&self, owner: &str, client_id: i64, service_id: i64) -> Result<(), ServiceError> {
        self.links.assign(owner, client_id, service_id).await
    }

    pub async fn unlink_service(&self, owner: &str, client_id: i64, service_id: i64) -> Result<(), ServiceError> {
        self.links.unlink(owner, client_id, service_id).await
    }
}
