use models::validation::Shape;
use models::{ServiceFields, ServicePatch, ServiceRecord, Stored, SERVICE_SCHEMA};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::pagination::{Cursor, Listing};
use crate::relationship::Relationships;
use crate::repository::Repository;

/// Service operations. Services have no owner; any authenticated caller may
/// write them and anyone may read them.
#[derive(Clone)]
pub struct ServiceCatalog {
    repo: Repository,
    links: Relationships,
}

impl ServiceCatalog {
    pub fn new(repo: Repository) -> Self {
        let links = Relationships::new(repo.clone());
        Self { repo, links }
    }

    async fn existing(&self, id: i64) -> Result<Stored<ServiceRecord>, ServiceError> {
        self.repo.get::<ServiceRecord>(id).await?.ok_or_else(ServiceError::no_service)
    }

    #[instrument(skip(self, body))]
    pub async fn create(&self, body: &[u8]) -> Result<Stored<ServiceRecord>, ServiceError> {
        let fields: ServiceFields = SERVICE_SCHEMA.parse(Shape::Create, body)?;
        let created = self.repo.create(ServiceRecord::new(fields)).await?;
        info!(service_id = created.id, "service_created");
        Ok(created)
    }

    pub async fn list(&self, cursor: Option<Cursor>) -> Result<Listing<ServiceRecord>, ServiceError> {
        self.repo.list(None, cursor).await
    }

    pub async fn get(&self, id: i64) -> Result<Stored<ServiceRecord>, ServiceError> {
        self.existing(id).await
    }

    #[instrument(skip(self, body))]
    pub async fn replace(&self, id: i64, body: &[u8]) -> Result<Stored<ServiceRecord>, ServiceError> {
        let mut service = self.existing(id).await?;
        let fields: ServiceFields = SERVICE_SCHEMA.parse(Shape::Replace, body)?;
        service.data.replace(fields);
        self.repo.put(&service).await?;
        info!(service_id = id, "service_replaced");
        Ok(service)
    }

    #[instrument(skip(self, body))]
    pub async fn patch(&self, id: i64, body: &[u8]) -> Result<Stored<ServiceRecord>, ServiceError> {
        let mut service = self.existing(id).await?;
        let patch: ServicePatch = SERVICE_SCHEMA.parse(Shape::Patch, body)?;
        service.data.apply(patch);
        self.repo.put(&service).await?;
        info!(service_id = id, "service_patched");
        Ok(service)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let service = self.existing(id).await?;
        self.links.delete_service(service).await
    }
}
