//! Client ↔ Service links.
//!
//! A service is either unassigned (`client: null`) or assigned to exactly one
//! client, and that client's `services` list then references it. Both sides
//! are written back in a single [`Repository::commit`].
//!
//! The read and the commit are separate store calls; two concurrent assigns
//! of the same service can both pass the checks. The store backends serialize
//! the commits but do not re-check them.

use models::{ClientRecord, ServiceRecord, Stored};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::repository::{delete_write, put_write, Repository};

#[derive(Clone)]
pub struct Relationships {
    repo: Repository,
}

impl Relationships {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    async fn load_pair(
        &self,
        owner: &str,
        client_id: i64,
        service_id: i64,
    ) -> Result<(Stored<ClientRecord>, Stored<ServiceRecord>), ServiceError> {
        let client = self.repo.get::<ClientRecord>(client_id).await?.ok_or_else(ServiceError::no_client)?;
        let service = self.repo.get::<ServiceRecord>(service_id).await?.ok_or_else(ServiceError::no_service)?;
        if !client.data.is_owned_by(owner) {
            return Err(ServiceError::not_owner());
        }
        Ok((client, service))
    }

    /// Link an unassigned service to a client that holds none yet.
    #[instrument(skip(self, owner))]
    pub async fn assign(&self, owner: &str, client_id: i64, service_id: i64) -> Result<(), ServiceError> {
        let (mut client, mut service) = self.load_pair(owner, client_id, service_id).await?;
        if service.data.is_assigned() {
            return Err(ServiceError::Forbidden("The service already has a client".into()));
        }
        if !client.data.services.is_empty() {
            return Err(ServiceError::Forbidden("The client already has a service".into()));
        }

        client.data.attach_service(service.id);
        service.data.assign_to(client.id);
        self.repo.commit(vec![put_write(&service)?, put_write(&client)?]).await?;
        info!(client_id, service_id, "service_assigned");
        Ok(())
    }

    /// Break the link if the service is assigned to this client. Unlinking an
    /// unassigned service succeeds without writing anything.
    #[instrument(skip(self, owner))]
    pub async fn unlink(&self, owner: &str, client_id: i64, service_id: i64) -> Result<(), ServiceError> {
        let (mut client, mut service) = self.load_pair(owner, client_id, service_id).await?;
        match service.data.client_id() {
            None => return Ok(()),
            Some(id) if id != client.id => {
                return Err(ServiceError::Forbidden("The service is assigned to a different client".into()));
            }
            Some(_) => {}
        }

        client.data.detach_service(service.id);
        service.data.unassign();
        self.repo.commit(vec![put_write(&service)?, put_write(&client)?]).await?;
        info!(client_id, service_id, "service_unlinked");
        Ok(())
    }

    /// Delete a client, first detaching every service it references.
    #[instrument(skip(self, client), fields(client_id = client.id))]
    pub async fn delete_client(&self, client: Stored<ClientRecord>) -> Result<(), ServiceError> {
        let mut writes = Vec::with_capacity(client.data.services.len() + 1);
        for service_ref in &client.data.services {
            let Some(mut service) = self.repo.get::<ServiceRecord>(service_ref.id).await? else {
                continue;
            };
            if service.data.is_assigned_to(client.id) {
                service.data.unassign();
                writes.push(put_write(&service)?);
            }
        }
        let detached = writes.len();
        writes.push(delete_write::<ClientRecord>(client.id));
        self.repo.commit(writes).await?;
        info!(detached, "client_deleted");
        Ok(())
    }

    /// Delete a service, first removing it from its client's `services`.
    #[instrument(skip(self, service), fields(service_id = service.id))]
    pub async fn delete_service(&self, service: Stored<ServiceRecord>) -> Result<(), ServiceError> {
        let mut writes = Vec::with_capacity(2);
        if let Some(client_id) = service.data.client_id() {
            if let Some(mut client) = self.repo.get::<ClientRecord>(client_id).await? {
                if client.data.detach_service(service.id) {
                    writes.push(put_write(&client)?);
                }
            }
        }
        writes.push(delete_write::<ServiceRecord>(service.id));
        self.repo.commit(writes).await?;
        info!("service_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_repo;
    use models::{ClientFields, ServiceFields, ServiceRef};
    use serde_json::Number;

    async fn seed(repo: &Repository, owner: &str) -> (Stored<ClientRecord>, Stored<ServiceRecord>) {
        let client = repo
            .create(ClientRecord::new(
                ClientFields { name: "Acme".into(), contact_manager: "Wile".into(), email: "w@acme.test".into() },
                owner,
            ))
            .await
            .unwrap();
        let service = repo
            .create(ServiceRecord::new(ServiceFields { name: "Tow".into(), kind: "hourly".into(), price: Number::from(50) }))
            .await
            .unwrap();
        (client, service)
    }

    async fn reload(repo: &Repository, c: i64, s: i64) -> (Option<Stored<ClientRecord>>, Option<Stored<ServiceRecord>>) {
        (repo.get(c).await.unwrap(), repo.get(s).await.unwrap())
    }

    #[tokio::test]
    async fn assign_then_unlink_round_trip() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c, s) = seed(&repo, "alice").await;

        rel.assign("alice", c.id, s.id).await?;
        let (client, service) = reload(&repo, c.id, s.id).await;
        assert_eq!(client.unwrap().data.services, vec![ServiceRef { id: s.id }]);
        assert!(service.unwrap().data.is_assigned_to(c.id));

        rel.unlink("alice", c.id, s.id).await?;
        let (client, service) = reload(&repo, c.id, s.id).await;
        assert!(client.unwrap().data.services.is_empty());
        assert_eq!(service.unwrap().data.client, None);
        Ok(())
    }

    #[tokio::test]
    async fn assigning_an_assigned_service_changes_nothing() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c1, s) = seed(&repo, "alice").await;
        let (c2, _) = seed(&repo, "alice").await;
        rel.assign("alice", c1.id, s.id).await?;

        let err = rel.assign("alice", c2.id, s.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m.contains("already has a client")));
        let (client2, service) = reload(&repo, c2.id, s.id).await;
        assert!(client2.unwrap().data.services.is_empty());
        assert!(service.unwrap().data.is_assigned_to(c1.id));
        Ok(())
    }

    #[tokio::test]
    async fn client_holds_at_most_one_service() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c, s1) = seed(&repo, "alice").await;
        let (_, s2) = seed(&repo, "alice").await;
        rel.assign("alice", c.id, s1.id).await?;
        let err = rel.assign("alice", c.id, s2.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let (_, service2) = reload(&repo, c.id, s2.id).await;
        assert_eq!(service2.unwrap().data.client, None);
        Ok(())
    }

    #[tokio::test]
    async fn existence_is_checked_before_ownership() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c, s) = seed(&repo, "alice").await;
        assert!(matches!(rel.assign("bob", c.id, 999).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(rel.assign("bob", 999, s.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(rel.assign("bob", c.id, s.id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(rel.unlink("bob", c.id, s.id).await, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unlink_of_unassigned_service_is_a_no_op() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c, s) = seed(&repo, "alice").await;
        rel.unlink("alice", c.id, s.id).await?;
        let (_, service) = reload(&repo, c.id, s.id).await;
        assert_eq!(service.unwrap().data.client, None);
        Ok(())
    }

    #[tokio::test]
    async fn unlink_from_the_wrong_client_is_forbidden() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c1, s) = seed(&repo, "alice").await;
        let (c2, _) = seed(&repo, "alice").await;
        rel.assign("alice", c1.id, s.id).await?;
        assert!(matches!(rel.unlink("alice", c2.id, s.id).await, Err(ServiceError::Forbidden(_))));
        let (_, service) = reload(&repo, c1.id, s.id).await;
        assert!(service.unwrap().data.is_assigned_to(c1.id));
        Ok(())
    }

    #[tokio::test]
    async fn deleting_a_client_detaches_its_service() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c, s) = seed(&repo, "alice").await;
        rel.assign("alice", c.id, s.id).await?;
        let client = repo.get::<ClientRecord>(c.id).await?.unwrap();

        rel.delete_client(client).await?;
        let (client, service) = reload(&repo, c.id, s.id).await;
        assert!(client.is_none());
        assert_eq!(service.unwrap().data.client, None);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_a_service_detaches_it_from_its_client() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (c, s) = seed(&repo, "alice").await;
        rel.assign("alice", c.id, s.id).await?;
        let service = repo.get::<ServiceRecord>(s.id).await?.unwrap();

        rel.delete_service(service).await?;
        let (client, service) = reload(&repo, c.id, s.id).await;
        assert!(service.is_none());
        assert!(client.unwrap().data.services.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn client_delete_skips_dangling_references() -> Result<(), anyhow::Error> {
        let repo = memory_repo();
        let rel = Relationships::new(repo.clone());
        let (mut c, _) = seed(&repo, "alice").await;
        c.data.services = vec![ServiceRef { id: 12345 }];
        repo.put(&c).await?;
        rel.delete_client(c.clone()).await?;
        assert!(repo.get::<ClientRecord>(c.id).await?.is_none());
        Ok(())
    }
}
