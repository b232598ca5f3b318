use std::sync::Arc;

use models::{Stored, UserRecord};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::pagination::{Cursor, Listing};
use crate::repository::Repository;
use crate::storage::Filter;

/// Users are created on first login and only ever listed afterwards.
///
/// Registration is serialized within the process so two first logins for the
/// same subject cannot both create a record. Across processes the PostgreSQL
/// backend's unique subject index is what keeps subjects unique; the losing
/// insert then resolves to the winner's record.
#[derive(Clone)]
pub struct UserService {
    repo: Repository,
    registering: Arc<Mutex<()>>,
}

impl UserService {
    pub fn new(repo: Repository) -> Self {
        Self { repo, registering: Arc::new(Mutex::new(())) }
    }

    pub async fn find_by_subject(&self, subject: &str) -> Result<Option<Stored<UserRecord>>, ServiceError> {
        self.repo.find_one(Filter::eq("subject", subject)).await
    }

    /// Return the user for `subject`, creating it if this is its first login.
    /// The flag is true when a record was created.
    #[instrument(skip(self))]
    pub async fn ensure_user(&self, subject: &str) -> Result<(Stored<UserRecord>, bool), ServiceError> {
        if let Some(existing) = self.find_by_subject(subject).await? {
            return Ok((existing, false));
        }
        let _guard = self.registering.lock().await;
        if let Some(existing) = self.find_by_subject(subject).await? {
            return Ok((existing, false));
        }
        match self.repo.create(UserRecord { subject: subject.to_string() }).await {
            Ok(created) => {
                info!(user_id = created.id, "user_registered");
                Ok((created, true))
            }
            Err(e) => match self.find_by_subject(subject).await? {
                Some(existing) => {
                    warn!(user_id = existing.id, "concurrent registration resolved to existing user");
                    Ok((existing, false))
                }
                None => Err(e),
            },
        }
    }

    pub async fn list(&self, cursor: Option<Cursor>) -> Result<Listing<UserRecord>, ServiceError> {
        self.repo.list(None, cursor).await
    }
}
