use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::Kind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use super::{DocumentStore, Filter, Page, Query, StoreError, Write};

#[derive(Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: i64,
    /// Keyed by [`Kind::as_str`].
    documents: BTreeMap<String, BTreeMap<i64, Value>>,
}

impl Snapshot {
    fn collection(&self, kind: Kind) -> Option<&BTreeMap<i64, Value>> {
        self.documents.get(kind.as_str())
    }

    fn contains(&self, kind: Kind, id: i64) -> bool {
        self.collection(kind).is_some_and(|c| c.contains_key(&id))
    }

    fn apply(&mut self, write: Write) {
        match write {
            Write::Put { kind, id, body } => {
                self.documents.entry(kind.as_str().to_string()).or_default().insert(id, body);
            }
            Write::Delete { kind, id } => {
                if let Some(c) = self.documents.get_mut(kind.as_str()) {
                    c.remove(&id);
                }
            }
        }
    }
}

/// Document store kept in memory and, when given a path, mirrored to a JSON
/// file after every mutation.
///
/// Every mutation runs under one write lock, so multi-record commits are
/// atomic with respect to readers. A file-backed store publishes a change
/// only after the file write for it succeeded.
#[derive(Clone)]
pub struct JsonDocumentStore {
    inner: Arc<RwLock<Snapshot>>,
    file_path: Option<PathBuf>,
}

impl JsonDocumentStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self { inner: Arc::new(RwLock::new(Snapshot::default())), file_path: None })
    }

    /// Initialize the store from a path. Creates the file with an empty snapshot if missing.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();

        let snapshot: Snapshot = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Backend(format!("cannot parse {}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = Snapshot::default();
                write_snapshot(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(StoreError::Backend(format!("cannot read {}: {e}", file_path.display()))),
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(snapshot)), file_path: Some(file_path) }))
    }

    /// Run `change` against the live snapshot. With a file behind the store
    /// the change is made on a copy, written out, and swapped in on success.
    async fn mutate<R>(
        &self,
        snap: &mut Snapshot,
        change: impl FnOnce(&mut Snapshot) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let Some(path) = &self.file_path else {
            return change(snap);
        };
        let mut next = snap.clone();
        let out = change(&mut next)?;
        write_snapshot(path, &next).await?;
        *snap = next;
        Ok(out)
    }
}

async fn write_snapshot(path: &PathBuf, snapshot: &Snapshot) -> Result<(), StoreError> {
    let data = serde_json::to_vec(snapshot).map_err(|e| StoreError::Backend(e.to_string()))?;
    fs::write(path, data).await.map_err(|e| {
        warn!(path = %path.display(), err = %e, "document snapshot write failed");
        StoreError::Backend(e.to_string())
    })
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn create(&self, kind: Kind, body: Value) -> Result<i64, StoreError> {
        let mut snap = self.inner.write().await;
        let id = self
            .mutate(&mut snap, |s| {
                s.next_id += 1;
                let id = s.next_id;
                s.apply(Write::Put { kind, id, body });
                Ok(id)
            })
            .await?;
        debug!(%kind, id, "document created");
        Ok(id)
    }

    async fn get(&self, kind: Kind, id: i64) -> Result<Option<Value>, StoreError> {
        let snap = self.inner.read().await;
        Ok(snap.collection(kind).and_then(|c| c.get(&id)).cloned())
    }

    async fn query(&self, kind: Kind, query: &Query) -> Result<Page, StoreError> {
        let snap = self.inner.read().await;
        let Some(collection) = snap.collection(kind) else {
            return Ok(Page::from_scan(Vec::new(), query.limit));
        };
        let start = query.cursor.map(|c| c.last_id());
        let take = usize::try_from(query.limit.saturating_add(1)).unwrap_or(usize::MAX);
        let scanned = collection
            .iter()
            .filter(|(id, _)| start.map_or(true, |after| **id > after))
            .filter(|(_, doc)| query.filter.as_ref().map_or(true, |f| f.matches(doc)))
            .take(take)
            .map(|(id, doc)| (*id, doc.clone()))
            .collect();
        Ok(Page::from_scan(scanned, query.limit))
    }

    async fn count(&self, kind: Kind, filter: Option<&Filter>) -> Result<u64, StoreError> {
        let snap = self.inner.read().await;
        let n = snap
            .collection(kind)
            .map(|c| c.values().filter(|doc| filter.map_or(true, |f| f.matches(doc))).count())
            .unwrap_or(0);
        Ok(n as u64)
    }

    async fn put(&self, kind: Kind, id: i64, body: Value) -> Result<(), StoreError> {
        self.commit(vec![Write::Put { kind, id, body }]).await
    }

    async fn delete(&self, kind: Kind, id: i64) -> Result<bool, StoreError> {
        let mut snap = self.inner.write().await;
        if !snap.contains(kind, id) {
            return Ok(false);
        }
        self.mutate(&mut snap, |s| {
            s.apply(Write::Delete { kind, id });
            Ok(true)
        })
        .await
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        let mut snap = self.inner.write().await;
        let n = writes.len();
        self.mutate(&mut snap, |s| {
            // Validate first so a failing write leaves nothing half-applied.
            for write in &writes {
                if let Write::Put { kind, id, .. } = write {
                    if !s.contains(*kind, *id) {
                        return Err(StoreError::Missing { kind: *kind, id: *id });
                    }
                }
            }
            for write in writes {
                s.apply(write);
            }
            Ok(())
        })
        .await?;
        debug!(writes = n, "commit applied");
        Ok(())
    }
}
