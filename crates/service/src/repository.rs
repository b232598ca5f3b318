//! Typed access to the document store.
//!
//! Wraps an `Arc<dyn DocumentStore>` and converts between stored JSON bodies
//! and the [`Record`] types in `models`.

use std::sync::Arc;

use models::{Record, Stored};

use crate::errors::ServiceError;
use crate::pagination::{Cursor, Listing, PAGE_SIZE};
use crate::storage::{DocumentStore, Filter, Query, Write};

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create<T: Record>(&self, data: T) -> Result<Stored<T>, ServiceError> {
        let id = self.store.create(T::KIND, data.to_document()?).await?;
        Ok(Stored::new(id, data))
    }

    pub async fn get<T: Record>(&self, id: i64) -> Result<Option<Stored<T>>, ServiceError> {
        match self.store.get(T::KIND, id).await? {
            Some(doc) => Ok(Some(Stored::new(id, T::from_document(id, doc)?))),
            None => Ok(None),
        }
    }

    /// One page of records plus the size of the whole filtered collection.
    pub async fn list<T: Record>(
        &self,
        filter: Option<Filter>,
        cursor: Option<Cursor>,
    ) -> Result<Listing<T>, ServiceError> {
        let total = self.store.count(T::KIND, filter.as_ref()).await?;
        let query = Query { filter, limit: PAGE_SIZE, cursor };
        let page = self.store.query(T::KIND, &query).await?;
        let next = page.next_cursor();
        let records = page
            .records
            .into_iter()
            .map(|(id, doc)| T::from_document(id, doc).map(|data| Stored::new(id, data)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Listing { records, total, next })
    }

    /// First record matching `filter`, in id order.
    pub async fn find_one<T: Record>(&self, filter: Filter) -> Result<Option<Stored<T>>, ServiceError> {
        let query = Query { filter: Some(filter), limit: 1, cursor: None };
        let page = self.store.query(T::KIND, &query).await?;
        match page.records.into_iter().next() {
            Some((id, doc)) => Ok(Some(Stored::new(id, T::from_document(id, doc)?))),
            None => Ok(None),
        }
    }

    pub async fn put<T: Record>(&self, record: &Stored<T>) -> Result<(), ServiceError> {
        self.store.put(T::KIND, record.id, record.data.to_document()?).await?;
        Ok(())
    }

    pub async fn commit(&self, writes: Vec<Write>) -> Result<(), ServiceError> {
        self.store.commit(writes).await?;
        Ok(())
    }
}

/// A write that stores `record` as it is now.
pub fn put_write<T: Record>(record: &Stored<T>) -> Result<Write, ServiceError> {
    Ok(Write::Put { kind: T::KIND, id: record.id, body: record.data.to_document()? })
}

pub fn delete_write<T: Record>(id: i64) -> Write {
    Write::Delete { kind: T::KIND, id }
}
