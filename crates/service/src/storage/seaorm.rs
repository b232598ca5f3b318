use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use models::{document, Kind};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{DocumentStore, Filter, Page, Query, StoreError, Write};

fn db_err(e: DbErr) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn scoped(kind: Kind) -> Select<document::Entity> {
    document::Entity::find().filter(document::Column::Kind.eq(kind.as_str()))
}

fn with_filter(select: Select<document::Entity>, filter: Option<&Filter>) -> Select<document::Entity> {
    match filter {
        Some(f) => select.filter(Expr::cust_with_values(
            "body ->> $1 = $2",
            [f.field.clone(), f.value.clone()],
        )),
        None => select,
    }
}

async fn put_one<C: ConnectionTrait>(db: &C, kind: Kind, id: i64, body: Value) -> Result<(), StoreError> {
    let res = document::Entity::update_many()
        .col_expr(document::Column::Body, Expr::value(body))
        .col_expr(document::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(document::Column::Id.eq(id))
        .filter(document::Column::Kind.eq(kind.as_str()))
        .exec(db)
        .await
        .map_err(db_err)?;
    if res.rows_affected == 0 {
        return Err(StoreError::Missing { kind, id });
    }
    Ok(())
}

async fn delete_one<C: ConnectionTrait>(db: &C, kind: Kind, id: i64) -> Result<bool, StoreError> {
    let res = document::Entity::delete_many()
        .filter(document::Column::Id.eq(id))
        .filter(document::Column::Kind.eq(kind.as_str()))
        .exec(db)
        .await
        .map_err(db_err)?;
    Ok(res.rows_affected > 0)
}

/// Document store backed by the `document` table in PostgreSQL.
#[derive(Clone)]
pub struct SeaOrmDocumentStore {
    db: DatabaseConnection,
}

impl SeaOrmDocumentStore {
    pub fn new(db: DatabaseConnection) -> Arc<Self> {
        Arc::new(Self { db })
    }
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    #[instrument(skip(self, body))]
    async fn create(&self, kind: Kind, body: Value) -> Result<i64, StoreError> {
        let now = Utc::now().fixed_offset();
        let am = document::ActiveModel {
            kind: Set(kind.as_str().to_string()),
            body: Set(body),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = am.insert(&self.db).await.map_err(db_err)?;
        debug!(id = model.id, "document inserted");
        Ok(model.id)
    }

    async fn get(&self, kind: Kind, id: i64) -> Result<Option<Value>, StoreError> {
        let found = scoped(kind)
            .filter(document::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(found.map(|m| m.body))
    }

    #[instrument(skip(self, query), fields(limit = query.limit))]
    async fn query(&self, kind: Kind, query: &Query) -> Result<Page, StoreError> {
        let mut select = with_filter(scoped(kind), query.filter.as_ref());
        if let Some(cursor) = query.cursor {
            select = select.filter(document::Column::Id.gt(cursor.last_id()));
        }
        let rows = select
            .order_by_asc(document::Column::Id)
            .limit(query.limit.saturating_add(1))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let scanned = rows.into_iter().map(|m| (m.id, m.body)).collect();
        Ok(Page::from_scan(scanned, query.limit))
    }

    async fn count(&self, kind: Kind, filter: Option<&Filter>) -> Result<u64, StoreError> {
        with_filter(scoped(kind), filter).count(&self.db).await.map_err(db_err)
    }

    async fn put(&self, kind: Kind, id: i64, body: Value) -> Result<(), StoreError> {
        put_one(&self.db, kind, id, body).await
    }

    async fn delete(&self, kind: Kind, id: i64) -> Result<bool, StoreError> {
        delete_one(&self.db, kind, id).await
    }

    #[instrument(skip(self, writes), fields(writes = writes.len()))]
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        for write in writes {
            let applied = match write {
                Write::Put { kind, id, body } => put_one(&txn, kind, id, body).await,
                Write::Delete { kind, id } => delete_one(&txn, kind, id).await.map(|_| ()),
            };
            if let Err(e) = applied {
                txn.rollback().await.map_err(db_err)?;
                return Err(e);
            }
        }
        txn.commit().await.map_err(db_err)
    }
}
