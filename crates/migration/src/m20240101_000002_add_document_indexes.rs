//! Indexes for kind-scoped scans and the owner/subject equality filters.
use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_document::Document;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_document_kind_id")
                    .table(Document::Table)
                    .col(Document::Kind)
                    .col(Document::Id)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Expression indexes are not expressible through the index builder.
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_document_owner ON document ((body ->> 'owner')) WHERE kind = 'Client'",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_document_subject ON document ((body ->> 'subject')) WHERE kind = 'User'",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_document_subject").await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_document_owner").await?;
        manager
            .drop_index(Index::drop().name("idx_document_kind_id").table(Document::Table).to_owned())
            .await
    }
}
