//! Subjects identify users; at most one User document per subject.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_document_subject").await?;
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_document_subject_unique ON document ((body ->> 'subject')) WHERE kind = 'User'",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_document_subject_unique").await?;
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_document_subject ON document ((body ->> 'subject')) WHERE kind = 'User'",
        )
        .await?;
        Ok(())
    }
}
