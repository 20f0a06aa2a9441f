use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncBatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncBatches::BatchId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncBatches::Email).string().not_null())
                    .col(ColumnDef::new(SyncBatches::Kind).string().not_null())
                    .col(ColumnDef::new(SyncBatches::Status).string().not_null())
                    .col(ColumnDef::new(SyncBatches::TotalCount).integer().not_null())
                    .col(
                        ColumnDef::new(SyncBatches::SuccessCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncBatches::FailureCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncBatches::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncBatches::MaxRetries).integer().not_null())
                    .col(ColumnDef::new(SyncBatches::Records).text().not_null())
                    .col(ColumnDef::new(SyncBatches::Privileges).text().not_null())
                    .col(ColumnDef::new(SyncBatches::Results).text().not_null())
                    .col(ColumnDef::new(SyncBatches::ErrorMessage).text().null())
                    .col(ColumnDef::new(SyncBatches::RetriedFrom).string().null())
                    .col(
                        ColumnDef::new(SyncBatches::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncBatches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncBatches::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncBatches::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sync_batches_email_status")
                    .table(SyncBatches::Table)
                    .col(SyncBatches::Email)
                    .col(SyncBatches::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sync_batches_status_created_at")
                    .table(SyncBatches::Table)
                    .col(SyncBatches::Status)
                    .col(SyncBatches::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sync_batches_status_updated_at")
                    .table(SyncBatches::Table)
                    .col(SyncBatches::Status)
                    .col(SyncBatches::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncBatches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SyncBatches {
    Table,
    BatchId,
    Email,
    Kind,
    Status,
    TotalCount,
    SuccessCount,
    FailureCount,
    RetryCount,
    MaxRetries,
    Records,
    Privileges,
    Results,
    ErrorMessage,
    RetriedFrom,
    Version,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}
