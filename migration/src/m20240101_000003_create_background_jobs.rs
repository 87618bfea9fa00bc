use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create background_job_log table
        manager
            .create_table(
                Table::create()
                    .table(BackgroundJobLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BackgroundJobLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BackgroundJobLog::JobType).string().not_null())
                    .col(ColumnDef::new(BackgroundJobLog::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(BackgroundJobLog::ReferenceId).uuid())
                    .col(
                        ColumnDef::new(BackgroundJobLog::Status)
                            .string()
                            .not_null()
                            .default("queued"),
                    )
                    .col(ColumnDef::new(BackgroundJobLog::TotalRecords).integer())
                    .col(ColumnDef::new(BackgroundJobLog::ProcessedRecords).integer())
                    .col(ColumnDef::new(BackgroundJobLog::ErrorMessage).text())
                    .col(
                        ColumnDef::new(BackgroundJobLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BackgroundJobLog::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_background_job_type_status")
                    .table(BackgroundJobLog::Table)
                    .col(BackgroundJobLog::JobType)
                    .col(BackgroundJobLog::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_background_job_reference")
                    .table(BackgroundJobLog::Table)
                    .col(BackgroundJobLog::ReferenceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BackgroundJobLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BackgroundJobLog {
    Table,
    Id,
    JobType,
    OrganizationId,
    ReferenceId,
    Status,
    TotalRecords,
    ProcessedRecords,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}
