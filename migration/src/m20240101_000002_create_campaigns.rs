use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create campaign table
        manager
            .create_table(
                Table::create()
                    .table(Campaign::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Campaign::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Campaign::OrganizationId).uuid())
                    .col(ColumnDef::new(Campaign::Name).string().not_null())
                    .col(ColumnDef::new(Campaign::TemplateId).uuid().not_null())
                    .col(ColumnDef::new(Campaign::AudienceIds).json().not_null())
                    .col(ColumnDef::new(Campaign::ContactId).uuid())
                    .col(
                        ColumnDef::new(Campaign::ScheduleType)
                            .string()
                            .not_null()
                            .default("once"),
                    )
                    .col(
                        ColumnDef::new(Campaign::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Campaign::Recurrence).string())
                    .col(ColumnDef::new(Campaign::RecurrenceDayOfWeek).integer())
                    .col(ColumnDef::new(Campaign::RecurrenceDayOfMonth).integer())
                    .col(ColumnDef::new(Campaign::RecurrenceTime).string())
                    .col(ColumnDef::new(Campaign::LastRunAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Campaign::Status)
                            .string()
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(ColumnDef::new(Campaign::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Campaign::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Campaign::UpdatedAt)
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
                    .name("idx_campaign_due")
                    .table(Campaign::Table)
                    .col(Campaign::Status)
                    .col(Campaign::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaign_org")
                    .table(Campaign::Table)
                    .col(Campaign::OrganizationId)
                    .to_owned(),
            )
            .await?;

        // Create campaign_log table
        manager
            .create_table(
                Table::create()
                    .table(CampaignLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CampaignLog::CampaignId).uuid().not_null())
                    .col(ColumnDef::new(CampaignLog::ContactId).uuid().not_null())
                    .col(ColumnDef::new(CampaignLog::RecipientEmail).string().not_null())
                    .col(ColumnDef::new(CampaignLog::Subject).string().not_null())
                    .col(
                        ColumnDef::new(CampaignLog::Status)
                            .string()
                            .not_null()
                            .default("queued"),
                    )
                    .col(ColumnDef::new(CampaignLog::ErrorMessage).text())
                    .col(ColumnDef::new(CampaignLog::SentAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(CampaignLog::CreatedAt)
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
                    .name("idx_campaign_log_campaign_status")
                    .table(CampaignLog::Table)
                    .col(CampaignLog::CampaignId)
                    .col(CampaignLog::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CampaignLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Campaign::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Campaign {
    Table,
    Id,
    OrganizationId,
    Name,
    TemplateId,
    AudienceIds,
    ContactId,
    ScheduleType,
    ScheduledAt,
    Recurrence,
    RecurrenceDayOfWeek,
    RecurrenceDayOfMonth,
    RecurrenceTime,
    LastRunAt,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CampaignLog {
    Table,
    Id,
    CampaignId,
    ContactId,
    RecipientEmail,
    Subject,
    Status,
    ErrorMessage,
    SentAt,
    CreatedAt,
}
