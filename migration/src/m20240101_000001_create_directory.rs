use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create contact table
        manager
            .create_table(
                Table::create()
                    .table(Contact::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contact::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Contact::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Contact::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Contact::FirstName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Contact::LastName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Contact::Email).string().not_null().default(""))
                    .col(ColumnDef::new(Contact::Phone).string().not_null().default(""))
                    .col(
                        ColumnDef::new(Contact::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Contact::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Contact::UpdatedAt)
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
                    .name("idx_contact_org")
                    .table(Contact::Table)
                    .col(Contact::OrganizationId)
                    .to_owned(),
            )
            .await?;

        // Create email_template table
        manager
            .create_table(
                Table::create()
                    .table(EmailTemplate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailTemplate::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailTemplate::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(EmailTemplate::Name).string().not_null())
                    .col(ColumnDef::new(EmailTemplate::Subject).string().not_null())
                    .col(
                        ColumnDef::new(EmailTemplate::HtmlBody)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(EmailTemplate::PlainTextBody)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(EmailTemplate::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(EmailTemplate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EmailTemplate::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create audience table
        manager
            .create_table(
                Table::create()
                    .table(Audience::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Audience::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Audience::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Audience::Name).string().not_null())
                    .col(ColumnDef::new(Audience::Description).string())
                    .col(ColumnDef::new(Audience::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Audience::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create audience_contact join table
        manager
            .create_table(
                Table::create()
                    .table(AudienceContact::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AudienceContact::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AudienceContact::AudienceId).uuid().not_null())
                    .col(ColumnDef::new(AudienceContact::ContactId).uuid().not_null())
                    .col(
                        ColumnDef::new(AudienceContact::AddedAt)
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
                    .name("idx_audience_contact_pair")
                    .table(AudienceContact::Table)
                    .col(AudienceContact::AudienceId)
                    .col(AudienceContact::ContactId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audience_contact_contact")
                    .table(AudienceContact::Table)
                    .col(AudienceContact::ContactId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AudienceContact::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Audience::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EmailTemplate::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Contact::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Contact {
    Table,
    Id,
    OrganizationId,
    CreatedBy,
    FirstName,
    LastName,
    Email,
    Phone,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmailTemplate {
    Table,
    Id,
    OrganizationId,
    Name,
    Subject,
    HtmlBody,
    PlainTextBody,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Audience {
    Table,
    Id,
    OrganizationId,
    Name,
    Description,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AudienceContact {
    Table,
    Id,
    AudienceId,
    ContactId,
    AddedAt,
}
