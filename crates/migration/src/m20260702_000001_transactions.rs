use sea_orm_migration::prelude::*;

use crate::m20260701_000001_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Transactions {
    Table,
    Id,
    UserId,
    Status,
    Kind,
    Amount,
    ExternalId,
    Reference,
    MembershipId,
    CourseId,
    ProductId,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    PaymentMethod,
    Metadata,
    Notes,
    CreatedAt,
    PaidAt,
    ExpiredAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::ExternalId).string())
                    .col(ColumnDef::new(Transactions::Reference).string())
                    .col(ColumnDef::new(Transactions::MembershipId).string())
                    .col(ColumnDef::new(Transactions::CourseId).string())
                    .col(ColumnDef::new(Transactions::ProductId).string())
                    .col(ColumnDef::new(Transactions::CustomerName).string())
                    .col(ColumnDef::new(Transactions::CustomerEmail).string())
                    .col(ColumnDef::new(Transactions::CustomerPhone).string())
                    .col(ColumnDef::new(Transactions::PaymentMethod).string())
                    .col(ColumnDef::new(Transactions::Metadata).json())
                    .col(ColumnDef::new(Transactions::Notes).text())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::PaidAt).timestamp())
                    .col(ColumnDef::new(Transactions::ExpiredAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The reconciliation scan filters on (status, created_at).
        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-status-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::Status)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-reference")
                    .table(Transactions::Table)
                    .col(Transactions::Reference)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        Ok(())
    }
}
