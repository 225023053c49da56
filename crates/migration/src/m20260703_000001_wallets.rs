use sea_orm_migration::prelude::*;

use crate::m20260701_000001_users::Users;
use crate::m20260702_000001_transactions::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    UserId,
    Balance,
    PendingBalance,
}

#[derive(Iden)]
enum WalletEntries {
    Table,
    Id,
    WalletId,
    Amount,
    Description,
    Reference,
    CreatedAt,
}

#[derive(Iden)]
enum PendingRevenues {
    Table,
    Id,
    WalletId,
    TransactionId,
    Amount,
    Percent,
    Status,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Wallets::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Wallets::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::PendingBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallets-user_id")
                            .from(Wallets::Table, Wallets::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-wallets-user_id")
                    .table(Wallets::Table)
                    .col(Wallets::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletEntries::WalletId).string().not_null())
                    .col(
                        ColumnDef::new(WalletEntries::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletEntries::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletEntries::Reference).string().not_null())
                    .col(
                        ColumnDef::new(WalletEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_entries-wallet_id")
                            .from(WalletEntries::Table, WalletEntries::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_entries-reference")
                    .table(WalletEntries::Table)
                    .col(WalletEntries::Reference)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PendingRevenues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingRevenues::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PendingRevenues::WalletId).string().not_null())
                    .col(
                        ColumnDef::new(PendingRevenues::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRevenues::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingRevenues::Percent).integer().not_null())
                    .col(ColumnDef::new(PendingRevenues::Status).string().not_null())
                    .col(
                        ColumnDef::new(PendingRevenues::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pending_revenues-wallet_id")
                            .from(PendingRevenues::Table, PendingRevenues::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pending_revenues-transaction_id")
                            .from(PendingRevenues::Table, PendingRevenues::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PendingRevenues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        Ok(())
    }
}
