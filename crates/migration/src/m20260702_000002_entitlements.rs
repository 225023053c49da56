use sea_orm_migration::prelude::*;

use crate::m20260701_000001_users::Users;
use crate::m20260701_000002_catalog::{Courses, Groups, Memberships, Products};
use crate::m20260702_000001_transactions::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum UserMemberships {
    Table,
    Id,
    UserId,
    MembershipId,
    TransactionId,
    Status,
    IsActive,
    ActivatedAt,
    StartedAt,
    EndsAt,
    Price,
}

#[derive(Iden)]
enum CourseEnrollments {
    Table,
    Id,
    UserId,
    CourseId,
    TransactionId,
    Progress,
    EnrolledAt,
}

#[derive(Iden)]
enum UserProducts {
    Table,
    Id,
    UserId,
    ProductId,
    TransactionId,
    Price,
    PurchasedAt,
    IsActive,
}

#[derive(Iden)]
enum GroupMembers {
    Table,
    Id,
    GroupId,
    UserId,
    Role,
    JoinedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserMemberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserMemberships::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserMemberships::UserId).string().not_null())
                    .col(
                        ColumnDef::new(UserMemberships::MembershipId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserMemberships::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserMemberships::Status).string().not_null())
                    .col(
                        ColumnDef::new(UserMemberships::IsActive)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserMemberships::ActivatedAt).timestamp())
                    .col(
                        ColumnDef::new(UserMemberships::StartedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserMemberships::EndsAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserMemberships::Price)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_memberships-user_id")
                            .from(UserMemberships::Table, UserMemberships::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_memberships-membership_id")
                            .from(UserMemberships::Table, UserMemberships::MembershipId)
                            .to(Memberships::Table, Memberships::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_memberships-transaction_id")
                            .from(UserMemberships::Table, UserMemberships::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // At-most-once activation per paying transaction.
        manager
            .create_index(
                Index::create()
                    .name("uidx-user_memberships-user_id-transaction_id")
                    .table(UserMemberships::Table)
                    .col(UserMemberships::UserId)
                    .col(UserMemberships::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseEnrollments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseEnrollments::UserId).string().not_null())
                    .col(
                        ColumnDef::new(CourseEnrollments::CourseId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CourseEnrollments::TransactionId).string())
                    .col(
                        ColumnDef::new(CourseEnrollments::Progress)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CourseEnrollments::EnrolledAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-course_enrollments-user_id")
                            .from(CourseEnrollments::Table, CourseEnrollments::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-course_enrollments-course_id")
                            .from(CourseEnrollments::Table, CourseEnrollments::CourseId)
                            .to(Courses::Table, Courses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-course_enrollments-course_id-user_id")
                    .table(CourseEnrollments::Table)
                    .col(CourseEnrollments::CourseId)
                    .col(CourseEnrollments::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProducts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserProducts::UserId).string().not_null())
                    .col(ColumnDef::new(UserProducts::ProductId).string().not_null())
                    .col(ColumnDef::new(UserProducts::TransactionId).string())
                    .col(
                        ColumnDef::new(UserProducts::Price)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserProducts::PurchasedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserProducts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_products-user_id")
                            .from(UserProducts::Table, UserProducts::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_products-product_id")
                            .from(UserProducts::Table, UserProducts::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-user_products-user_id-product_id")
                    .table(UserProducts::Table)
                    .col(UserProducts::UserId)
                    .col(UserProducts::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMembers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupMembers::GroupId).string().not_null())
                    .col(ColumnDef::new(GroupMembers::UserId).string().not_null())
                    .col(ColumnDef::new(GroupMembers::Role).string().not_null())
                    .col(ColumnDef::new(GroupMembers::JoinedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-group_id")
                            .from(GroupMembers::Table, GroupMembers::GroupId)
                            .to(Groups::Table, Groups::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-user_id")
                            .from(GroupMembers::Table, GroupMembers::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-group_members-group_id-user_id")
                    .table(GroupMembers::Table)
                    .col(GroupMembers::GroupId)
                    .col(GroupMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProducts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseEnrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserMemberships::Table).to_owned())
            .await?;
        Ok(())
    }
}
