use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Memberships {
    Table,
    Id,
    Name,
    Duration,
    Price,
    AffiliateCommissionPercent,
    MailingListId,
    AutoAddToList,
}

#[derive(Iden)]
pub enum Courses {
    Table,
    Id,
    Title,
    MailingListId,
    AutoAddToList,
}

#[derive(Iden)]
pub enum Products {
    Table,
    Id,
    Name,
    MailingListId,
    AutoAddToList,
}

#[derive(Iden)]
pub enum Groups {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum MembershipGroups {
    Table,
    Id,
    MembershipId,
    GroupId,
}

#[derive(Iden)]
enum MembershipCourses {
    Table,
    Id,
    MembershipId,
    CourseId,
}

#[derive(Iden)]
enum MembershipProducts {
    Table,
    Id,
    MembershipId,
    ProductId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Memberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Memberships::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Memberships::Name).string().not_null())
                    .col(ColumnDef::new(Memberships::Duration).string().not_null())
                    .col(ColumnDef::new(Memberships::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Memberships::AffiliateCommissionPercent)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Memberships::MailingListId).string())
                    .col(
                        ColumnDef::new(Memberships::AutoAddToList)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(ColumnDef::new(Courses::MailingListId).string())
                    .col(
                        ColumnDef::new(Courses::AutoAddToList)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::MailingListId).string())
                    .col(
                        ColumnDef::new(Products::AutoAddToList)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MembershipGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MembershipGroups::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MembershipGroups::MembershipId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MembershipGroups::GroupId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-membership_groups-membership_id")
                            .from(MembershipGroups::Table, MembershipGroups::MembershipId)
                            .to(Memberships::Table, Memberships::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-membership_groups-membership_id-group_id")
                    .table(MembershipGroups::Table)
                    .col(MembershipGroups::MembershipId)
                    .col(MembershipGroups::GroupId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MembershipCourses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MembershipCourses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MembershipCourses::MembershipId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCourses::CourseId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-membership_courses-membership_id")
                            .from(MembershipCourses::Table, MembershipCourses::MembershipId)
                            .to(Memberships::Table, Memberships::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-membership_courses-membership_id-course_id")
                    .table(MembershipCourses::Table)
                    .col(MembershipCourses::MembershipId)
                    .col(MembershipCourses::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MembershipProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MembershipProducts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MembershipProducts::MembershipId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MembershipProducts::ProductId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-membership_products-membership_id")
                            .from(MembershipProducts::Table, MembershipProducts::MembershipId)
                            .to(Memberships::Table, Memberships::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-membership_products-membership_id-product_id")
                    .table(MembershipProducts::Table)
                    .col(MembershipProducts::MembershipId)
                    .col(MembershipProducts::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MembershipProducts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MembershipCourses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MembershipGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Memberships::Table).to_owned())
            .await?;
        Ok(())
    }
}
