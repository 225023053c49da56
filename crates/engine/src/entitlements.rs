//! Entitlement records: one row per (user, resource) grant.
//!
//! All four tables follow the create-if-absent policy; their natural-key
//! uniqueness indexes are what make overlapping reconciliation runs safe.

pub mod user_memberships {
    use sea_orm::entity::prelude::*;

    pub const STATUS_ACTIVE: &str = "ACTIVE";

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "user_memberships")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub user_id: String,
        pub membership_id: String,
        pub transaction_id: String,
        pub status: String,
        pub is_active: bool,
        pub activated_at: Option<DateTimeUtc>,
        pub started_at: DateTimeUtc,
        pub ends_at: DateTimeUtc,
        pub price: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "crate::memberships::Entity",
            from = "Column::MembershipId",
            to = "crate::memberships::Column::Id"
        )]
        Memberships,
    }

    impl Related<crate::memberships::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Memberships.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod course_enrollments {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "course_enrollments")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub user_id: String,
        pub course_id: String,
        /// Absent for enrollments granted through a membership cascade.
        pub transaction_id: Option<String>,
        pub progress: i32,
        pub enrolled_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod user_products {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "user_products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub user_id: String,
        pub product_id: String,
        pub transaction_id: Option<String>,
        /// Zero for products bundled into a membership.
        pub price: i64,
        pub purchased_at: DateTimeUtc,
        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod group_members {
    use sea_orm::entity::prelude::*;

    pub const ROLE_MEMBER: &str = "MEMBER";

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "group_members")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub group_id: String,
        pub user_id: String,
        pub role: String,
        pub joined_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
