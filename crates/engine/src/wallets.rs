//! Revenue ledger: wallets, their entries and held-back pending revenue.

use sea_orm::entity::prelude::*;

pub const PENDING_STATUS: &str = "PENDING";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    /// Spendable balance, credited immediately (affiliate commissions).
    pub balance: i64,
    /// Platform shares awaiting admin approval.
    pub pending_balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "entries::Entity")]
    Entries,
    #[sea_orm(has_many = "pending_revenues::Entity")]
    PendingRevenues,
}

impl Related<entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<pending_revenues::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PendingRevenues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub mod entries {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "wallet_entries")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub wallet_id: String,
        pub amount: i64,
        pub description: String,
        /// Transaction id this entry settles.
        pub reference: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::Entity",
            from = "Column::WalletId",
            to = "super::Column::Id"
        )]
        Wallets,
    }

    impl Related<super::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Wallets.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod pending_revenues {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "pending_revenues")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub wallet_id: String,
        pub transaction_id: String,
        pub amount: i64,
        pub percent: i32,
        pub status: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::Entity",
            from = "Column::WalletId",
            to = "super::Column::Id"
        )]
        Wallets,
    }

    impl Related<super::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Wallets.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
