//! Transaction primitives.
//!
//! A `Transaction` is the unit of payment: created at checkout as PENDING and
//! settled exactly once, either by the gateway webhook or by the
//! reconciliation job. Rows are never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// What the transaction paid for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Membership,
    Course,
    Product,
    Supplier,
    Other,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Membership => "MEMBERSHIP",
            Self::Course => "COURSE",
            Self::Product => "PRODUCT",
            Self::Supplier => "SUPPLIER",
            Self::Other => "OTHER",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "MEMBERSHIP" => Ok(Self::Membership),
            "COURSE" => Ok(Self::Course),
            "PRODUCT" => Ok(Self::Product),
            "SUPPLIER" => Ok(Self::Supplier),
            "OTHER" => Ok(Self::Other),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub kind: String,
    pub amount: i64,
    /// Order reference assigned by the gateway at checkout.
    pub external_id: Option<String>,
    /// Gateway invoice id; the key used to re-query payment status.
    pub reference: Option<String>,
    pub membership_id: Option<String>,
    pub course_id: Option<String>,
    pub product_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: Option<String>,
    /// Free-form bag carried over from checkout. May hold denormalized keys
    /// (`membership_id`, `product_id`, `affiliate_id`) when the matching
    /// column was not populated, plus reconciliation annotations.
    pub metadata: Option<Json>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub paid_at: Option<DateTimeUtc>,
    pub expired_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Reads a string field out of the metadata bag.
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata
            .as_ref()?
            .get(key)?
            .as_str()
            .map(ToString::to_string)
    }
}
