//! Membership tiers and their paid duration.

use chrono::{DateTime, Months, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipDuration {
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
    Lifetime,
}

impl MembershipDuration {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "ONE_MONTH",
            Self::ThreeMonths => "THREE_MONTHS",
            Self::SixMonths => "SIX_MONTHS",
            Self::TwelveMonths => "TWELVE_MONTHS",
            Self::Lifetime => "LIFETIME",
        }
    }

    /// Expiry of a grant starting at `from`. Lifetime is represented as a
    /// hundred years out rather than a nullable end date.
    pub fn ends_at(self, from: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::TwelveMonths => 12,
            Self::Lifetime => 1200,
        };
        from.checked_add_months(Months::new(months)).unwrap_or(from)
    }
}

impl TryFrom<&str> for MembershipDuration {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ONE_MONTH" => Ok(Self::OneMonth),
            "THREE_MONTHS" => Ok(Self::ThreeMonths),
            "SIX_MONTHS" => Ok(Self::SixMonths),
            "TWELVE_MONTHS" => Ok(Self::TwelveMonths),
            "LIFETIME" => Ok(Self::Lifetime),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid membership duration: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub duration: String,
    pub price: i64,
    /// Percentage of the sale credited to the referring affiliate.
    pub affiliate_commission_percent: i32,
    pub mailing_list_id: Option<String>,
    pub auto_add_to_list: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
