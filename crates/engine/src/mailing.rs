//! Mailing-list collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::EngineError;

/// Subscriber context forwarded to the list provider on sync.
#[derive(Clone, Debug)]
pub struct SubscriberAttributes {
    pub name: String,
    pub phone: Option<String>,
    pub purchase_kind: String,
    pub purchase_item: String,
    pub purchased_at: DateTime<Utc>,
    pub amount: i64,
}

#[async_trait]
pub trait MailingList: Send + Sync {
    async fn add_subscriber(
        &self,
        email: &str,
        list_id: &str,
        attributes: &SubscriberAttributes,
    ) -> Result<(), EngineError>;
}
