//! Payment gateway collaborator.
//!
//! The gateway is the source of truth for whether an invoice was actually
//! paid; the reconciliation job trusts its answer over local state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::EngineError;

/// Invoice status as reported by the gateway.
///
/// Statuses outside the known set are preserved verbatim in `Other` so the
/// job can log them instead of misclassifying a provider-side addition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvoiceStatus {
    Paid,
    Settled,
    Expired,
    Failed,
    Pending,
    Other(String),
}

impl InvoiceStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PAID" => Self::Paid,
            "SETTLED" => Self::Settled,
            "EXPIRED" => Self::Expired,
            "FAILED" => Self::Failed,
            "PENDING" => Self::Pending,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Paid => "PAID",
            Self::Settled => "SETTLED",
            Self::Expired => "EXPIRED",
            Self::Failed => "FAILED",
            Self::Pending => "PENDING",
            Self::Other(raw) => raw,
        }
    }
}

/// The slice of a gateway invoice the reconciliation job cares about.
#[derive(Clone, Debug)]
pub struct Invoice {
    pub id: String,
    pub status: InvoiceStatus,
    pub amount: Option<i64>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetches the authoritative state of an invoice by its gateway id.
    async fn get_invoice(&self, reference: &str) -> Result<Invoice, EngineError>;
}
