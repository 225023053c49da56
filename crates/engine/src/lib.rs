//! Domain core of the payment reconciliation service.
//!
//! The engine owns the relational model (sea-orm entities), the collaborator
//! traits (payment gateway, mailing list, notifier) and the two cron
//! operations built on them: the payment-status check and the activation
//! repair sweep.

pub use error::EngineError;
pub use gateway::{Invoice, InvoiceStatus, PaymentGateway};
pub use mailing::{MailingList, SubscriberAttributes};
pub use memberships::MembershipDuration;
pub use notify::{Email, Notifier};
pub use ops::{
    DistributeRevenueCmd, Engine, EngineBuilder, ReconcileConfig, RevenueRecipients, RunReport,
    TransactionOutcome,
};
pub use transactions::{TransactionKind, TransactionStatus};

pub mod catalog;
pub mod entitlements;
mod error;
pub mod gateway;
pub mod mailing;
pub mod membership_links;
pub mod memberships;
pub mod notify;
mod ops;
pub mod transactions;
pub mod users;
pub mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
