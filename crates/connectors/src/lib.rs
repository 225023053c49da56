//! HTTP implementations of the engine's collaborator traits.
//!
//! The engine only knows the traits; everything provider-specific (base
//! URLs, auth headers, payload shapes) lives here.

pub use gateway::InvoiceApiClient;
pub use mail::MailApiClient;

mod gateway;
mod mail;

/// Outbound calls share one request deadline; a stuck provider must not
/// stall a cron run longer than this.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 10;
