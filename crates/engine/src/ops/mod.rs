use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::{EngineError, MailingList, Notifier, PaymentGateway, ResultEngine};

mod activate;
mod reconcile;
mod repair;
mod revenue;

pub use reconcile::{RunReport, TransactionOutcome};
pub use revenue::DistributeRevenueCmd;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Recipients of the platform's share of each sale. Unset recipients simply
/// skip their share (logged as a warning).
#[derive(Clone, Debug, Default)]
pub struct RevenueRecipients {
    pub admin_user_id: Option<String>,
    pub founder_user_id: Option<String>,
    pub cofounder_user_id: Option<String>,
}

/// Tunables for candidate selection and the gateway call.
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// Lower age bound; younger transactions may still resolve via webhook.
    pub min_age_minutes: i64,
    /// Upper age bound; older intents are considered dead.
    pub max_age_days: i64,
    /// Per-run cap, bounds job duration against host execution limits.
    pub batch_limit: u64,
    pub gateway_timeout: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            min_age_minutes: 5,
            max_age_days: 7,
            batch_limit: 50,
            gateway_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Engine {
    database: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    mailing: Arc<dyn MailingList>,
    notifier: Arc<dyn Notifier>,
    recipients: RevenueRecipients,
    reconcile: ReconcileConfig,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    gateway: Option<Arc<dyn PaymentGateway>>,
    mailing: Option<Arc<dyn MailingList>>,
    notifier: Option<Arc<dyn Notifier>>,
    recipients: RevenueRecipients,
    reconcile: Option<ReconcileConfig>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> EngineBuilder {
        self.gateway = Some(gateway);
        self
    }

    pub fn mailing(mut self, mailing: Arc<dyn MailingList>) -> EngineBuilder {
        self.mailing = Some(mailing);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    pub fn recipients(mut self, recipients: RevenueRecipients) -> EngineBuilder {
        self.recipients = recipients;
        self
    }

    pub fn reconcile(mut self, config: ReconcileConfig) -> EngineBuilder {
        self.reconcile = Some(config);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let gateway = self
            .gateway
            .ok_or_else(|| EngineError::Configuration("payment gateway is required".to_string()))?;
        let mailing = self
            .mailing
            .ok_or_else(|| EngineError::Configuration("mailing list client is required".to_string()))?;
        let notifier = self
            .notifier
            .ok_or_else(|| EngineError::Configuration("notifier is required".to_string()))?;

        Ok(Engine {
            database: self.database,
            gateway,
            mailing,
            notifier,
            recipients: self.recipients,
            reconcile: self.reconcile.unwrap_or_default(),
        })
    }
}
