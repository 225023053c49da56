//! Payment-status reconciliation.
//!
//! Repairs PENDING transactions whose gateway webhook never arrived: asks the
//! gateway for the invoice's real status, settles the transaction
//! accordingly and fans out fulfillment for paid ones. Every mutation is
//! guarded by a `status = PENDING` predicate, so re-selection or an
//! overlapping run can never flip a terminal status.

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::json;

use crate::{
    EngineError, Invoice, InvoiceStatus, ResultEngine, TransactionStatus, transactions,
};

use super::Engine;

/// Aggregate outcome of one job run. Ephemeral: built per invocation,
/// returned to the caller, never persisted.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub total: u64,
    pub updated: u64,
    pub paid: u64,
    pub expired: u64,
    pub failed: u64,
    pub unchanged: u64,
    pub errors: Vec<String>,
    pub details: Vec<TransactionOutcome>,
}

/// Per-transaction entry in the run report.
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    pub transaction_id: String,
    pub email: Option<String>,
    pub status: String,
    pub action: String,
}

impl Engine {
    /// One `check-payment-status` run.
    ///
    /// Failures are isolated per transaction: a gateway error or a failed
    /// activation lands in the report's error list and the loop moves on.
    /// Only candidate selection itself can fail the whole run.
    pub async fn check_payment_status(&self) -> ResultEngine<RunReport> {
        let candidates = self.pending_candidates().await?;
        tracing::info!(candidates = candidates.len(), "starting payment-status check");

        let mut report = RunReport {
            total: candidates.len() as u64,
            ..Default::default()
        };

        for tx in &candidates {
            if let Err(err) = self.reconcile_one(tx, &mut report).await {
                tracing::error!(transaction = %tx.id, "reconciliation failed: {err}");
                report.errors.push(format!("{}: {err}", tx.id));
            }
        }

        tracing::info!(
            total = report.total,
            paid = report.paid,
            expired = report.expired,
            failed = report.failed,
            unchanged = report.unchanged,
            "payment-status check finished"
        );
        Ok(report)
    }

    /// PENDING transactions old enough to have missed their webhook but young
    /// enough to still matter, newest first, capped per run.
    async fn pending_candidates(&self) -> ResultEngine<Vec<transactions::Model>> {
        let now = Utc::now();
        let newest = now - Duration::minutes(self.reconcile.min_age_minutes);
        let oldest = now - Duration::days(self.reconcile.max_age_days);

        Ok(transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.as_str()))
            .filter(transactions::Column::CreatedAt.gte(oldest))
            .filter(transactions::Column::CreatedAt.lte(newest))
            .filter(transactions::Column::ExternalId.is_not_null())
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(self.reconcile.batch_limit)
            .all(&self.database)
            .await?)
    }

    async fn reconcile_one(
        &self,
        tx: &transactions::Model,
        report: &mut RunReport,
    ) -> ResultEngine<()> {
        let Some(reference) = tx.reference.as_deref() else {
            tracing::debug!(transaction = %tx.id, "no invoice reference, skipping gateway check");
            report.unchanged += 1;
            return Ok(());
        };

        let invoice = match self.query_gateway(reference).await {
            Ok(invoice) => invoice,
            Err(err) => {
                tracing::warn!(transaction = %tx.id, "gateway query failed: {err}");
                report.errors.push(format!("{}: {err}", tx.id));
                report.unchanged += 1;
                return Ok(());
            }
        };

        match invoice.status {
            InvoiceStatus::Paid | InvoiceStatus::Settled => {
                if !self.settle_paid(tx, &invoice).await? {
                    // Another run (or the webhook) won the race.
                    report.unchanged += 1;
                    return Ok(());
                }
                self.activate_purchase(tx).await?;
                report.updated += 1;
                report.paid += 1;
                report.details.push(outcome(tx, "PAID", "Activated"));
            }
            InvoiceStatus::Expired => {
                if !self.settle_failed(tx, &invoice, true).await? {
                    report.unchanged += 1;
                    return Ok(());
                }
                report.updated += 1;
                report.expired += 1;
                report
                    .details
                    .push(outcome(tx, "EXPIRED", "Marked as failed"));
            }
            InvoiceStatus::Failed => {
                if !self.settle_failed(tx, &invoice, false).await? {
                    report.unchanged += 1;
                    return Ok(());
                }
                report.updated += 1;
                report.failed += 1;
                report.details.push(outcome(tx, "FAILED", "Marked as failed"));
            }
            InvoiceStatus::Pending => {
                tracing::debug!(transaction = %tx.id, "still pending at the gateway");
                report.unchanged += 1;
            }
            InvoiceStatus::Other(ref raw) => {
                tracing::warn!(transaction = %tx.id, status = %raw, "unrecognized gateway status");
                report.unchanged += 1;
            }
        }
        Ok(())
    }

    async fn query_gateway(&self, reference: &str) -> ResultEngine<Invoice> {
        match tokio::time::timeout(
            self.reconcile.gateway_timeout,
            self.gateway.get_invoice(reference),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(EngineError::Gateway(format!(
                "invoice query timed out after {:?}",
                self.reconcile.gateway_timeout
            ))),
        }
    }

    /// Marks a transaction SUCCESS. Returns false if it was no longer
    /// PENDING, in which case nothing was written.
    async fn settle_paid(&self, tx: &transactions::Model, invoice: &Invoice) -> ResultEngine<bool> {
        let now = Utc::now();
        let result = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(TransactionStatus::Success.as_str()),
            )
            .col_expr(transactions::Column::PaidAt, Expr::value(now))
            .col_expr(
                transactions::Column::Notes,
                Expr::value(sync_note(
                    now,
                    "Status synced from gateway API. Original webhook may have failed.",
                )),
            )
            .col_expr(
                transactions::Column::Metadata,
                Expr::value(annotated_metadata(tx, invoice.status.as_str(), now)),
            )
            .filter(transactions::Column::Id.eq(tx.id.clone()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.as_str()))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Marks a transaction FAILED, stamping `expired_at` for gateway-side
    /// expiry. Same PENDING guard as [`Engine::settle_paid`].
    async fn settle_failed(
        &self,
        tx: &transactions::Model,
        invoice: &Invoice,
        expired: bool,
    ) -> ResultEngine<bool> {
        let now = Utc::now();
        let note = if expired {
            "Payment expired at the gateway."
        } else {
            "Payment failed at the gateway."
        };

        let mut update = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(TransactionStatus::Failed.as_str()),
            )
            .col_expr(transactions::Column::Notes, Expr::value(sync_note(now, note)))
            .col_expr(
                transactions::Column::Metadata,
                Expr::value(annotated_metadata(tx, invoice.status.as_str(), now)),
            );
        if expired {
            update = update.col_expr(transactions::Column::ExpiredAt, Expr::value(now));
        }

        let result = update
            .filter(transactions::Column::Id.eq(tx.id.clone()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.as_str()))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

pub(super) fn outcome(tx: &transactions::Model, status: &str, action: &str) -> TransactionOutcome {
    TransactionOutcome {
        transaction_id: tx.id.clone(),
        email: tx.customer_email.clone(),
        status: status.to_string(),
        action: action.to_string(),
    }
}

fn sync_note(at: DateTime<Utc>, message: &str) -> String {
    format!("[AUTO-CHECKED: {}]\n{message}", at.to_rfc3339())
}

/// Existing metadata plus the reconciliation annotations.
fn annotated_metadata(
    tx: &transactions::Model,
    synced_status: &str,
    at: DateTime<Utc>,
) -> serde_json::Value {
    let mut metadata = match tx.metadata.clone() {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    metadata.insert("gateway_status_checked".to_string(), json!(true));
    metadata.insert(
        "gateway_status_checked_at".to_string(),
        json!(at.to_rfc3339()),
    );
    metadata.insert("gateway_synced_status".to_string(), json!(synced_status));
    serde_json::Value::Object(metadata)
}
