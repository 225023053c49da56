//! SUCCESS-without-entitlement repair sweep.
//!
//! The status update and fulfillment are deliberately not atomic: a crash or
//! activation error can leave a SUCCESS transaction with no entitlement. The
//! PENDING scan will never see such a row again, so this sweep looks for it
//! directly and completes activation.

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::entitlements::{course_enrollments, user_memberships, user_products};
use crate::{ResultEngine, TransactionKind, TransactionStatus, transactions};

use super::Engine;
use super::reconcile::{RunReport, outcome};

impl Engine {
    /// One `repair-activations` run. Shares the report shape with
    /// [`Engine::check_payment_status`]; every completed activation counts
    /// as updated.
    pub async fn repair_activations(&self) -> ResultEngine<RunReport> {
        let candidates = self.success_candidates().await?;
        tracing::info!(candidates = candidates.len(), "starting activation repair sweep");

        let mut report = RunReport {
            total: candidates.len() as u64,
            ..Default::default()
        };

        for tx in &candidates {
            match self.missing_entitlement(tx).await {
                Ok(false) => report.unchanged += 1,
                Ok(true) => match self.activate_purchase(tx).await {
                    Ok(()) => {
                        tracing::info!(transaction = %tx.id, "completed missing activation");
                        report.updated += 1;
                        report.details.push(outcome(tx, "SUCCESS", "Activated"));
                    }
                    Err(err) => {
                        tracing::error!(transaction = %tx.id, "repair activation failed: {err}");
                        report.errors.push(format!("{}: {err}", tx.id));
                    }
                },
                Err(err) => {
                    tracing::error!(transaction = %tx.id, "entitlement check failed: {err}");
                    report.errors.push(format!("{}: {err}", tx.id));
                }
            }
        }

        tracing::info!(
            total = report.total,
            repaired = report.updated,
            unchanged = report.unchanged,
            "activation repair sweep finished"
        );
        Ok(report)
    }

    /// SUCCESS transactions of entitlement-bearing kinds inside the same
    /// window the payment-status scan uses.
    async fn success_candidates(&self) -> ResultEngine<Vec<transactions::Model>> {
        let oldest = Utc::now() - Duration::days(self.reconcile.max_age_days);

        Ok(transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Success.as_str()))
            .filter(transactions::Column::Kind.is_in([
                TransactionKind::Membership.as_str(),
                TransactionKind::Course.as_str(),
                TransactionKind::Product.as_str(),
            ]))
            .filter(transactions::Column::CreatedAt.gte(oldest))
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(self.reconcile.batch_limit)
            .all(&self.database)
            .await?)
    }

    /// Whether the entitlement this transaction paid for is absent. A
    /// transaction whose resource id cannot be resolved at all is left for
    /// operators (counted unchanged, not an error loop).
    async fn missing_entitlement(&self, tx: &transactions::Model) -> ResultEngine<bool> {
        match TransactionKind::try_from(tx.kind.as_str())? {
            TransactionKind::Membership => {
                let present = user_memberships::Entity::find()
                    .filter(user_memberships::Column::UserId.eq(tx.user_id.clone()))
                    .filter(user_memberships::Column::TransactionId.eq(tx.id.clone()))
                    .one(&self.database)
                    .await?
                    .is_some();
                let resolvable =
                    tx.membership_id.is_some() || tx.metadata_str("membership_id").is_some();
                Ok(!present && resolvable)
            }
            TransactionKind::Course => {
                let Some(course_id) = tx.course_id.clone() else {
                    return Ok(false);
                };
                let present = course_enrollments::Entity::find()
                    .filter(course_enrollments::Column::CourseId.eq(course_id))
                    .filter(course_enrollments::Column::UserId.eq(tx.user_id.clone()))
                    .one(&self.database)
                    .await?
                    .is_some();
                Ok(!present)
            }
            TransactionKind::Product => {
                let product_id = tx
                    .product_id
                    .clone()
                    .or_else(|| tx.metadata_str("product_id"));
                let Some(product_id) = product_id else {
                    return Ok(false);
                };
                let present = user_products::Entity::find()
                    .filter(user_products::Column::UserId.eq(tx.user_id.clone()))
                    .filter(user_products::Column::ProductId.eq(product_id))
                    .one(&self.database)
                    .await?
                    .is_some();
                Ok(!present)
            }
            TransactionKind::Supplier | TransactionKind::Other => Ok(false),
        }
    }
}
