//! Cron trigger endpoints.

use axum::{Json, extract::State};
use chrono::Utc;

use api_types::report::{CronReport, RunResults, TransactionDetail};
use engine::RunReport;

use crate::{ServerError, server::ServerState};

pub async fn check_payment_status(
    State(state): State<ServerState>,
) -> Result<Json<CronReport>, ServerError> {
    let report = state.engine.check_payment_status().await?;
    let message = format!(
        "Checked {} transactions: {} paid, {} expired, {} failed, {} unchanged",
        report.total, report.paid, report.expired, report.failed, report.unchanged
    );
    Ok(Json(render_report("check-payment-status", report, message)))
}

pub async fn repair_activations(
    State(state): State<ServerState>,
) -> Result<Json<CronReport>, ServerError> {
    let report = state.engine.repair_activations().await?;
    let message = format!(
        "Checked {} transactions: {} repaired, {} unchanged",
        report.total, report.updated, report.unchanged
    );
    Ok(Json(render_report("repair-activations", report, message)))
}

fn render_report(job: &str, report: RunReport, message: String) -> CronReport {
    CronReport {
        success: true,
        timestamp: Utc::now(),
        job: job.to_string(),
        results: RunResults {
            total: report.total,
            updated: report.updated,
            paid: report.paid,
            expired: report.expired,
            failed: report.failed,
            unchanged: report.unchanged,
            errors: report.errors,
            details: report
                .details
                .into_iter()
                .map(|detail| TransactionDetail {
                    transaction_id: detail.transaction_id,
                    email: detail.email,
                    status: detail.status,
                    action: detail.action,
                })
                .collect(),
        },
        message,
    }
}
