mod common;

use common::{Tx, harness, insert_membership, insert_user};
use engine::entitlements::user_memberships;
use engine::{InvoiceStatus, transactions};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[tokio::test]
async fn paid_membership_is_settled_and_activated() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "ONE_MONTH", 1_000_000, 0, None).await;

    let mut tx = Tx::pending("t1", "u1", "MEMBERSHIP");
    tx.membership_id = Some("m1".to_string());
    tx.insert(&h.db).await;
    h.gateway.set("inv_t1", InvoiceStatus::Paid);

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.paid, 1);
    assert_eq!(report.unchanged, 0);
    assert!(report.errors.is_empty());
    assert_eq!(report.details.len(), 1);
    assert_eq!(report.details[0].transaction_id, "t1");
    assert_eq!(report.details[0].status, "PAID");
    assert_eq!(report.details[0].action, "Activated");

    let tx = transactions::Entity::find_by_id("t1")
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "SUCCESS");
    assert!(tx.paid_at.is_some());
    assert!(tx.notes.as_ref().unwrap().contains("AUTO-CHECKED"));
    assert_eq!(tx.metadata_str("gateway_synced_status").as_deref(), Some("PAID"));

    let grants = user_memberships::Entity::find()
        .filter(user_memberships::Column::UserId.eq("u1"))
        .all(&h.db)
        .await
        .unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].membership_id, "m1");
    assert_eq!(grants[0].transaction_id, "t1");
    assert!(grants[0].is_active);

    // Payment-success plus membership-activation email.
    assert_eq!(h.mailer.sent_count(), 2);
}

#[tokio::test]
async fn expired_invoice_marks_transaction_failed() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "ONE_MONTH", 1_000_000, 0, None).await;

    let mut tx = Tx::pending("t1", "u1", "MEMBERSHIP");
    tx.membership_id = Some("m1".to_string());
    tx.insert(&h.db).await;
    h.gateway.set("inv_t1", InvoiceStatus::Expired);

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.expired, 1);
    assert_eq!(report.paid, 0);

    let tx = transactions::Entity::find_by_id("t1")
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "FAILED");
    assert!(tx.expired_at.is_some());
    assert!(tx.paid_at.is_none());

    let grants = user_memberships::Entity::find().all(&h.db).await.unwrap();
    assert!(grants.is_empty());
    assert_eq!(h.mailer.sent_count(), 0);
}

#[tokio::test]
async fn failed_invoice_marks_transaction_failed_without_expiry_stamp() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;

    Tx::pending("t1", "u1", "OTHER").insert(&h.db).await;
    h.gateway.set("inv_t1", InvoiceStatus::Failed);

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.expired, 0);

    let tx = transactions::Entity::find_by_id("t1")
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "FAILED");
    assert!(tx.expired_at.is_none());
}

#[tokio::test]
async fn gateway_error_leaves_transaction_pending() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;

    Tx::pending("t1", "u1", "MEMBERSHIP").insert(&h.db).await;
    h.gateway.fail("inv_t1");

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.unchanged, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("t1:"));

    let tx = transactions::Entity::find_by_id("t1")
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "PENDING");
}

#[tokio::test]
async fn missing_reference_is_skipped_without_gateway_call() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;

    let mut tx = Tx::pending("t1", "u1", "MEMBERSHIP");
    tx.reference = None;
    tx.insert(&h.db).await;

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.unchanged, 1);
    assert!(report.errors.is_empty());
    assert_eq!(h.gateway.call_count(), 0);
}

#[tokio::test]
async fn unrecognized_gateway_status_counts_as_unchanged() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;

    Tx::pending("t1", "u1", "MEMBERSHIP").insert(&h.db).await;
    h.gateway
        .set("inv_t1", InvoiceStatus::Other("ON_HOLD".to_string()));

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.unchanged, 1);
    assert!(report.errors.is_empty());

    let tx = transactions::Entity::find_by_id("t1")
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "PENDING");
}

#[tokio::test]
async fn age_window_and_external_id_bound_the_candidate_set() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;

    // Too fresh: might still resolve through the webhook.
    let mut young = Tx::pending("t_young", "u1", "OTHER");
    young.age_minutes = 4;
    young.insert(&h.db).await;

    // Old enough.
    let mut due = Tx::pending("t_due", "u1", "OTHER");
    due.age_minutes = 6;
    due.insert(&h.db).await;

    // Past the seven-day horizon.
    let mut stale = Tx::pending("t_stale", "u1", "OTHER");
    stale.age_minutes = 8 * 24 * 60;
    stale.insert(&h.db).await;

    // Never reached the gateway at all.
    let mut unsent = Tx::pending("t_unsent", "u1", "OTHER");
    unsent.external_id = None;
    unsent.insert(&h.db).await;

    h.gateway.set("inv_t_due", InvoiceStatus::Pending);

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.total, 1);
    let calls = h.gateway.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["inv_t_due".to_string()]);
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "ONE_MONTH", 1_000_000, 0, None).await;

    let mut tx = Tx::pending("t1", "u1", "MEMBERSHIP");
    tx.membership_id = Some("m1".to_string());
    tx.insert(&h.db).await;
    h.gateway.set("inv_t1", InvoiceStatus::Paid);

    let first = h.engine.check_payment_status().await.unwrap();
    assert_eq!(first.paid, 1);

    let second = h.engine.check_payment_status().await.unwrap();
    assert_eq!(second.total, 0);
    assert_eq!(second.updated, 0);

    let grants = user_memberships::Entity::find().all(&h.db).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(h.mailer.sent_count(), 2);
}

#[tokio::test]
async fn terminal_status_is_never_revisited() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "ONE_MONTH", 1_000_000, 0, None).await;

    let mut tx = Tx::pending("t1", "u1", "MEMBERSHIP");
    tx.membership_id = Some("m1".to_string());
    tx.insert(&h.db).await;
    h.gateway.set("inv_t1", InvoiceStatus::Paid);
    h.engine.check_payment_status().await.unwrap();

    // Even if the gateway later claims expiry, the terminal status stands.
    h.gateway.set("inv_t1", InvoiceStatus::Expired);
    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.total, 0);
    let tx = transactions::Entity::find_by_id("t1")
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "SUCCESS");
}

#[tokio::test]
async fn one_failing_activation_does_not_stop_the_run() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "ONE_MONTH", 1_000_000, 0, None).await;

    // Newest first: the broken transaction is processed before the good one.
    let mut broken = Tx::pending("t_broken", "u1", "MEMBERSHIP");
    broken.age_minutes = 6;
    broken.membership_id = Some("m_missing".to_string());
    broken.insert(&h.db).await;

    let mut good = Tx::pending("t_good", "u1", "MEMBERSHIP");
    good.age_minutes = 10;
    good.membership_id = Some("m1".to_string());
    good.insert(&h.db).await;

    h.gateway.set("inv_t_broken", InvoiceStatus::Paid);
    h.gateway.set("inv_t_good", InvoiceStatus::Paid);

    let report = h.engine.check_payment_status().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.paid, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("t_broken:"));

    // The broken one keeps its SUCCESS status; the repair sweep owns it now.
    let broken = transactions::Entity::find_by_id("t_broken")
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(broken.status, "SUCCESS");

    let grants = user_memberships::Entity::find()
        .filter(user_memberships::Column::TransactionId.eq("t_good"))
        .all(&h.db)
        .await
        .unwrap();
    assert_eq!(grants.len(), 1);
}
