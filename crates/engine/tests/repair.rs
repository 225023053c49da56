mod common;

use common::{Tx, harness, insert_membership, insert_product, insert_user};
use engine::entitlements::{user_memberships, user_products};
use sea_orm::EntityTrait;

#[tokio::test]
async fn success_without_entitlement_is_repaired() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "THREE_MONTHS", 1_200_000, 0, None).await;

    // Marked SUCCESS by an earlier run that died before fulfillment.
    let mut tx = Tx::success("t1", "u1", "MEMBERSHIP");
    tx.age_minutes = 60;
    tx.membership_id = Some("m1".to_string());
    tx.insert(&h.db).await;

    let report = h.engine.repair_activations().await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 0);
    assert_eq!(report.details[0].action, "Activated");

    let grants = user_memberships::Entity::find().all(&h.db).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].transaction_id, "t1");

    // The user still gets their confirmation emails, late but once.
    assert_eq!(h.mailer.sent_count(), 2);

    // No gateway traffic: the payment status is already settled.
    assert_eq!(h.gateway.call_count(), 0);
}

#[tokio::test]
async fn repair_is_idempotent() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "THREE_MONTHS", 1_200_000, 0, None).await;

    let mut tx = Tx::success("t1", "u1", "MEMBERSHIP");
    tx.membership_id = Some("m1".to_string());
    tx.insert(&h.db).await;

    h.engine.repair_activations().await.unwrap();
    let second = h.engine.repair_activations().await.unwrap();

    assert_eq!(second.total, 1);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(
        user_memberships::Entity::find().all(&h.db).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn repair_skips_pending_old_and_unresolvable_transactions() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_membership(&h.db, "m1", "ONE_MONTH", 1_000_000, 0, None).await;

    // Still pending: owned by the payment-status scan, not this sweep.
    let mut pending = Tx::pending("t_pending", "u1", "MEMBERSHIP");
    pending.membership_id = Some("m1".to_string());
    pending.insert(&h.db).await;

    // Outside the seven-day window.
    let mut old = Tx::success("t_old", "u1", "MEMBERSHIP");
    old.age_minutes = 8 * 24 * 60;
    old.membership_id = Some("m1".to_string());
    old.insert(&h.db).await;

    // No resolvable membership id anywhere: left for operators.
    Tx::success("t_blind", "u1", "MEMBERSHIP").insert(&h.db).await;

    let report = h.engine.repair_activations().await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.unchanged, 1);
    assert!(
        user_memberships::Entity::find()
            .all(&h.db)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn product_success_is_repaired_via_metadata_id() {
    let h = harness().await;
    insert_user(&h.db, "u1", "u1@example.com").await;
    insert_product(&h.db, "p1", None).await;

    let mut tx = Tx::success("t1", "u1", "PRODUCT");
    tx.amount = 200_000;
    tx.metadata = Some(serde_json::json!({ "product_id": "p1" }));
    tx.insert(&h.db).await;

    let report = h.engine.repair_activations().await.unwrap();

    assert_eq!(report.updated, 1);
    let grants = user_products::Entity::find().all(&h.db).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].product_id, "p1");
    assert_eq!(grants[0].price, 200_000);
}
