//! Fulfillment activators.
//!
//! Given a transaction known to be SUCCESS, grant what it paid for. Every
//! write is create-if-absent keyed by the entitlement's natural key, so the
//! activators are safe to invoke again for the same transaction (a prior run
//! may have died between the status update and fulfillment).
//!
//! Error policy: mailing-list, email and revenue-split failures are logged
//! here and never abort the grant itself; the paying user gets access even
//! when a downstream integration is down. Anything that prevents the grant
//! (missing tier, missing user, insert failure) propagates to the
//! orchestrator's per-transaction catch.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entitlements::{course_enrollments, group_members, user_memberships, user_products};
use crate::membership_links::{membership_courses, membership_groups, membership_products};
use crate::notify::{self, MembershipActivation, PaymentSuccess};
use crate::{
    EngineError, MembershipDuration, ResultEngine, SubscriberAttributes, TransactionKind, catalog,
    memberships, transactions, users,
};

use super::Engine;
use super::revenue::DistributeRevenueCmd;

impl Engine {
    /// Dispatches on transaction kind. SUPPLIER and OTHER transactions carry
    /// no entitlement and settle with the status update alone.
    pub(super) async fn activate_purchase(&self, tx: &transactions::Model) -> ResultEngine<()> {
        match TransactionKind::try_from(tx.kind.as_str())? {
            TransactionKind::Membership => self.activate_membership(tx).await,
            TransactionKind::Course => self.activate_course(tx).await,
            TransactionKind::Product => self.activate_product(tx).await,
            TransactionKind::Supplier | TransactionKind::Other => Ok(()),
        }
    }

    async fn activate_membership(&self, tx: &transactions::Model) -> ResultEngine<()> {
        let now = Utc::now();
        let membership_id = self
            .resolve_membership_id(tx)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidTransaction(format!("transaction {} has no membership id", tx.id))
            })?;

        // A grant for this exact (user, transaction) pair may exist from a
        // run that failed later on: re-activate it and stop, without
        // re-running cascades.
        let existing = user_memberships::Entity::find()
            .filter(user_memberships::Column::UserId.eq(tx.user_id.clone()))
            .filter(user_memberships::Column::TransactionId.eq(tx.id.clone()))
            .one(&self.database)
            .await?;
        if let Some(existing) = existing {
            tracing::info!(transaction = %tx.id, "membership grant already exists, re-activating");
            let mut active: user_memberships::ActiveModel = existing.into();
            active.status = ActiveValue::Set(user_memberships::STATUS_ACTIVE.to_string());
            active.is_active = ActiveValue::Set(true);
            active.activated_at = ActiveValue::Set(Some(now));
            active.update(&self.database).await?;
            return Ok(());
        }

        let membership = memberships::Entity::find_by_id(&membership_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("membership {membership_id}")))?;
        let duration = MembershipDuration::try_from(membership.duration.as_str())?;

        user_memberships::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            membership_id: ActiveValue::Set(membership_id.clone()),
            transaction_id: ActiveValue::Set(tx.id.clone()),
            status: ActiveValue::Set(user_memberships::STATUS_ACTIVE.to_string()),
            is_active: ActiveValue::Set(true),
            activated_at: ActiveValue::Set(Some(now)),
            started_at: ActiveValue::Set(now),
            ends_at: ActiveValue::Set(duration.ends_at(now)),
            price: ActiveValue::Set(tx.amount),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(transaction = %tx.id, membership = %membership_id, "membership granted");

        let user = self.require_user(&tx.user_id).await?;
        if membership.auto_add_to_list
            && let Some(list_id) = membership.mailing_list_id.as_deref()
        {
            self.sync_mailing_list(&user, list_id, "membership", &membership.name, tx)
                .await;
        }

        self.cascade_membership(&membership_id, tx).await?;

        let cmd = DistributeRevenueCmd {
            amount: tx.amount,
            kind: TransactionKind::Membership,
            affiliate_id: tx.metadata_str("affiliate_id"),
            commission_percent: i64::from(membership.affiliate_commission_percent),
            membership_id: Some(membership_id),
            transaction_id: tx.id.clone(),
        };
        if let Err(err) = self.distribute_revenue(cmd).await {
            tracing::warn!(transaction = %tx.id, "revenue distribution failed: {err}");
        }

        self.send_payment_success(tx, &user, &membership.name).await;
        self.send_membership_activation(tx, &user, &membership, duration)
            .await;
        Ok(())
    }

    async fn activate_course(&self, tx: &transactions::Model) -> ResultEngine<()> {
        let course_id = tx.course_id.clone().ok_or_else(|| {
            EngineError::InvalidTransaction(format!("transaction {} has no course id", tx.id))
        })?;

        let existing = course_enrollments::Entity::find()
            .filter(course_enrollments::Column::CourseId.eq(course_id.clone()))
            .filter(course_enrollments::Column::UserId.eq(tx.user_id.clone()))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            tracing::debug!(transaction = %tx.id, "enrollment already exists");
            return Ok(());
        }

        course_enrollments::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            course_id: ActiveValue::Set(course_id.clone()),
            transaction_id: ActiveValue::Set(Some(tx.id.clone())),
            progress: ActiveValue::Set(0),
            enrolled_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(transaction = %tx.id, course = %course_id, "course enrollment created");

        let course = catalog::courses::Entity::find_by_id(&course_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("course {course_id}")))?;

        let user = self.require_user(&tx.user_id).await?;
        if course.auto_add_to_list
            && let Some(list_id) = course.mailing_list_id.as_deref()
        {
            self.sync_mailing_list(&user, list_id, "course", &course.title, tx)
                .await;
        }

        self.send_payment_success(tx, &user, &course.title).await;
        Ok(())
    }

    async fn activate_product(&self, tx: &transactions::Model) -> ResultEngine<()> {
        let product_id = self
            .resolve_product_id(tx)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidTransaction(format!("transaction {} has no product id", tx.id))
            })?;

        let existing = user_products::Entity::find()
            .filter(user_products::Column::UserId.eq(tx.user_id.clone()))
            .filter(user_products::Column::ProductId.eq(product_id.clone()))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            tracing::debug!(transaction = %tx.id, "product purchase already recorded");
            return Ok(());
        }

        user_products::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            product_id: ActiveValue::Set(product_id.clone()),
            transaction_id: ActiveValue::Set(Some(tx.id.clone())),
            price: ActiveValue::Set(tx.amount),
            purchased_at: ActiveValue::Set(Utc::now()),
            is_active: ActiveValue::Set(true),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(transaction = %tx.id, product = %product_id, "product granted");

        let product = catalog::products::Entity::find_by_id(&product_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("product {product_id}")))?;

        let user = self.require_user(&tx.user_id).await?;
        if product.auto_add_to_list
            && let Some(list_id) = product.mailing_list_id.as_deref()
        {
            self.sync_mailing_list(&user, list_id, "product", &product.name, tx)
                .await;
        }

        self.send_payment_success(tx, &user, &product.name).await;
        Ok(())
    }

    /// Membership id from the column, falling back to the metadata bag. A
    /// metadata hit backfills the column so later reads stay consistent.
    async fn resolve_membership_id(
        &self,
        tx: &transactions::Model,
    ) -> ResultEngine<Option<String>> {
        if let Some(id) = tx.membership_id.clone() {
            return Ok(Some(id));
        }
        let Some(id) = tx.metadata_str("membership_id") else {
            return Ok(None);
        };

        transactions::Entity::update_many()
            .col_expr(transactions::Column::MembershipId, Expr::value(id.clone()))
            .filter(transactions::Column::Id.eq(tx.id.clone()))
            .exec(&self.database)
            .await?;
        tracing::info!(transaction = %tx.id, membership = %id, "backfilled membership id from metadata");
        Ok(Some(id))
    }

    /// Same read-repair discipline for product purchases.
    async fn resolve_product_id(&self, tx: &transactions::Model) -> ResultEngine<Option<String>> {
        if let Some(id) = tx.product_id.clone() {
            return Ok(Some(id));
        }
        let Some(id) = tx.metadata_str("product_id") else {
            return Ok(None);
        };

        transactions::Entity::update_many()
            .col_expr(transactions::Column::ProductId, Expr::value(id.clone()))
            .filter(transactions::Column::Id.eq(tx.id.clone()))
            .exec(&self.database)
            .await?;
        tracing::info!(transaction = %tx.id, product = %id, "backfilled product id from metadata");
        Ok(Some(id))
    }

    async fn require_user(&self, user_id: &str) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))
    }

    /// Grants every group, course and product linked to the tier. Each grant
    /// is create-if-absent; an individual failure is logged and the rest of
    /// the cascade still runs.
    async fn cascade_membership(
        &self,
        membership_id: &str,
        tx: &transactions::Model,
    ) -> ResultEngine<()> {
        let now = Utc::now();

        let groups = membership_groups::Entity::find()
            .filter(membership_groups::Column::MembershipId.eq(membership_id))
            .all(&self.database)
            .await?;
        for link in &groups {
            let present = group_members::Entity::find()
                .filter(group_members::Column::GroupId.eq(link.group_id.clone()))
                .filter(group_members::Column::UserId.eq(tx.user_id.clone()))
                .one(&self.database)
                .await?
                .is_some();
            if present {
                continue;
            }
            let member = group_members::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                group_id: ActiveValue::Set(link.group_id.clone()),
                user_id: ActiveValue::Set(tx.user_id.clone()),
                role: ActiveValue::Set(group_members::ROLE_MEMBER.to_string()),
                joined_at: ActiveValue::Set(now),
            };
            if let Err(err) = member.insert(&self.database).await {
                tracing::warn!(group = %link.group_id, "group member grant failed: {err}");
            }
        }

        let courses = membership_courses::Entity::find()
            .filter(membership_courses::Column::MembershipId.eq(membership_id))
            .all(&self.database)
            .await?;
        for link in &courses {
            let present = course_enrollments::Entity::find()
                .filter(course_enrollments::Column::CourseId.eq(link.course_id.clone()))
                .filter(course_enrollments::Column::UserId.eq(tx.user_id.clone()))
                .one(&self.database)
                .await?
                .is_some();
            if present {
                continue;
            }
            let enrollment = course_enrollments::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                user_id: ActiveValue::Set(tx.user_id.clone()),
                course_id: ActiveValue::Set(link.course_id.clone()),
                transaction_id: ActiveValue::Set(None),
                progress: ActiveValue::Set(0),
                enrolled_at: ActiveValue::Set(now),
            };
            if let Err(err) = enrollment.insert(&self.database).await {
                tracing::warn!(course = %link.course_id, "cascade enrollment failed: {err}");
            }
        }

        let products = membership_products::Entity::find()
            .filter(membership_products::Column::MembershipId.eq(membership_id))
            .all(&self.database)
            .await?;
        for link in &products {
            let present = user_products::Entity::find()
                .filter(user_products::Column::UserId.eq(tx.user_id.clone()))
                .filter(user_products::Column::ProductId.eq(link.product_id.clone()))
                .one(&self.database)
                .await?
                .is_some();
            if present {
                continue;
            }
            let grant = user_products::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                user_id: ActiveValue::Set(tx.user_id.clone()),
                product_id: ActiveValue::Set(link.product_id.clone()),
                transaction_id: ActiveValue::Set(Some(tx.id.clone())),
                price: ActiveValue::Set(0),
                purchased_at: ActiveValue::Set(now),
                is_active: ActiveValue::Set(true),
            };
            if let Err(err) = grant.insert(&self.database).await {
                tracing::warn!(product = %link.product_id, "cascade product grant failed: {err}");
            }
        }

        tracing::info!(
            transaction = %tx.id,
            groups = groups.len(),
            courses = courses.len(),
            products = products.len(),
            "membership cascade applied"
        );
        Ok(())
    }

    /// Pushes the buyer onto a provider list and remembers the list id on the
    /// user row. Failures are logged, never propagated.
    async fn sync_mailing_list(
        &self,
        user: &users::Model,
        list_id: &str,
        purchase_kind: &str,
        purchase_item: &str,
        tx: &transactions::Model,
    ) {
        let attributes = SubscriberAttributes {
            name: user.name.clone(),
            phone: user.phone.clone().or_else(|| tx.customer_phone.clone()),
            purchase_kind: purchase_kind.to_string(),
            purchase_item: purchase_item.to_string(),
            purchased_at: Utc::now(),
            amount: tx.amount,
        };

        if let Err(err) = self
            .mailing
            .add_subscriber(&user.email, list_id, &attributes)
            .await
        {
            tracing::warn!(user = %user.id, list = %list_id, "mailing list sync failed: {err}");
            return;
        }

        if let Err(err) = self.remember_list_subscription(user, list_id).await {
            tracing::warn!(user = %user.id, list = %list_id, "failed to record list subscription: {err}");
        }
    }

    async fn remember_list_subscription(
        &self,
        user: &users::Model,
        list_id: &str,
    ) -> ResultEngine<()> {
        let mut lists = user.mailing_list_ids();
        if lists.iter().any(|id| id == list_id) {
            return Ok(());
        }
        lists.push(list_id.to_string());

        users::Entity::update_many()
            .col_expr(
                users::Column::MailingListIds,
                Expr::value(serde_json::json!(lists)),
            )
            .filter(users::Column::Id.eq(user.id.clone()))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    async fn send_payment_success(
        &self,
        tx: &transactions::Model,
        user: &users::Model,
        item_name: &str,
    ) {
        let email = notify::payment_success(&PaymentSuccess {
            user_name: tx.customer_name.as_deref().unwrap_or(&user.name),
            amount: tx.amount,
            invoice_number: &tx.id,
            payment_method: tx.payment_method.as_deref().unwrap_or("Online Payment"),
            transaction_date: &tx.created_at.format("%d %B %Y").to_string(),
            item_name,
        });
        let to = tx.customer_email.as_deref().unwrap_or(&user.email);
        let kind_tag = tx.kind.to_lowercase();
        let tags = ["payment", "success", "auto-checked", kind_tag.as_str()];

        if let Err(err) = self.notifier.send(to, &email, &tags).await {
            tracing::warn!(transaction = %tx.id, "payment success email failed: {err}");
        }
    }

    async fn send_membership_activation(
        &self,
        tx: &transactions::Model,
        user: &users::Model,
        membership: &memberships::Model,
        duration: MembershipDuration,
    ) {
        let now = Utc::now();
        let email = notify::membership_activation(&MembershipActivation {
            user_name: tx.customer_name.as_deref().unwrap_or(&user.name),
            membership_name: &membership.name,
            membership_duration: duration.as_str(),
            starts_on: &now.format("%d %B %Y").to_string(),
            ends_on: &duration.ends_at(now).format("%d %B %Y").to_string(),
            price: tx.amount,
            invoice_number: &tx.id,
        });
        let to = tx.customer_email.as_deref().unwrap_or(&user.email);
        let tags = ["membership", "activation", "auto-checked"];

        if let Err(err) = self.notifier.send(to, &email, &tags).await {
            tracing::warn!(transaction = %tx.id, "membership activation email failed: {err}");
        }
    }
}
