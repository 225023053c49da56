//! Revenue distribution.
//!
//! Splits a confirmed sale: the referring affiliate's commission is credited
//! to their wallet immediately; the platform's shares (15% admin fee, then
//! 60/40 founder/co-founder of what remains) are held as pending revenue
//! until an admin approves the payout.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{ResultEngine, TransactionKind, wallets};

use super::{Engine, with_tx};

const ADMIN_FEE_PERCENT: i64 = 15;
const FOUNDER_SHARE_PERCENT: i64 = 60;

#[derive(Clone, Debug)]
pub struct DistributeRevenueCmd {
    pub amount: i64,
    pub kind: TransactionKind,
    pub affiliate_id: Option<String>,
    pub commission_percent: i64,
    pub membership_id: Option<String>,
    pub transaction_id: String,
}

impl Engine {
    /// Runs the whole split inside one DB transaction: either every ledger
    /// row lands or none does.
    pub async fn distribute_revenue(&self, cmd: DistributeRevenueCmd) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut remaining = cmd.amount;

            if let Some(affiliate_id) = cmd.affiliate_id.as_deref()
                && cmd.commission_percent > 0
            {
                let commission = cmd.amount * cmd.commission_percent / 100;
                self.credit_wallet(
                    &db_tx,
                    affiliate_id,
                    commission,
                    &format!(
                        "Affiliate commission ({}%) for {} sale",
                        cmd.commission_percent,
                        cmd.kind.as_str()
                    ),
                    &cmd.transaction_id,
                )
                .await?;
                remaining -= commission;
            }

            let admin_fee = remaining * ADMIN_FEE_PERCENT / 100;
            self.hold_pending(
                &db_tx,
                self.recipients.admin_user_id.as_deref(),
                "admin",
                admin_fee,
                ADMIN_FEE_PERCENT,
                &cmd.transaction_id,
            )
            .await?;

            let for_founders = remaining - admin_fee;
            let founder_share = for_founders * FOUNDER_SHARE_PERCENT / 100;
            // The co-founder takes the remainder so the split stays exact.
            let cofounder_share = for_founders - founder_share;

            self.hold_pending(
                &db_tx,
                self.recipients.founder_user_id.as_deref(),
                "founder",
                founder_share,
                FOUNDER_SHARE_PERCENT,
                &cmd.transaction_id,
            )
            .await?;
            self.hold_pending(
                &db_tx,
                self.recipients.cofounder_user_id.as_deref(),
                "co-founder",
                cofounder_share,
                100 - FOUNDER_SHARE_PERCENT,
                &cmd.transaction_id,
            )
            .await?;

            Ok(())
        })
    }

    async fn credit_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        amount: i64,
        description: &str,
        transaction_id: &str,
    ) -> ResultEngine<()> {
        if amount == 0 {
            return Ok(());
        }
        let wallet = self.wallet_for(db_tx, user_id).await?;

        let mut active: wallets::ActiveModel = wallet.clone().into();
        active.balance = ActiveValue::Set(wallet.balance + amount);
        active.update(db_tx).await?;

        wallets::entries::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            wallet_id: ActiveValue::Set(wallet.id),
            amount: ActiveValue::Set(amount),
            description: ActiveValue::Set(description.to_string()),
            reference: ActiveValue::Set(transaction_id.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db_tx)
        .await?;
        Ok(())
    }

    async fn hold_pending(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Option<&str>,
        role: &str,
        amount: i64,
        percent: i64,
        transaction_id: &str,
    ) -> ResultEngine<()> {
        if amount == 0 {
            return Ok(());
        }
        let Some(user_id) = user_id else {
            tracing::warn!(role, "no revenue recipient configured, skipping share");
            return Ok(());
        };
        let wallet = self.wallet_for(db_tx, user_id).await?;

        let mut active: wallets::ActiveModel = wallet.clone().into();
        active.pending_balance = ActiveValue::Set(wallet.pending_balance + amount);
        active.update(db_tx).await?;

        wallets::pending_revenues::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            wallet_id: ActiveValue::Set(wallet.id),
            transaction_id: ActiveValue::Set(transaction_id.to_string()),
            amount: ActiveValue::Set(amount),
            percent: ActiveValue::Set(percent as i32),
            status: ActiveValue::Set(wallets::PENDING_STATUS.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db_tx)
        .await?;
        Ok(())
    }

    /// Wallets are created lazily, on the first share a user receives.
    async fn wallet_for(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<wallets::Model> {
        let existing = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?;
        if let Some(wallet) = existing {
            return Ok(wallet);
        }

        Ok(wallets::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            balance: ActiveValue::Set(0),
            pending_balance: ActiveValue::Set(0),
        }
        .insert(db_tx)
        .await?)
    }
}
