//! Local effects of billing events.
//!
//! Stripe objects are mapped to a `BillingEvent` first; what the event does to
//! the subscription row and its tier limits is decided here, against a
//! `BillingStore` and a `PlanCatalog`.

use std::sync::Arc;

use async_trait::async_trait;
use common::error::Res;
use db::{
    dtos::{subscription::SubscriptionSync, tier_limit::PlanLimit},
    models::subscription::{Subscription, is_active_status},
};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub enum BillingEvent {
    /// Subscription created or updated.
    Changed(SubscriptionSync),
    /// Subscription deleted.
    Ended(SubscriptionSync),
    /// Renewal invoice of the customer was paid.
    CycleRenewed { customer_id: String },
}

/// Tier limits granted by a price.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    async fn limits_of_price(&self, price_id: &str) -> Res<Vec<PlanLimit>>;
}

/// Persistence of subscription rows and their tier limits.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Mirrors `sync` into the customer's row and makes `limits` the only
    /// limits of the subscription. Features missing from `limits` are zeroed.
    /// Returns `None` when no user is linked to the customer.
    async fn apply_plan(
        &self,
        sync: SubscriptionSync,
        limits: &[PlanLimit],
    ) -> Res<Option<Subscription>>;

    /// Zeroes the usage counters of the customer's subscription.
    async fn reset_usage(&self, customer_id: &str) -> Res<Option<(Subscription, u64)>>;
}

pub struct PgBillingStore {
    pool: Arc<PgPool>,
}

impl PgBillingStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn apply_plan(
        &self,
        sync: SubscriptionSync,
        limits: &[PlanLimit],
    ) -> Res<Option<Subscription>> {
        let mut tx = self.pool.begin().await?;
        let Some(row) = db::subscription::sync_subscription(&mut *tx, sync).await? else {
            return Ok(None);
        };

        db::tier_limit::revoke_limits(&mut *tx, row.id).await?;
        for limit in limits {
            db::tier_limit::upsert_limit(&mut *tx, row.id, limit).await?;
        }

        tx.commit().await?;
        Ok(Some(row))
    }

    async fn reset_usage(&self, customer_id: &str) -> Res<Option<(Subscription, u64)>> {
        let Some(row) = db::subscription::get_subscription_by_customer_id(&*self.pool, customer_id).await?
        else {
            return Ok(None);
        };
        let reset = db::tier_limit::reset_usage(&*self.pool, row.id).await?;
        Ok(Some((row, reset)))
    }
}

/// Applies `event` to the local subscription state.
pub async fn apply(
    store: &dyn BillingStore,
    catalog: &dyn PlanCatalog,
    event: BillingEvent,
) -> Res<()> {
    match event {
        BillingEvent::Changed(sync) => {
            let customer_id = sync.stripe_customer_id.clone();
            // plan lookups happen before any row is locked
            let limits = match (is_active_status(&sync.status), sync.price_id.as_deref()) {
                (true, Some(price_id)) => catalog.limits_of_price(price_id).await?,
                _ => Vec::new(),
            };

            match store.apply_plan(sync, &limits).await? {
                Some(row) => log::info!(
                    "Subscription of {} is {} with {} limited feature(s)",
                    row.user_id,
                    row.status,
                    limits.len()
                ),
                None => log::warn!("Subscription change for unknown customer {}", customer_id),
            }
        }
        BillingEvent::Ended(mut sync) => {
            let customer_id = sync.stripe_customer_id.clone();
            sync.status = "canceled".to_string();
            sync.price_id = None;

            match store.apply_plan(sync, &[]).await? {
                Some(row) => log::info!("Subscription of {} canceled", row.user_id),
                None => log::warn!("Cancellation for unknown customer {}", customer_id),
            }
        }
        BillingEvent::CycleRenewed { customer_id } => match store.reset_usage(&customer_id).await? {
            Some((row, reset)) => {
                log::info!("New billing cycle for {}, reset {} counter(s)", row.user_id, reset)
            }
            None => log::warn!("Paid renewal of unknown customer {}", customer_id),
        },
    }
    Ok(())
}
