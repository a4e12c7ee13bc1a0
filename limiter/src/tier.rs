use std::sync::Arc;

use async_trait::async_trait;
use common::{
    error::Res,
    feature::{Feature, LimitKind},
};
use db::models::tier_limit::TierLimit;
use sqlx::PgPool;

/// Storage of per-feature usage counters.
///
/// `try_consume` must check and increment in one atomic step.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    async fn limit(&self, user_id: &str, feature: Feature) -> Res<Option<TierLimit>>;

    async fn limits(&self, user_id: &str) -> Res<Vec<TierLimit>>;

    /// Returns remaining units after consuming, `None` when it would exceed the limit.
    async fn try_consume(
        &self,
        user_id: &str,
        feature: Feature,
        kind: LimitKind,
        units: i32,
    ) -> Res<Option<i32>>;

    async fn release(&self, user_id: &str, feature: Feature, kind: LimitKind, units: i32)
    -> Res<()>;
}

pub struct PgLedger {
    pool: Arc<PgPool>,
}

impl PgLedger {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLedger for PgLedger {
    async fn limit(&self, user_id: &str, feature: Feature) -> Res<Option<TierLimit>> {
        db::tier_limit::get_limit(&*self.pool, user_id, feature).await
    }

    async fn limits(&self, user_id: &str) -> Res<Vec<TierLimit>> {
        db::tier_limit::get_limits_by_user_id(&*self.pool, user_id).await
    }

    async fn try_consume(
        &self,
        user_id: &str,
        feature: Feature,
        kind: LimitKind,
        units: i32,
    ) -> Res<Option<i32>> {
        db::tier_limit::try_consume(&*self.pool, user_id, feature, kind, units).await
    }

    async fn release(
        &self,
        user_id: &str,
        feature: Feature,
        kind: LimitKind,
        units: i32,
    ) -> Res<()> {
        db::tier_limit::release(&*self.pool, user_id, feature, kind, units).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted { remaining: i32 },
    Denied { remaining: i32 },
}

/// Decides whether a create/update operation fits in the user's plan.
#[derive(Clone)]
pub struct TierGate {
    ledger: Arc<dyn UsageLedger>,
}

impl TierGate {
    pub fn new(ledger: Arc<dyn UsageLedger>) -> Self {
        Self { ledger }
    }

    /// `limit - usage`; a feature without a limit row has nothing remaining.
    pub async fn remaining(&self, user_id: &str, feature: Feature, kind: LimitKind) -> Res<i32> {
        Ok(self
            .ledger
            .limit(user_id, feature)
            .await?
            .map(|limit| limit.remaining(kind))
            .unwrap_or(0))
    }

    /// Reserves `units` against the limit. Nothing is reserved when denied.
    pub async fn admit(
        &self,
        user_id: &str,
        feature: Feature,
        kind: LimitKind,
        units: i32,
    ) -> Res<Admission> {
        match self.ledger.try_consume(user_id, feature, kind, units).await? {
            Some(remaining) => {
                log::debug!(
                    "Reserved {} {} unit(s) of {} for {}, {} left",
                    units,
                    kind.as_str(),
                    feature,
                    user_id,
                    remaining
                );
                Ok(Admission::Granted { remaining })
            }
            None => {
                let remaining = self.remaining(user_id, feature, kind).await?;
                log::info!(
                    "Tier limit denied {} {} unit(s) of {} for {} ({} remaining)",
                    units,
                    kind.as_str(),
                    feature,
                    user_id,
                    remaining
                );
                Ok(Admission::Denied { remaining })
            }
        }
    }

    /// Returns units reserved for operations that failed.
    pub async fn refund(
        &self,
        user_id: &str,
        feature: Feature,
        kind: LimitKind,
        units: i32,
    ) -> Res<()> {
        if units <= 0 {
            return Ok(());
        }
        self.ledger.release(user_id, feature, kind, units).await
    }

    /// All limits of the user's plan.
    pub async fn overview(&self, user_id: &str) -> Res<Vec<TierLimit>> {
        self.ledger.limits(user_id).await
    }
}
