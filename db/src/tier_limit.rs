use common::{
    error::{AppError, Res},
    feature::{Feature, LimitKind},
};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{dtos::tier_limit::PlanLimit, models::tier_limit::TierLimit};

pub async fn get_limits_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
) -> Res<Vec<TierLimit>> {
    sqlx::query_as::<_, TierLimit>(
        r#"
        SELECT t.* FROM tier_limits t
        JOIN subscriptions s ON s.id = t.subscription_id
        WHERE s.user_id = $1
        ORDER BY t.feature
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_limit<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
    feature: Feature,
) -> Res<Option<TierLimit>> {
    sqlx::query_as::<_, TierLimit>(
        r#"
        SELECT t.* FROM tier_limits t
        JOIN subscriptions s ON s.id = t.subscription_id
        WHERE s.user_id = $1 AND t.feature = $2
        "#,
    )
    .bind(user_id)
    .bind(feature.as_str())
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Increments usage by `units` only if the result stays within the limit.
///
/// The check and the increment are one statement, so concurrent requests
/// cannot both pass the gate on the last unit. Returns the remaining units
/// after the increment, or `None` when the reservation was refused.
pub async fn try_consume<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
    feature: Feature,
    kind: LimitKind,
    units: i32,
) -> Res<Option<i32>> {
    let sql = match kind {
        LimitKind::Create => {
            r#"
            UPDATE tier_limits t
            SET create_usage = t.create_usage + $3
            FROM subscriptions s
            WHERE s.id = t.subscription_id AND s.user_id = $1 AND t.feature = $2
              AND t.create_usage + $3 <= t.create_limit
            RETURNING t.create_limit - t.create_usage
            "#
        }
        LimitKind::Update => {
            r#"
            UPDATE tier_limits t
            SET update_usage = t.update_usage + $3
            FROM subscriptions s
            WHERE s.id = t.subscription_id AND s.user_id = $1 AND t.feature = $2
              AND t.update_usage + $3 <= t.update_limit
            RETURNING t.update_limit - t.update_usage
            "#
        }
    };

    sqlx::query_scalar::<_, i32>(sql)
        .bind(user_id)
        .bind(feature.as_str())
        .bind(units)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Gives back units reserved for operations that did not go through.
pub async fn release<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
    feature: Feature,
    kind: LimitKind,
    units: i32,
) -> Res<()> {
    let sql = match kind {
        LimitKind::Create => {
            r#"
            UPDATE tier_limits t
            SET create_usage = GREATEST(t.create_usage - $3, 0)
            FROM subscriptions s
            WHERE s.id = t.subscription_id AND s.user_id = $1 AND t.feature = $2
            "#
        }
        LimitKind::Update => {
            r#"
            UPDATE tier_limits t
            SET update_usage = GREATEST(t.update_usage - $3, 0)
            FROM subscriptions s
            WHERE s.id = t.subscription_id AND s.user_id = $1 AND t.feature = $2
            "#
        }
    };

    sqlx::query(sql)
        .bind(user_id)
        .bind(feature.as_str())
        .bind(units)
        .execute(executor)
        .await
        .map(|_| ())
        .map_err(AppError::from)
}

/// Sets the limits granted by a plan, keeping current usage.
pub async fn upsert_limit<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
    limit: &PlanLimit,
) -> Res<TierLimit> {
    sqlx::query_as::<_, TierLimit>(
        r#"
        INSERT INTO tier_limits (subscription_id, feature, create_limit, update_limit)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (subscription_id, feature)
        DO UPDATE SET create_limit = EXCLUDED.create_limit, update_limit = EXCLUDED.update_limit
        RETURNING *
        "#,
    )
    .bind(subscription_id)
    .bind(limit.feature.as_str())
    .bind(limit.create_limit)
    .bind(limit.update_limit)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Zeroes all limits of a subscription, used when it ends.
pub async fn revoke_limits<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
) -> Res<u64> {
    sqlx::query("UPDATE tier_limits SET create_limit = 0, update_limit = 0 WHERE subscription_id = $1")
        .bind(subscription_id)
        .execute(executor)
        .await
        .map(|res| res.rows_affected())
        .map_err(AppError::from)
}

/// Starts a new billing cycle.
pub async fn reset_usage<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
) -> Res<u64> {
    sqlx::query("UPDATE tier_limits SET create_usage = 0, update_usage = 0 WHERE subscription_id = $1")
        .bind(subscription_id)
        .execute(executor)
        .await
        .map(|res| res.rows_affected())
        .map_err(AppError::from)
}
