use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{dtos::subscription::SubscriptionSync, models::subscription::Subscription};

pub async fn get_subscription_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_subscription_by_customer_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: &str,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE stripe_customer_id = $1")
        .bind(customer_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Creates the subscription row of a user that has just become a billing customer.
pub async fn insert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
    customer_id: &str,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (user_id, stripe_customer_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET stripe_customer_id = EXCLUDED.stripe_customer_id,
                                            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(customer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Applies billing provider state to the row owning the customer.
/// Returns `None` when no user is linked to the customer.
pub async fn sync_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionSync,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions
        SET stripe_subscription_id = $2,
            price_id = $3,
            status = $4,
            current_period_end = $5,
            updated_at = NOW()
        WHERE stripe_customer_id = $1
        RETURNING *
        "#,
    )
    .bind(data.stripe_customer_id)
    .bind(data.stripe_subscription_id)
    .bind(data.price_id)
    .bind(data.status)
    .bind(data.current_period_end)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
