use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub price_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Statuses in which the plan's limits apply.
pub fn is_active_status(status: &str) -> bool {
    matches!(status, "active" | "trialing")
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        is_active_status(&self.status)
    }
}
