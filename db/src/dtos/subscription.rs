use chrono::NaiveDateTime;

/// Subscription state as reported by the billing provider.
#[derive(Debug, Clone)]
pub struct SubscriptionSync {
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub price_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<NaiveDateTime>,
}
