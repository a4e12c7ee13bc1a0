use db::dtos::tier_limit::PlanLimit;
use serde::Serialize;

/// Recurring Stripe price offered on the pricing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub interval: String,
    pub limits: Vec<PlanLimit>,
}
