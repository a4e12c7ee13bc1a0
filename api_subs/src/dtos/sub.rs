use common::error::{AppError, Res};
use db::models::subscription::Subscription;
use serde::{Deserialize, Serialize};

use crate::models::plan::SubscriptionPlan;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Res<()> {
        if !self.price_id.starts_with("price_") {
            return Err(AppError::BadRequest(format!(
                "'{}' is not a Stripe price id",
                self.price_id
            )));
        }
        if self.success_url.trim().is_empty() || self.cancel_url.trim().is_empty() {
            return Err(AppError::BadRequest(
                "successUrl and cancelUrl are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalRequest {
    pub return_url: String,
}

/// Where the browser should be sent next.
#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionPlansResponse {
    pub plans: Vec<SubscriptionPlan>,
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionResponse {
    pub active: bool,
    pub subscription: Option<Subscription>,
}
