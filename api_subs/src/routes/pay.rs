use std::sync::Arc;

use actix_web::{HttpRequest, Responder, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    stripe,
};
use sqlx::PgPool;

use crate::services::{
    self,
    billing::PgBillingStore,
    plan::StripeCatalog,
};

/// Handles Stripe webhook events that drive subscriptions and tier limits.
///
/// # Note
/// Called by Stripe, not by the dashboard. Register
/// `https://yourapp.com/api/pay/webhook` in the Stripe Dashboard and
/// subscribe to:
/// - `customer.subscription.created` / `customer.subscription.updated`:
///   the subscription row and the plan's tier limits are synced
/// - `customer.subscription.deleted`: status becomes `canceled`, limits are zeroed
/// - `invoice.paid`: renewal invoices reset the usage counters
#[post("/webhook")]
pub async fn post_webhook(
    payload: String,
    req: HttpRequest,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let signature = match req.headers().get("stripe-signature") {
        Some(signature) => signature.to_str().unwrap_or(""),
        None => return Err(AppError::BadRequest("Stripe signature missing".to_string())),
    };

    let event = services::pay::construct_event(&payload, signature, &config.stripe_webhook_secret)?;
    let store = PgBillingStore::new(pool.get_ref().clone());
    let catalog = StripeCatalog::new(stripe::create_client(&config.stripe_secret_key));
    services::pay::process_webhook_event(&store, &catalog, event).await?;

    Success::ok("Webhook processed successfully")
}
