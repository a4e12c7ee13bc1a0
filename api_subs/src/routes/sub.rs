use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::UserClaims,
    stripe,
};
use sqlx::PgPool;

use crate::{
    dtos::sub::{
        CheckoutRequest, CurrentSubscriptionResponse, PortalRequest, RedirectResponse,
        SubscriptionPlansResponse,
    },
    services,
};

/// Retrieves the subscription plans and the tier limits each one grants.
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/sub/plans');
/// const { plans } = await response.json();
/// // [{ id: "price_123", productId: "prod_1", name: "Pro", price: 1900, currency: "usd",
/// //    interval: "month", limits: [{ feature: "GTMTriggers", createLimit: 50, updateLimit: 100 }] }]
/// ```
#[get("/plans")]
pub async fn get_plans(config: web::Data<Arc<Config>>) -> Res<impl Responder> {
    let client = stripe::create_client(&config.stripe_secret_key);
    let plans = services::plan::get_subscription_plans(&client).await?;
    Success::ok(SubscriptionPlansResponse { plans })
}

/// Subscription row of the caller.
#[get("/current")]
pub async fn get_current(
    claims: web::ReqData<UserClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let subscription =
        db::subscription::get_subscription_by_user_id(pg_pool, claims.user_id()).await?;

    Success::ok(CurrentSubscriptionResponse {
        active: subscription.as_ref().is_some_and(|sub| sub.is_active()),
        subscription,
    })
}

/// Starts a Stripe Checkout for the chosen plan.
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/sub/checkout', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${await getToken()}`
///   },
///   body: JSON.stringify({
///     priceId: "price_1234567890",
///     successUrl: "https://yourapp.com/billing/success",
///     cancelUrl: "https://yourapp.com/billing"
///   })
/// });
/// const { url } = await response.json();
/// window.location.href = url;
/// ```
#[post("/checkout")]
pub async fn post_checkout(
    claims: web::ReqData<UserClaims>,
    req: web::Json<CheckoutRequest>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    req.validate()?;
    let client = stripe::create_client(&config.stripe_secret_key);
    let pg_pool: &PgPool = &pool;

    let customer_id = services::pay::ensure_customer(&client, pg_pool, &claims).await?;
    let session =
        services::pay::create_checkout_session(&client, customer_id, claims.user_id(), &req)
            .await?;

    Success::created(RedirectResponse {
        url: session.url.unwrap_or_default(),
    })
}

/// Opens the Stripe Billing Portal of the caller.
#[post("/portal")]
pub async fn post_portal(
    claims: web::ReqData<UserClaims>,
    req: web::Json<PortalRequest>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let pg_pool: &PgPool = &pool;
    let customer_id = db::subscription::get_subscription_by_user_id(pg_pool, claims.user_id())
        .await?
        .and_then(|sub| sub.stripe_customer_id)
        .ok_or_else(|| AppError::NotFound("No billing account for this user".to_string()))?;

    let client = stripe::create_client(&config.stripe_secret_key);
    let session =
        services::pay::create_portal_session(&client, &customer_id, &req.return_url).await?;

    Success::ok(RedirectResponse { url: session.url })
}
