use chrono::{DateTime, NaiveDateTime};
use common::{
    error::{AppError, Res},
    jwt::UserClaims,
    stripe as payments,
};
use db::dtos::subscription::SubscriptionSync;
use sqlx::PgPool;
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, Client, CreateBillingPortalSession,
    CreateCheckoutSession, CustomerId, Event, EventObject, EventType, Expandable, Invoice,
    InvoiceBillingReason, Subscription, Webhook,
};

use crate::{
    dtos::sub::CheckoutRequest,
    services::billing::{self, BillingEvent, BillingStore, PlanCatalog},
};

fn parse_customer_id(customer_id: &str) -> Res<CustomerId> {
    customer_id.parse::<CustomerId>().map_err(|e| {
        AppError::Internal(format!(
            "Failed to parse customer id: {}. {}",
            customer_id, e
        ))
    })
}

fn timestamp(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Returns the Stripe customer of the user, creating it and the
/// subscription row on first use.
pub async fn ensure_customer(client: &Client, pool: &PgPool, claims: &UserClaims) -> Res<CustomerId> {
    let existing = db::subscription::get_subscription_by_user_id(pool, claims.user_id()).await?;
    if let Some(customer_id) = existing.and_then(|sub| sub.stripe_customer_id) {
        return parse_customer_id(&customer_id);
    }

    let customer = payments::create_customer(
        client,
        claims.user_id(),
        claims.email.as_deref(),
        claims.name.as_deref(),
    )
    .await?;
    db::subscription::insert_subscription(pool, claims.user_id(), customer.id.as_str()).await?;
    log::info!("Created billing customer {} for {}", customer.id, claims.user_id());

    Ok(customer.id)
}

/// Creates a subscription mode checkout session for the customer.
pub async fn create_checkout_session(
    client: &Client,
    customer_id: CustomerId,
    user_id: &str,
    req: &CheckoutRequest,
) -> Res<CheckoutSession> {
    let params = CreateCheckoutSession {
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(req.price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Subscription),
        success_url: Some(req.success_url.as_str()),
        cancel_url: Some(req.cancel_url.as_str()),
        client_reference_id: Some(user_id),
        customer: Some(customer_id),
        ..Default::default()
    };
    CheckoutSession::create(client, params)
        .await
        .map_err(AppError::from)
}

pub async fn create_portal_session(
    client: &Client,
    customer_id: &str,
    return_url: &str,
) -> Res<BillingPortalSession> {
    let mut params = CreateBillingPortalSession::new(parse_customer_id(customer_id)?);
    params.return_url = Some(return_url);
    BillingPortalSession::create(client, params)
        .await
        .map_err(AppError::from)
}

/// Verifies the payload against the `stripe-signature` header.
pub fn construct_event(payload: &str, signature: &str, webhook_secret: &str) -> Res<Event> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(event) => Ok(event),
        Err(e) => {
            log::error!("Error constructing webhook event: {}", e);
            Err(AppError::BadRequest(format!("Webhook Error: {}", e)))
        }
    }
}

fn customer_of(customer: &Expandable<stripe::Customer>) -> String {
    match customer {
        Expandable::Id(id) => id.to_string(),
        Expandable::Object(customer) => customer.id.to_string(),
    }
}

fn subscription_sync(subscription: &Subscription) -> SubscriptionSync {
    SubscriptionSync {
        stripe_customer_id: customer_of(&subscription.customer),
        stripe_subscription_id: subscription.id.to_string(),
        price_id: subscription
            .items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.to_string()),
        status: subscription.status.to_string(),
        current_period_end: timestamp(subscription.current_period_end),
    }
}

/// A paid invoice only starts a new cycle when it renews a subscription.
fn renewal_of(invoice: &Invoice) -> Option<BillingEvent> {
    if invoice.billing_reason != Some(InvoiceBillingReason::SubscriptionCycle) {
        return None;
    }
    invoice.customer.as_ref().map(|customer| BillingEvent::CycleRenewed {
        customer_id: customer_of(customer),
    })
}

/// Maps the Stripe events that affect subscriptions and tier limits.
fn billing_event(event: Event) -> Option<BillingEvent> {
    match (event.type_, event.data.object) {
        (
            EventType::CustomerSubscriptionCreated | EventType::CustomerSubscriptionUpdated,
            EventObject::Subscription(subscription),
        ) => Some(BillingEvent::Changed(subscription_sync(&subscription))),
        (EventType::CustomerSubscriptionDeleted, EventObject::Subscription(subscription)) => {
            Some(BillingEvent::Ended(subscription_sync(&subscription)))
        }
        (EventType::InvoicePaid, EventObject::Invoice(invoice)) => renewal_of(&invoice),
        _ => None,
    }
}

/// Processes the webhook event.
pub async fn process_webhook_event(
    store: &dyn BillingStore,
    catalog: &dyn PlanCatalog,
    event: Event,
) -> Res<()> {
    log::info!("Processing webhook event: {}", event.type_);

    let event_type = event.type_.to_string();
    match billing_event(event) {
        Some(mapped) => billing::apply(store, catalog, mapped).await,
        None => {
            log::info!("Unhandled event type: {}", event_type);
            Ok(())
        }
    }
}
