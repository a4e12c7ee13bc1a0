use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use common::{
    error::{AppError, Res},
    feature::{Feature, LimitKind},
};
use db::dtos::tier_limit::PlanLimit;
use stripe::{Client, ListPrices, Price, PriceId};

use crate::{models::plan::SubscriptionPlan, services::billing::PlanCatalog};

/// Reads tier limits from product metadata entries such as
/// `GA4Properties.create = "10"`. Unknown features and non-numeric values are skipped.
pub fn limits_from_metadata(metadata: &HashMap<String, String>) -> Vec<PlanLimit> {
    let mut limits: BTreeMap<usize, PlanLimit> = BTreeMap::new();

    for (key, value) in metadata {
        let Some((name, kind)) = key.rsplit_once('.') else {
            continue;
        };
        let kind = match kind {
            "create" => LimitKind::Create,
            "update" => LimitKind::Update,
            _ => continue,
        };
        let Ok(feature) = name.parse::<Feature>() else {
            log::debug!("Ignoring metadata entry '{}' of unknown feature", key);
            continue;
        };
        let amount = match value.trim().parse::<i32>() {
            Ok(amount) if amount >= 0 => amount,
            _ => {
                log::warn!("Ignoring non-numeric plan limit {}={}", key, value);
                continue;
            }
        };

        let position = Feature::ALL
            .iter()
            .position(|f| *f == feature)
            .unwrap_or(Feature::ALL.len());
        let limit = limits.entry(position).or_insert(PlanLimit {
            feature,
            create_limit: 0,
            update_limit: 0,
        });
        match kind {
            LimitKind::Create => limit.create_limit = amount,
            LimitKind::Update => limit.update_limit = amount,
        }
    }

    limits.into_values().collect()
}

fn plan_from_price(price: Price) -> Option<SubscriptionPlan> {
    if price.type_ != Some(stripe::PriceType::Recurring) {
        return None;
    }
    let recurring = price.recurring?;
    let product = price.product.as_ref().and_then(|p| p.as_object())?;

    Some(SubscriptionPlan {
        id: price.id.to_string(),
        product_id: product.id.to_string(),
        name: product.name.clone().unwrap_or_default(),
        description: product.description.clone().unwrap_or_default(),
        price: price.unit_amount.unwrap_or(0),
        currency: price.currency.unwrap_or_default().to_string(),
        interval: recurring.interval.to_string(),
        limits: product
            .metadata
            .as_ref()
            .map(limits_from_metadata)
            .unwrap_or_default(),
    })
}

/// Active recurring prices together with the tier limits of their products.
pub async fn get_subscription_plans(client: &Client) -> Res<Vec<SubscriptionPlan>> {
    let params = ListPrices {
        active: Some(true),
        limit: Some(100),
        expand: &["data.product"],
        ..Default::default()
    };

    let prices = Price::list(client, &params).await.map_err(AppError::from)?;

    let mut plans: Vec<SubscriptionPlan> =
        prices.data.into_iter().filter_map(plan_from_price).collect();
    plans.sort_by_key(|plan| plan.price);
    Ok(plans)
}

/// Tier limits granted by the product behind `price_id`.
pub async fn limits_of_price(client: &Client, price_id: &str) -> Res<Vec<PlanLimit>> {
    let id = price_id
        .parse::<PriceId>()
        .map_err(|e| AppError::Internal(format!("Invalid price id {}: {}", price_id, e)))?;
    let price = Price::retrieve(client, &id, &["product"])
        .await
        .map_err(AppError::from)?;

    Ok(price
        .product
        .as_ref()
        .and_then(|p| p.as_object())
        .and_then(|product| product.metadata.as_ref())
        .map(limits_from_metadata)
        .unwrap_or_default())
}

/// Plans as configured in Stripe.
pub struct StripeCatalog {
    client: Client,
}

impl StripeCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlanCatalog for StripeCatalog {
    async fn limits_of_price(&self, price_id: &str) -> Res<Vec<PlanLimit>> {
        limits_of_price(&self.client, price_id).await
    }
}
