//! Execution of (bulk) mutations against Google on behalf of a user.
//!
//! Metered mutations reserve all their units up front. Units of items that
//! then fail are handed back, and the listings they touched are invalidated
//! once at least one item went through.

use std::future::Future;

use api_auth::GoogleToken;
use common::{
    error::Res,
    feature::{Feature, FeatureResponse, FeatureResult, LimitKind},
};
use google::{Caller, Collection, GoogleClient};
use limiter::Admission;

use crate::{
    dtos::common::{Labeled, ResourceId},
    provider::{self, Provider},
};

/// Handle passed to each item's operation.
#[derive(Clone, Copy)]
pub struct Call<'a> {
    pub google: &'a GoogleClient,
    pub caller: Caller<'a>,
}

pub struct Mutation {
    action: &'static str,
    limit: Option<(Feature, LimitKind)>,
    invalidates: Vec<Collection>,
}

impl Mutation {
    /// Consumes the `create` allowance of `feature`.
    pub fn create(action: &'static str, feature: Feature) -> Self {
        Self::metered(action, feature, LimitKind::Create)
    }

    /// Consumes the `update` allowance of `feature`.
    pub fn update(action: &'static str, feature: Feature) -> Self {
        Self::metered(action, feature, LimitKind::Update)
    }

    /// Deletes and archives, which no plan limits.
    pub fn unmetered(action: &'static str) -> Self {
        Self {
            action,
            limit: None,
            invalidates: Vec::new(),
        }
    }

    fn metered(action: &'static str, feature: Feature, kind: LimitKind) -> Self {
        Self {
            action,
            limit: Some((feature, kind)),
            invalidates: Vec::new(),
        }
    }

    pub fn invalidates(mut self, collection: Collection) -> Self {
        self.invalidates.push(collection);
        self
    }
}

/// Runs `op` for every item, one after another.
///
/// `op` returns the id of the affected resource when Google reports one.
pub async fn apply<'a, I, F, Fut>(
    provider: &'a Provider,
    token: &'a GoogleToken,
    mutation: Mutation,
    items: Vec<I>,
    op: F,
) -> FeatureResponse
where
    I: Labeled,
    F: Fn(Call<'a>, I) -> Fut,
    Fut: Future<Output = Res<Option<String>>>,
{
    let user_id = token.user_id.as_str();
    let units = items.len() as i32;

    if let Some((feature, kind)) = mutation.limit {
        match provider.tiers.admit(user_id, feature, kind, units).await {
            Ok(Admission::Granted { .. }) => {}
            Ok(Admission::Denied { remaining }) => {
                return FeatureResponse::limit_reached(feature, kind, remaining);
            }
            Err(e) => {
                log::error!("Tier limit check of {} for {} failed: {}", feature, user_id, e);
                return FeatureResponse::failure(&e);
            }
        }
    }

    let call = Call {
        google: &provider.google,
        caller: provider::caller(token),
    };
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let label = item.label();
        let outcome = op(call, item).await;
        results.push(match outcome {
            Ok(id) => FeatureResult::succeeded(id, label),
            Err(e) => {
                log::warn!("{} failed for {} ({}): {}", mutation.action, label, user_id, e);
                FeatureResult::failed(label, &e)
            }
        });
    }

    let failed = results.iter().filter(|r| !r.success).count() as i32;
    if let Some((feature, kind)) = mutation.limit {
        if let Err(e) = provider.tiers.refund(user_id, feature, kind, failed).await {
            log::error!("Failed to refund {} {} unit(s) of {}: {}", failed, kind.as_str(), feature, e);
        }
    }
    if failed < units {
        provider.invalidate(user_id, &mutation.invalidates).await;
    }

    FeatureResponse::from_results(mutation.action, results)
}

/// Deletes every listed member of `collection`.
pub async fn delete_all(
    provider: &Provider,
    token: &GoogleToken,
    action: &'static str,
    collection: Collection,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let target = &collection;
    apply(
        provider,
        token,
        Mutation::unmetered(action).invalidates(collection.clone()),
        items,
        |call, item| async move {
            call.google
                .delete(call.caller, target.api(), &target.item_path(&item.0))
                .await?;
            Ok(Some(item.0))
        },
    )
    .await
}
