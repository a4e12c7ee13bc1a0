use api_auth::GoogleToken;
use common::feature::{Feature, FeatureResponse};
use google::{
    Api, Collection,
    models::{
        ga::{AccessBinding, ConversionEvent, CustomDimension, CustomMetric, DataStream, Property},
        resource_id,
    },
    resources::GA_V1BETA,
};
use serde_json::{Value, json};

use crate::{
    dtos::{
        common::{AccountQuery, PropertyQuery, ResourceId},
        ga::{
            NewAccessBinding, NewConversionEvent, NewCustomDimension, NewCustomMetric,
            NewProperty, NewWebStream, PropertyUpdate,
        },
    },
    provider::Provider,
    services::mutation::{self, Mutation},
};

fn properties_of(account: &AccountQuery) -> Collection {
    Collection::GaProperties {
        account_id: account.account_id.clone(),
    }
}

pub async fn create_properties(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<NewProperty>,
) -> FeatureResponse {
    let account_id = account.account_id.as_str();
    let collection = properties_of(&account);
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create properties", Feature::GA4Properties)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let property: Property = call
                .google
                .create(call.caller, Api::AnalyticsAdmin, path, &item.into_property(account_id))
                .await?;
            Ok(Some(resource_id(&property.name).to_string()))
        },
    )
    .await
}

pub async fn update_properties(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<PropertyUpdate>,
) -> FeatureResponse {
    mutation::apply(
        provider,
        token,
        Mutation::update("Update properties", Feature::GA4Properties)
            .invalidates(properties_of(&account)),
        items,
        |call, item| async move {
            let path = format!("{}/properties/{}", GA_V1BETA, item.property_id);
            let _: Property = call
                .google
                .patch(
                    call.caller,
                    Api::AnalyticsAdmin,
                    &path,
                    &item.to_property(),
                    &item.update_mask(),
                )
                .await?;
            Ok(Some(item.property_id))
        },
    )
    .await
}

/// Properties move to the trash and are purged by Google after 35 days.
pub async fn delete_properties(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    mutation::delete_all(provider, token, "Delete properties", properties_of(&account), items).await
}

pub async fn create_streams(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<NewWebStream>,
) -> FeatureResponse {
    let collection = Collection::GaDataStreams {
        property_id: property.property_id,
    };
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create data streams", Feature::GA4Streams)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let stream: DataStream = call
                .google
                .create(call.caller, Api::AnalyticsAdmin, path, &DataStream::from(item))
                .await?;
            Ok(Some(resource_id(&stream.name).to_string()))
        },
    )
    .await
}

pub async fn delete_streams(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GaDataStreams {
        property_id: property.property_id,
    };
    mutation::delete_all(provider, token, "Delete data streams", collection, items).await
}

pub async fn create_custom_dimensions(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<NewCustomDimension>,
) -> FeatureResponse {
    let collection = Collection::GaCustomDimensions {
        property_id: property.property_id,
    };
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create custom dimensions", Feature::GA4CustomDimensions)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let dimension: CustomDimension = call
                .google
                .create(call.caller, Api::AnalyticsAdmin, path, &CustomDimension::from(item))
                .await?;
            Ok(Some(resource_id(&dimension.name).to_string()))
        },
    )
    .await
}

pub async fn archive_custom_dimensions(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GaCustomDimensions {
        property_id: property.property_id,
    };
    archive_all(provider, token, "Archive custom dimensions", collection, items).await
}

pub async fn create_custom_metrics(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<NewCustomMetric>,
) -> FeatureResponse {
    let collection = Collection::GaCustomMetrics {
        property_id: property.property_id,
    };
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create custom metrics", Feature::GA4CustomMetrics)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let metric: CustomMetric = call
                .google
                .create(call.caller, Api::AnalyticsAdmin, path, &CustomMetric::from(item))
                .await?;
            Ok(Some(resource_id(&metric.name).to_string()))
        },
    )
    .await
}

pub async fn archive_custom_metrics(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GaCustomMetrics {
        property_id: property.property_id,
    };
    archive_all(provider, token, "Archive custom metrics", collection, items).await
}

pub async fn create_conversion_events(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<NewConversionEvent>,
) -> FeatureResponse {
    let collection = Collection::GaConversionEvents {
        property_id: property.property_id,
    };
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create conversion events", Feature::GA4ConversionEvents)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let event: ConversionEvent = call
                .google
                .create(
                    call.caller,
                    Api::AnalyticsAdmin,
                    path,
                    &json!({ "eventName": item.event_name }),
                )
                .await?;
            Ok(Some(resource_id(&event.name).to_string()))
        },
    )
    .await
}

pub async fn delete_conversion_events(
    provider: &Provider,
    token: &GoogleToken,
    property: PropertyQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GaConversionEvents {
        property_id: property.property_id,
    };
    mutation::delete_all(provider, token, "Delete conversion events", collection, items).await
}

pub async fn create_access_bindings(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<NewAccessBinding>,
) -> FeatureResponse {
    let collection = Collection::GaAccessBindings {
        account_id: account.account_id,
    };
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Grant access", Feature::GA4AccessBindings)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let binding: AccessBinding = call
                .google
                .create(call.caller, Api::AnalyticsAdmin, path, &AccessBinding::from(item))
                .await?;
            Ok(Some(resource_id(&binding.name).to_string()))
        },
    )
    .await
}

pub async fn delete_access_bindings(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GaAccessBindings {
        account_id: account.account_id,
    };
    mutation::delete_all(provider, token, "Revoke access", collection, items).await
}

async fn archive_all(
    provider: &Provider,
    token: &GoogleToken,
    action: &'static str,
    collection: Collection,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let target = &collection;
    mutation::apply(
        provider,
        token,
        Mutation::unmetered(action).invalidates(collection.clone()),
        items,
        |call, item| async move {
            let _: Value = call
                .google
                .action(
                    call.caller,
                    Api::AnalyticsAdmin,
                    &target.item_path(&item.0),
                    "archive",
                    &json!({}),
                )
                .await?;
            Ok(Some(item.0))
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn creates_properties_under_the_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/properties"))
            .and(body_partial_json(json!({ "parent": "accounts/12", "displayName": "Shop" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "properties/345", "displayName": "Shop"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ledger =
            testing::MemoryLedger::with("user_1", Feature::GA4Properties, (2, 0), (0, 0));
        let provider = testing::provider(&server, ledger);

        let response = create_properties(
            &provider,
            &testing::token("user_1"),
            AccountQuery {
                account_id: "12".to_string(),
            },
            vec![NewProperty {
                display_name: "Shop".to_string(),
                time_zone: "Europe/Berlin".to_string(),
                currency_code: None,
                industry_category: None,
            }],
        )
        .await;

        assert!(response.success, "{}", response.message);
        assert_eq!(response.results[0].id.as_deref(), Some("345"));
    }

    #[tokio::test]
    async fn archives_through_custom_method() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/properties/8/customMetrics/4:archive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = testing::provider(&server, testing::MemoryLedger::default());
        let response = archive_custom_metrics(
            &provider,
            &testing::token("user_1"),
            PropertyQuery {
                property_id: "8".to_string(),
            },
            vec![ResourceId("4".to_string())],
        )
        .await;

        assert!(response.success);
    }
}
