use actix_web::{Responder, delete, get, patch, post, web};
use api_auth::GoogleToken;
use common::{error::Res, http::Success};
use google::{
    Collection,
    models::ga::{
        AccessBinding, Account, ConversionEvent, CustomDimension, CustomMetric, DataStream,
        Property,
    },
};

use crate::{
    dtos::{
        common::{AccountQuery, Bulk, PropertyQuery, ResourceId, Validate},
        ga::{
            NewAccessBinding, NewConversionEvent, NewCustomDimension, NewCustomMetric,
            NewProperty, NewWebStream, PropertyUpdate,
        },
    },
    provider::Provider,
    services::{ga, listing},
};

/// Analytics accounts the connected Google user can see.
#[get("/ga/accounts")]
async fn list_accounts(provider: web::Data<Provider>, token: GoogleToken) -> Res<impl Responder> {
    let accounts: Vec<Account> = listing::list(&provider, &token, &Collection::GaAccounts).await?;
    Success::ok(accounts)
}

/// GA4 properties of one account.
///
/// # Frontend Example
/// ```javascript
/// const res = await fetch('/api/dashboard/ga/properties?accountId=123', {
///   headers: { 'Authorization': `Bearer ${await getToken()}` }
/// });
/// const properties = await res.json(); // [{ name: "properties/456", displayName: "Shop", ... }]
/// ```
#[get("/ga/properties")]
async fn list_properties(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<AccountQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GaProperties {
        account_id: query.into_inner().account_id,
    };
    let properties: Vec<Property> = listing::list(&provider, &token, &collection).await?;
    Success::ok(properties)
}

/// Creates properties in bulk. Always answers 200 with a `FeatureResponse`.
///
/// # Frontend Example
/// ```javascript
/// await fetch('/api/dashboard/ga/properties', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json', 'Authorization': `Bearer ${token}` },
///   body: JSON.stringify({
///     accountId: "123",
///     items: [{ displayName: "Shop", timeZone: "Europe/Berlin", currencyCode: "EUR" }]
///   })
/// });
/// // { success, message, errors, results: [{ id, name, success, message, notFound }], limitReached, notFoundError }
/// ```
#[post("/ga/properties")]
async fn create_properties(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, NewProperty>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::create_properties(&provider, &token, body.parent, body.items).await)
}

#[patch("/ga/properties")]
async fn update_properties(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, PropertyUpdate>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::update_properties(&provider, &token, body.parent, body.items).await)
}

#[delete("/ga/properties")]
async fn delete_properties(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::delete_properties(&provider, &token, body.parent, body.items).await)
}

#[get("/ga/streams")]
async fn list_streams(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<PropertyQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GaDataStreams {
        property_id: query.into_inner().property_id,
    };
    let streams: Vec<DataStream> = listing::list(&provider, &token, &collection).await?;
    Success::ok(streams)
}

#[post("/ga/streams")]
async fn create_streams(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, NewWebStream>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::create_streams(&provider, &token, body.parent, body.items).await)
}

#[delete("/ga/streams")]
async fn delete_streams(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::delete_streams(&provider, &token, body.parent, body.items).await)
}

#[get("/ga/custom-dimensions")]
async fn list_custom_dimensions(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<PropertyQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GaCustomDimensions {
        property_id: query.into_inner().property_id,
    };
    let dimensions: Vec<CustomDimension> = listing::list(&provider, &token, &collection).await?;
    Success::ok(dimensions)
}

#[post("/ga/custom-dimensions")]
async fn create_custom_dimensions(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, NewCustomDimension>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(
        ga::create_custom_dimensions(&provider, &token, body.parent, body.items).await,
    )
}

#[post("/ga/custom-dimensions/archive")]
async fn archive_custom_dimensions(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(
        ga::archive_custom_dimensions(&provider, &token, body.parent, body.items).await,
    )
}

#[get("/ga/custom-metrics")]
async fn list_custom_metrics(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<PropertyQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GaCustomMetrics {
        property_id: query.into_inner().property_id,
    };
    let metrics: Vec<CustomMetric> = listing::list(&provider, &token, &collection).await?;
    Success::ok(metrics)
}

#[post("/ga/custom-metrics")]
async fn create_custom_metrics(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, NewCustomMetric>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::create_custom_metrics(&provider, &token, body.parent, body.items).await)
}

#[post("/ga/custom-metrics/archive")]
async fn archive_custom_metrics(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::archive_custom_metrics(&provider, &token, body.parent, body.items).await)
}

#[get("/ga/conversion-events")]
async fn list_conversion_events(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<PropertyQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GaConversionEvents {
        property_id: query.into_inner().property_id,
    };
    let events: Vec<ConversionEvent> = listing::list(&provider, &token, &collection).await?;
    Success::ok(events)
}

#[post("/ga/conversion-events")]
async fn create_conversion_events(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, NewConversionEvent>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(
        ga::create_conversion_events(&provider, &token, body.parent, body.items).await,
    )
}

#[delete("/ga/conversion-events")]
async fn delete_conversion_events(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<PropertyQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(
        ga::delete_conversion_events(&provider, &token, body.parent, body.items).await,
    )
}

#[get("/ga/access-bindings")]
async fn list_access_bindings(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<AccountQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GaAccessBindings {
        account_id: query.into_inner().account_id,
    };
    let bindings: Vec<AccessBinding> = listing::list(&provider, &token, &collection).await?;
    Success::ok(bindings)
}

#[post("/ga/access-bindings")]
async fn create_access_bindings(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, NewAccessBinding>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::create_access_bindings(&provider, &token, body.parent, body.items).await)
}

#[delete("/ga/access-bindings")]
async fn delete_access_bindings(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(ga::delete_access_bindings(&provider, &token, body.parent, body.items).await)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_accounts)
        .service(list_properties)
        .service(create_properties)
        .service(update_properties)
        .service(delete_properties)
        .service(list_streams)
        .service(create_streams)
        .service(delete_streams)
        .service(list_custom_dimensions)
        .service(create_custom_dimensions)
        .service(archive_custom_dimensions)
        .service(list_custom_metrics)
        .service(create_custom_metrics)
        .service(archive_custom_metrics)
        .service(list_conversion_events)
        .service(create_conversion_events)
        .service(delete_conversion_events)
        .service(list_access_bindings)
        .service(create_access_bindings)
        .service(delete_access_bindings);
}
