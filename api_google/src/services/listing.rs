use api_auth::GoogleToken;
use common::error::Res;
use google::Collection;
use serde::{Serialize, de::DeserializeOwned};

use crate::provider::{self, Provider};

/// Read-through listing of a collection, cached per user.
///
/// Cache failures degrade to a live fetch and never fail the request.
pub async fn list<T>(provider: &Provider, token: &GoogleToken, collection: &Collection) -> Res<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    let key = provider.cache_key(&token.user_id, collection);

    match cache::get_json::<Vec<T>>(provider.cache.as_ref(), &key).await {
        Ok(Some(items)) => {
            log::debug!("Cache hit {}", key);
            return Ok(items);
        }
        Ok(None) => log::debug!("Cache miss {}", key),
        Err(e) => log::warn!("Cache read of {} failed: {}", key, e),
    }

    let items: Vec<T> = provider
        .google
        .list_all(provider::caller(token), collection)
        .await?;

    if let Err(e) = cache::set_json(provider.cache.as_ref(), &key, &items, provider.cache_ttl).await {
        log::warn!("Cache write of {} failed: {}", key, e);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use google::models::gtm::Account;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn second_listing_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tagmanager/v2/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account": [{ "accountId": "1", "name": "Agency" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = testing::provider(&server, testing::MemoryLedger::default());
        let token = testing::token("user_1");

        let first: Vec<Account> = list(&provider, &token, &Collection::GtmAccounts).await.unwrap();
        let second: Vec<Account> = list(&provider, &token, &Collection::GtmAccounts).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second[0].name, "Agency");
    }

    #[tokio::test]
    async fn users_do_not_share_cached_listings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tagmanager/v2/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "account": [] })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = testing::provider(&server, testing::MemoryLedger::default());
        let _: Vec<Account> = list(&provider, &testing::token("user_1"), &Collection::GtmAccounts)
            .await
            .unwrap();
        let _: Vec<Account> = list(&provider, &testing::token("user_2"), &Collection::GtmAccounts)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn provider_errors_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "Insufficient permissions" }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = testing::provider(&server, testing::MemoryLedger::default());
        let token = testing::token("user_1");
        for _ in 0..2 {
            let err = list::<Account>(&provider, &token, &Collection::GtmAccounts)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
    }
}
