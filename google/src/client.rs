use std::sync::Arc;

use common::error::{AppError, Res};
use limiter::ProviderThrottle;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    resources::Collection,
    retry::{self, Attempt, RetryPolicy},
};

/// Safety stop for pagination loops.
const MAX_PAGES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    AnalyticsAdmin,
    TagManager,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub analytics_admin: String,
    pub tag_manager: String,
}

impl Endpoints {
    pub fn url(&self, api: Api, path: &str) -> String {
        let base = match api {
            Api::AnalyticsAdmin => &self.analytics_admin,
            Api::TagManager => &self.tag_manager,
        };
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// User on whose behalf a call is made.
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    pub user_id: &'a str,
    pub access_token: &'a str,
}

impl<'a> Caller<'a> {
    pub fn new(user_id: &'a str, access_token: &'a str) -> Self {
        Self {
            user_id,
            access_token,
        }
    }
}

#[derive(Clone)]
pub struct GoogleClient {
    http: Client,
    endpoints: Endpoints,
    retry: RetryPolicy,
    throttle: Arc<ProviderThrottle>,
}

impl GoogleClient {
    pub fn new(endpoints: Endpoints, retry: RetryPolicy, throttle: Arc<ProviderThrottle>) -> Self {
        Self {
            http: Client::new(),
            endpoints,
            retry,
            throttle,
        }
    }

    /// Sends one request with the user's OAuth token, retrying on quota errors.
    ///
    /// Every attempt waits for the caller's pacing bucket and holds a global
    /// slot only while the request is in flight, never during a backoff pause.
    async fn execute(
        &self,
        caller: Caller<'_>,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Res<Value> {
        log::debug!("Google API {} {}", method, url);

        retry::with_backoff(&self.retry, |_| {
            let method = method.clone();
            async move {
                let _slot = match self.throttle.acquire(caller.user_id).await {
                    Ok(slot) => slot,
                    Err(e) => return Attempt::Fatal(e),
                };
                let mut request = self
                    .http
                    .request(method, url)
                    .bearer_auth(caller.access_token)
                    .query(query);
                if let Some(body) = body {
                    request = request.json(body);
                }
                match request.send().await {
                    Ok(response) => classify(response).await,
                    Err(e) => Attempt::Fatal(e.into()),
                }
            }
        })
        .await
    }

    /// Fetches every page of `collection`.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        caller: Caller<'_>,
        collection: &Collection,
    ) -> Res<Vec<T>> {
        let url = self.endpoints.url(collection.api(), &collection.path());
        let field = collection.items_field();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut query = collection.query();
            if let Some(page_token) = page_token.take() {
                query.push(("pageToken".to_string(), page_token));
            }

            let page = self.execute(caller, Method::GET, &url, &query, None).await?;
            let Value::Object(mut page) = page else {
                return Ok(items);
            };

            if let Some(Value::Array(batch)) = page.remove(field) {
                for item in batch {
                    items.push(serde_json::from_value(item)?);
                }
            }

            match page.remove("nextPageToken") {
                Some(Value::String(next)) if !next.is_empty() => page_token = Some(next),
                _ => return Ok(items),
            }
        }

        log::warn!(
            "Stopped paginating {} after {} pages",
            collection.cache_segment(),
            MAX_PAGES
        );
        Ok(items)
    }

    pub async fn create<T, B>(&self, caller: Caller<'_>, api: Api, path: &str, body: &B) -> Res<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let url = self.endpoints.url(api, path);
        let value = self.execute(caller, Method::POST, &url, &[], Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// PATCH with an explicit field mask, as the Analytics Admin API expects.
    pub async fn patch<T, B>(
        &self,
        caller: Caller<'_>,
        api: Api,
        path: &str,
        body: &B,
        update_mask: &str,
    ) -> Res<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let url = self.endpoints.url(api, path);
        let query = [("updateMask".to_string(), update_mask.to_string())];
        let value = self
            .execute(caller, Method::PATCH, &url, &query, Some(&body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Full replacement, as the Tag Manager API expects for updates.
    pub async fn replace<T, B>(&self, caller: Caller<'_>, api: Api, path: &str, body: &B) -> Res<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let url = self.endpoints.url(api, path);
        let value = self.execute(caller, Method::PUT, &url, &[], Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, caller: Caller<'_>, api: Api, path: &str) -> Res<()> {
        let url = self.endpoints.url(api, path);
        self.execute(caller, Method::DELETE, &url, &[], None).await?;
        Ok(())
    }

    /// Custom method such as `:archive` or `:publish`.
    pub async fn action<T, B>(
        &self,
        caller: Caller<'_>,
        api: Api,
        path: &str,
        verb: &str,
        body: &B,
    ) -> Res<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let url = format!("{}:{}", self.endpoints.url(api, path), verb);
        let value = self.execute(caller, Method::POST, &url, &[], Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }
}

async fn classify(response: Response) -> Attempt<Value> {
    let status = response.status();

    if status.is_success() {
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Attempt::Fatal(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Attempt::Done(Value::Null);
        }
        return match serde_json::from_slice(&bytes) {
            Ok(value) => Attempt::Done(value),
            Err(e) => Attempt::Fatal(e.into()),
        };
    }

    let message = error_message(response).await;
    if status == StatusCode::TOO_MANY_REQUESTS {
        Attempt::Retryable(AppError::TooManyRequests(message))
    } else {
        Attempt::Fatal(AppError::Provider {
            status: status.as_u16(),
            message,
        })
    }
}

/// Google wraps failures as `{"error": {"code", "message", "status"}}`.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| {
            body.get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        })
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::{ga::Property, gtm::Container};

    fn paced_client(server: &MockServer, retry: RetryPolicy, throttle: ProviderThrottle) -> GoogleClient {
        GoogleClient::new(
            Endpoints {
                analytics_admin: server.uri(),
                tag_manager: format!("{}/tagmanager/v2", server.uri()),
            },
            retry,
            Arc::new(throttle),
        )
    }

    fn quick_retries() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_jitter: Duration::from_millis(5),
        }
    }

    fn client(server: &MockServer) -> GoogleClient {
        paced_client(server, quick_retries(), ProviderThrottle::new(1000, 4))
    }

    fn caller(token: &str) -> Caller<'_> {
        Caller::new("user_1", token)
    }

    #[tokio::test]
    async fn retries_quota_errors_then_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/properties"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/properties"))
            .and(query_param("filter", "parent:accounts/100"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": [{ "name": "properties/1", "displayName": "Shop" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let properties: Vec<Property> = client(&server)
            .list_all(
                caller("token-1"),
                &Collection::GaProperties {
                    account_id: "100".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].display_name, "Shop");
    }

    #[tokio::test]
    async fn follows_page_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tagmanager/v2/accounts/7/containers"))
            .and(query_param("pageToken", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "container": [{ "containerId": "2", "name": "Second" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tagmanager/v2/accounts/7/containers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "container": [{ "containerId": "1", "name": "First" }],
                "nextPageToken": "next"
            })))
            .mount(&server)
            .await;

        let containers: Vec<Container> = client(&server)
            .list_all(
                caller("token"),
                &Collection::GtmContainers {
                    account_id: "7".to_string(),
                },
            )
            .await
            .unwrap();

        let ids: Vec<&str> = containers.iter().map(|c| c.container_id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[tokio::test]
    async fn missing_collection_field_is_an_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let accounts: Vec<Value> = client(&server)
            .list_all(caller("token"), &Collection::GaAccounts)
            .await
            .unwrap();
        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/properties/9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "Property not found", "status": "NOT_FOUND" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .delete(caller("token"), Api::AnalyticsAdmin, "v1beta/properties/9")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(
            matches!(err, AppError::Provider { status: 404, ref message } if message == "Property not found")
        );
    }

    #[tokio::test]
    async fn patch_sends_update_mask() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1beta/properties/5"))
            .and(query_param("updateMask", "displayName"))
            .and(body_json(json!({ "displayName": "Renamed" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "properties/5", "displayName": "Renamed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = json!({ "displayName": "Renamed" });
        let property: Property = client(&server)
            .patch(
                caller("token"),
                Api::AnalyticsAdmin,
                "v1beta/properties/5",
                &body,
                "displayName",
            )
            .await
            .unwrap();
        assert_eq!(property.name, "properties/5");
    }

    #[tokio::test]
    async fn action_appends_custom_verb() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/properties/5/customDimensions/3:archive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let _: Value = client(&server)
            .action(
                caller("token"),
                Api::AnalyticsAdmin,
                "v1beta/properties/5/customDimensions/3",
                "archive",
                &json!({}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn every_page_waits_for_the_users_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tagmanager/v2/accounts"))
            .and(query_param("pageToken", "p3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account": [{ "accountId": "3", "name": "Third" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tagmanager/v2/accounts"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account": [{ "accountId": "2", "name": "Second" }],
                "nextPageToken": "p3"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tagmanager/v2/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account": [{ "accountId": "1", "name": "First" }],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let client = paced_client(&server, quick_retries(), ProviderThrottle::new(1, 1));
        let started = Instant::now();
        let accounts: Vec<Value> = client
            .list_all(caller("token"), &Collection::GtmAccounts)
            .await
            .unwrap();

        assert_eq!(accounts.len(), 3);
        // one call per second: pages two and three each wait for a refill
        assert!(started.elapsed() >= Duration::from_millis(1900));
    }

    #[tokio::test]
    async fn backoff_pause_frees_the_global_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer slow"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(800),
            max_jitter: Duration::from_millis(1),
        };
        let client = paced_client(&server, retry, ProviderThrottle::new(1000, 1));

        let throttled = async {
            client
                .list_all::<Value>(Caller::new("user_a", "slow"), &Collection::GaAccounts)
                .await
                .unwrap();
        };
        let other = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let started = Instant::now();
            client
                .list_all::<Value>(Caller::new("user_b", "fast"), &Collection::GaAccounts)
                .await
                .unwrap();
            started.elapsed()
        };
        let ((), waited) = tokio::join!(throttled, other);

        assert!(waited < Duration::from_millis(400));
    }
}
