use common::error::{AppError, Res};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const GOOGLE_PROVIDER: &str = "oauth_google";

#[derive(Debug, Deserialize)]
pub struct OAuthAccessToken {
    pub token: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Backend API of the identity provider, used to read the Google OAuth token
/// a user granted when connecting their account.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    api_url: String,
    secret_key: String,
}

impl IdentityClient {
    pub fn new(api_url: String, secret_key: String) -> Self {
        IdentityClient {
            client: Client::new(),
            api_url,
            secret_key,
        }
    }

    pub async fn google_access_token(&self, user_id: &str) -> Res<String> {
        let url = format!(
            "{}/v1/users/{}/oauth_access_tokens/{}",
            self.api_url.trim_end_matches('/'),
            user_id,
            GOOGLE_PROVIDER
        );
        debug!("Fetching Google access token of {}", user_id);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(AppError::Unauthorized(
                    "Google account not connected".to_string(),
                ));
            }
            status => {
                let error_response = response
                    .json::<serde_json::Value>()
                    .await
                    .unwrap_or(serde_json::json!({}));
                let message = error_response["errors"][0]["message"]
                    .as_str()
                    .unwrap_or("Failed to read OAuth token")
                    .to_string();
                warn!("Identity provider answered {}: {}", status, message);
                return Err(AppError::Internal(message));
            }
        }

        let tokens = response.json::<Vec<OAuthAccessToken>>().await?;
        tokens
            .into_iter()
            .map(|t| t.token)
            .find(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Google account not connected".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn returns_first_google_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/user_1/oauth_access_tokens/oauth_google"))
            .and(header("authorization", "Bearer sk_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "object": "oauth_access_token",
                    "token": "ya29.token",
                    "provider": "oauth_google",
                    "scopes": ["https://www.googleapis.com/auth/analytics.edit"]
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = IdentityClient::new(server.uri(), "sk_test".to_string());
        assert_eq!(
            client.google_access_token("user_1").await.unwrap(),
            "ya29.token"
        );
    }

    #[tokio::test]
    async fn empty_token_list_means_not_connected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = IdentityClient::new(server.uri(), "sk_test".to_string());
        let err = client.google_access_token("user_1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn provider_errors_are_internal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "errors": [{ "message": "boom" }]
            })))
            .mount(&server)
            .await;

        let client = IdentityClient::new(server.uri(), "sk_test".to_string());
        let err = client.google_access_token("user_1").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(ref m) if m == "boom"));
    }
}
