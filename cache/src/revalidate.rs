use common::error::{AppError, Res};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct RevalidateRequest<'a> {
    secret: &'a str,
    paths: &'a [&'a str],
}

/// Asks the rendering layer to rebuild pages that show cached listings.
pub struct Revalidator {
    client: Client,
    url: Option<String>,
    secret: String,
}

impl Revalidator {
    pub fn new(url: Option<String>, secret: String) -> Self {
        Self {
            client: Client::new(),
            url,
            secret,
        }
    }

    /// Returns `false` without sending anything when no hook is configured.
    pub async fn revalidate(&self, paths: &[&str]) -> Res<bool> {
        let Some(url) = &self.url else {
            log::debug!("Revalidation hook not configured, skipping {:?}", paths);
            return Ok(false);
        };

        let response = self
            .client
            .post(url.as_str())
            .json(&RevalidateRequest {
                secret: &self.secret,
                paths,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::warn!("Revalidation failed with {}: {}", status, body);
            return Err(AppError::Internal(format!(
                "Revalidation endpoint answered {}",
                status
            )));
        }

        log::info!("Revalidated {} path(s)", paths.len());
        Ok(true)
    }
}
