//! Fixtures shared by the handler and service tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use api_auth::{GoogleToken, IdentityClient};
use async_trait::async_trait;
use cache::{MemoryCache, Revalidator};
use common::{
    error::Res,
    feature::{Feature, LimitKind},
    jwt::UserClaims,
};
use db::models::tier_limit::TierLimit;
use google::{Endpoints, GoogleClient, RetryPolicy};
use limiter::{ProviderThrottle, TierGate, UsageLedger};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::provider::Provider;

#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<HashMap<(String, Feature), TierLimit>>,
}

impl MemoryLedger {
    pub fn with(user: &str, feature: Feature, create: (i32, i32), update: (i32, i32)) -> Self {
        let ledger = Self::default();
        ledger.insert(user, feature, create, update);
        ledger
    }

    pub fn insert(&self, user: &str, feature: Feature, create: (i32, i32), update: (i32, i32)) {
        self.rows.lock().unwrap().insert(
            (user.to_string(), feature),
            TierLimit {
                id: Uuid::new_v4(),
                subscription_id: Uuid::nil(),
                feature: feature.as_str().to_string(),
                create_limit: create.0,
                create_usage: create.1,
                update_limit: update.0,
                update_usage: update.1,
            },
        );
    }
}

#[async_trait]
impl UsageLedger for MemoryLedger {
    async fn limit(&self, user_id: &str, feature: Feature) -> Res<Option<TierLimit>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), feature))
            .cloned())
    }

    async fn limits(&self, user_id: &str) -> Res<Vec<TierLimit>> {
        let mut rows: Vec<TierLimit> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by(|a, b| a.feature.cmp(&b.feature));
        Ok(rows)
    }

    async fn try_consume(
        &self,
        user_id: &str,
        feature: Feature,
        kind: LimitKind,
        units: i32,
    ) -> Res<Option<i32>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(&(user_id.to_string(), feature)) else {
            return Ok(None);
        };
        let (limit, usage) = match kind {
            LimitKind::Create => (row.create_limit, &mut row.create_usage),
            LimitKind::Update => (row.update_limit, &mut row.update_usage),
        };
        if *usage + units > limit {
            return Ok(None);
        }
        *usage += units;
        Ok(Some(limit - *usage))
    }

    async fn release(
        &self,
        user_id: &str,
        feature: Feature,
        kind: LimitKind,
        units: i32,
    ) -> Res<()> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(&(user_id.to_string(), feature)) {
            match kind {
                LimitKind::Create => row.create_usage = (row.create_usage - units).max(0),
                LimitKind::Update => row.update_usage = (row.update_usage - units).max(0),
            }
        }
        Ok(())
    }
}

/// Provider talking to `server` for both Google APIs, with an in-memory
/// cache and quick retries.
pub fn provider(server: &MockServer, ledger: MemoryLedger) -> Provider {
    Provider {
        google: GoogleClient::new(
            Endpoints {
                analytics_admin: server.uri(),
                tag_manager: format!("{}/tagmanager/v2", server.uri()),
            },
            RetryPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(5),
                max_jitter: Duration::from_millis(1),
            },
            Arc::new(ProviderThrottle::new(1000, 4)),
        ),
        cache: Arc::new(MemoryCache::new()),
        tiers: TierGate::new(Arc::new(ledger)),
        revalidator: Revalidator::new(None, String::new()),
        cache_ttl: 60,
    }
}

pub fn token(user_id: &str) -> GoogleToken {
    GoogleToken {
        user_id: user_id.to_string(),
        access_token: format!("ya29.{}", user_id),
    }
}

pub fn claims(user_id: &str) -> UserClaims {
    UserClaims {
        sub: user_id.to_string(),
        exp: usize::MAX,
        email: None,
        name: None,
    }
}

/// Identity client whose token endpoint is served by `server`.
pub fn identity(server: &MockServer) -> IdentityClient {
    IdentityClient::new(server.uri(), "sk_test".to_string())
}

pub async fn mount_identity(server: &MockServer, user_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/users/{}/oauth_access_tokens/oauth_google",
            user_id
        )))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "token": format!("ya29.{}", user_id) }])),
        )
        .mount(server)
        .await;
}
