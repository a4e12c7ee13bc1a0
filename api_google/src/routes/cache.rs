use actix_web::{Responder, post, web};
use cache::CacheStore;
use common::{error::Res, http::Success, jwt::UserClaims};
use google::resources::DASHBOARD_PAGES;
use serde::Serialize;

use crate::provider::Provider;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    keys_removed: u64,
    revalidated: bool,
}

/// Drops every cached listing of the caller and rebuilds the dashboard pages.
///
/// # Frontend Example
/// ```javascript
/// const res = await fetch('/api/dashboard/cache/refresh', {
///   method: 'POST',
///   headers: { 'Authorization': `Bearer ${token}` }
/// });
/// const { keysRemoved, revalidated } = await res.json();
/// ```
#[post("/cache/refresh")]
async fn refresh(provider: web::Data<Provider>, claims: web::ReqData<UserClaims>) -> Res<impl Responder> {
    let user_id = claims.user_id();
    let keys_removed = provider.cache.flush_user(user_id).await?;
    log::info!("Flushed {} cached listing(s) of {}", keys_removed, user_id);

    let revalidated = match provider.revalidator.revalidate(&DASHBOARD_PAGES).await {
        Ok(revalidated) => revalidated,
        Err(e) => {
            log::warn!("Revalidation after refresh failed: {}", e);
            false
        }
    };

    Success::ok(RefreshResponse {
        keys_removed,
        revalidated,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(refresh);
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpMessage, dev::Service, test};
    use cache::CacheKey;
    use serde_json::Value;
    use wiremock::MockServer;

    use super::*;
    use crate::testing::{self, MemoryLedger};

    #[actix_web::test]
    async fn refresh_flushes_only_the_callers_namespace() {
        let server = MockServer::start().await;
        let provider = web::Data::new(testing::provider(&server, MemoryLedger::default()));
        let mine = CacheKey::new("user_1", "ga:accounts");
        let theirs = CacheKey::new("user_2", "ga:accounts");
        provider.cache.set(&mine, "[]", 60).await.unwrap();
        provider
            .cache
            .set(&CacheKey::new("user_1", "gtm:accounts"), "[]", 60)
            .await
            .unwrap();
        provider.cache.set(&theirs, "[]", 60).await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(provider.clone())
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(testing::claims("user_1"));
                    srv.call(req)
                })
                .configure(configure),
        )
        .await;

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/cache/refresh").to_request(),
        )
        .await;
        assert_eq!(body["keysRemoved"], 2);
        assert_eq!(body["revalidated"], false);
        assert!(provider.cache.get(&mine).await.unwrap().is_none());
        assert!(provider.cache.get(&theirs).await.unwrap().is_some());
    }
}
