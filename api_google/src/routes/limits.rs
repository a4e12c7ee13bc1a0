use actix_web::{Responder, get, web};
use common::{error::Res, feature::LimitKind, http::Success, jwt::UserClaims};
use db::models::tier_limit::TierLimit;
use serde::Serialize;

use crate::provider::Provider;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct LimitView {
    feature: String,
    create_limit: i32,
    create_usage: i32,
    create_remaining: i32,
    update_limit: i32,
    update_usage: i32,
    update_remaining: i32,
}

impl From<TierLimit> for LimitView {
    fn from(limit: TierLimit) -> Self {
        Self {
            create_remaining: limit.remaining(LimitKind::Create).max(0),
            update_remaining: limit.remaining(LimitKind::Update).max(0),
            feature: limit.feature,
            create_limit: limit.create_limit,
            create_usage: limit.create_usage,
            update_limit: limit.update_limit,
            update_usage: limit.update_usage,
        }
    }
}

#[get("/limits")]
async fn list_limits(
    provider: web::Data<Provider>,
    claims: web::ReqData<UserClaims>,
) -> Res<impl Responder> {
    let limits = provider.tiers.overview(claims.user_id()).await?;
    Success::ok(limits.into_iter().map(LimitView::from).collect::<Vec<_>>())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_limits);
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpMessage, dev::Service, test};
    use common::feature::Feature;
    use serde_json::{Value, json};
    use wiremock::MockServer;

    use super::*;
    use crate::testing::{self, MemoryLedger};

    #[actix_web::test]
    async fn lists_remaining_counts_of_the_caller() {
        let server = MockServer::start().await;
        let ledger = MemoryLedger::with("user_1", Feature::GTMTriggers, (10, 4), (5, 7));
        ledger.insert("user_2", Feature::GTMTriggers, (1, 0), (1, 0));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(testing::provider(&server, ledger)))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(testing::claims("user_1"));
                    srv.call(req)
                })
                .configure(configure),
        )
        .await;

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/limits").to_request(),
        )
        .await;
        assert_eq!(
            body,
            json!([{
                "feature": "GTMTriggers",
                "createLimit": 10,
                "createUsage": 4,
                "createRemaining": 6,
                "updateLimit": 5,
                "updateUsage": 7,
                "updateRemaining": 0
            }])
        );
    }
}
