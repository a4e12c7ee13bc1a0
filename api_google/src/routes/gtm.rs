use actix_web::{Responder, delete, get, post, put, web};
use api_auth::GoogleToken;
use common::{error::Res, http::Success};
use google::{
    Collection, WorkspaceRef,
    models::gtm::{
        Account, BuiltInVariable, Container, ContainerVersionHeader, Trigger, UserPermission,
        Variable, Workspace,
    },
};

use crate::{
    dtos::{
        common::{AccountQuery, Bulk, ContainerQuery, ResourceId, Validate, WorkspaceQuery},
        gtm::{
            CreateVersionRequest, NewContainer, NewPermission, NewTrigger, NewVariable,
            NewWorkspace, PublishVersionRequest, TriggerUpdate, VariableUpdate,
        },
    },
    provider::Provider,
    services::{gtm, listing},
};

fn workspace_ref(query: &WorkspaceQuery) -> WorkspaceRef {
    WorkspaceRef::new(&query.account_id, &query.container_id, &query.workspace_id)
}

#[get("/gtm/accounts")]
async fn list_accounts(provider: web::Data<Provider>, token: GoogleToken) -> Res<impl Responder> {
    let accounts: Vec<Account> =
        listing::list(&provider, &token, &Collection::GtmAccounts).await?;
    Success::ok(accounts)
}

#[get("/gtm/containers")]
async fn list_containers(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<AccountQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GtmContainers {
        account_id: query.into_inner().account_id,
    };
    let containers: Vec<Container> = listing::list(&provider, &token, &collection).await?;
    Success::ok(containers)
}

#[post("/gtm/containers")]
async fn create_containers(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, NewContainer>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::create_containers(&provider, &token, body.parent, body.items).await)
}

#[delete("/gtm/containers")]
async fn delete_containers(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::delete_containers(&provider, &token, body.parent, body.items).await)
}

#[get("/gtm/workspaces")]
async fn list_workspaces(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<ContainerQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let query = query.into_inner();
    let collection = Collection::GtmWorkspaces {
        account_id: query.account_id,
        container_id: query.container_id,
    };
    let workspaces: Vec<Workspace> = listing::list(&provider, &token, &collection).await?;
    Success::ok(workspaces)
}

#[post("/gtm/workspaces")]
async fn create_workspaces(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<ContainerQuery, NewWorkspace>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::create_workspaces(&provider, &token, body.parent, body.items).await)
}

#[delete("/gtm/workspaces")]
async fn delete_workspaces(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<ContainerQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::delete_workspaces(&provider, &token, body.parent, body.items).await)
}

/// Triggers of a workspace.
///
/// # Frontend Example
/// ```javascript
/// const res = await fetch(
///   '/api/dashboard/gtm/triggers?accountId=1&containerId=2&workspaceId=3',
///   { headers: { 'Authorization': `Bearer ${token}` } }
/// );
/// const triggers = await res.json(); // [{ triggerId: "7", name: "Purchase", type: "customEvent", ... }]
/// ```
#[get("/gtm/triggers")]
async fn list_triggers(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<WorkspaceQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GtmTriggers(workspace_ref(&query));
    let triggers: Vec<Trigger> = listing::list(&provider, &token, &collection).await?;
    Success::ok(triggers)
}

#[post("/gtm/triggers")]
async fn create_triggers(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<WorkspaceQuery, NewTrigger>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::create_triggers(&provider, &token, body.parent, body.items).await)
}

#[put("/gtm/triggers")]
async fn update_triggers(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<WorkspaceQuery, TriggerUpdate>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::update_triggers(&provider, &token, body.parent, body.items).await)
}

#[delete("/gtm/triggers")]
async fn delete_triggers(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<WorkspaceQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::delete_triggers(&provider, &token, body.parent, body.items).await)
}

#[get("/gtm/variables")]
async fn list_variables(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<WorkspaceQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GtmVariables(workspace_ref(&query));
    let variables: Vec<Variable> = listing::list(&provider, &token, &collection).await?;
    Success::ok(variables)
}

#[post("/gtm/variables")]
async fn create_variables(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<WorkspaceQuery, NewVariable>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::create_variables(&provider, &token, body.parent, body.items).await)
}

#[put("/gtm/variables")]
async fn update_variables(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<WorkspaceQuery, VariableUpdate>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::update_variables(&provider, &token, body.parent, body.items).await)
}

#[delete("/gtm/variables")]
async fn delete_variables(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<WorkspaceQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::delete_variables(&provider, &token, body.parent, body.items).await)
}

#[get("/gtm/built-in-variables")]
async fn list_built_in_variables(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<WorkspaceQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GtmBuiltInVariables(workspace_ref(&query));
    let variables: Vec<BuiltInVariable> = listing::list(&provider, &token, &collection).await?;
    Success::ok(variables)
}

#[get("/gtm/versions")]
async fn list_versions(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<ContainerQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let query = query.into_inner();
    let collection = Collection::GtmVersionHeaders {
        account_id: query.account_id,
        container_id: query.container_id,
    };
    let versions: Vec<ContainerVersionHeader> =
        listing::list(&provider, &token, &collection).await?;
    Success::ok(versions)
}

/// Snapshots a workspace into a new container version.
#[post("/gtm/versions")]
async fn create_version(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<CreateVersionRequest>,
) -> Res<impl Responder> {
    let request = body.into_inner();
    request.validate()?;
    Success::feature(gtm::create_version(&provider, &token, request).await)
}

#[post("/gtm/versions/publish")]
async fn publish_version(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<PublishVersionRequest>,
) -> Res<impl Responder> {
    let request = body.into_inner();
    request.validate()?;
    Success::feature(gtm::publish_version(&provider, &token, request).await)
}

#[get("/gtm/permissions")]
async fn list_permissions(
    provider: web::Data<Provider>,
    token: GoogleToken,
    query: web::Query<AccountQuery>,
) -> Res<impl Responder> {
    query.validate()?;
    let collection = Collection::GtmPermissions {
        account_id: query.into_inner().account_id,
    };
    let permissions: Vec<UserPermission> = listing::list(&provider, &token, &collection).await?;
    Success::ok(permissions)
}

#[post("/gtm/permissions")]
async fn create_permissions(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, NewPermission>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::create_permissions(&provider, &token, body.parent, body.items).await)
}

#[delete("/gtm/permissions")]
async fn delete_permissions(
    provider: web::Data<Provider>,
    token: GoogleToken,
    body: web::Json<Bulk<AccountQuery, ResourceId>>,
) -> Res<impl Responder> {
    let body = body.into_inner();
    body.validate()?;
    Success::feature(gtm::delete_permissions(&provider, &token, body.parent, body.items).await)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_accounts)
        .service(list_containers)
        .service(create_containers)
        .service(delete_containers)
        .service(list_workspaces)
        .service(create_workspaces)
        .service(delete_workspaces)
        .service(list_triggers)
        .service(create_triggers)
        .service(update_triggers)
        .service(delete_triggers)
        .service(list_variables)
        .service(create_variables)
        .service(update_variables)
        .service(delete_variables)
        .service(list_built_in_variables)
        .service(list_versions)
        .service(create_version)
        .service(publish_version)
        .service(list_permissions)
        .service(create_permissions)
        .service(delete_permissions);
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpMessage, dev::Service, http::StatusCode, test};
    use common::feature::Feature;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing::{self, MemoryLedger};

    const TRIGGERS: &str = "/tagmanager/v2/accounts/1/containers/2/workspaces/3/triggers";

    macro_rules! dashboard {
        ($server:expr, $ledger:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(testing::provider($server, $ledger)))
                    .app_data(web::Data::new(testing::identity($server)))
                    .wrap_fn(|req, srv| {
                        req.extensions_mut().insert(testing::claims("user_1"));
                        srv.call(req)
                    })
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn trigger_update_replaces_it_and_refreshes_the_listing() {
        let server = MockServer::start().await;
        testing::mount_identity(&server, "user_1").await;
        Mock::given(method("GET"))
            .and(path(TRIGGERS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "trigger": [{ "triggerId": "7", "name": "Purchase", "type": "customEvent" }]
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/7", TRIGGERS)))
            .and(body_partial_json(json!({ "name": "Purchase v2", "type": "customEvent" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "triggerId": "7", "name": "Purchase v2", "type": "customEvent"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = MemoryLedger::with("user_1", Feature::GTMTriggers, (0, 0), (5, 0));
        let app = dashboard!(&server, ledger);
        let listing = "/gtm/triggers?accountId=1&containerId=2&workspaceId=3";

        let before: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(listing).to_request())
                .await;
        assert_eq!(before[0]["name"], "Purchase");

        let envelope: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::put()
                .uri("/gtm/triggers")
                .set_json(json!({
                    "accountId": "1",
                    "containerId": "2",
                    "workspaceId": "3",
                    "items": [{ "triggerId": "7", "name": "Purchase v2", "type": "customEvent" }]
                }))
                .to_request(),
        )
        .await;
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["results"][0]["id"], "7");

        // the update dropped the cached listing, so Google is asked again
        let _: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(listing).to_request())
                .await;
    }

    #[actix_web::test]
    async fn publishing_uses_the_version_update_allowance() {
        let server = MockServer::start().await;
        testing::mount_identity(&server, "user_1").await;
        Mock::given(method("POST"))
            .and(path("/tagmanager/v2/accounts/1/containers/2/versions/9:publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "containerVersion": { "containerVersionId": "9", "name": "Launch" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = MemoryLedger::with("user_1", Feature::GTMVersions, (0, 0), (1, 0));
        let app = dashboard!(&server, ledger);
        let publish = || {
            test::TestRequest::post()
                .uri("/gtm/versions/publish")
                .set_json(json!({ "accountId": "1", "containerId": "2", "versionId": "9" }))
                .to_request()
        };

        let first: Value = test::call_and_read_body_json(&app, publish()).await;
        assert_eq!(first["success"], true);
        assert_eq!(first["results"][0]["id"], "9");

        let second: Value = test::call_and_read_body_json(&app, publish()).await;
        assert_eq!(second["limitReached"], true);
        assert_eq!(second["success"], false);
    }

    #[actix_web::test]
    async fn compiler_errors_fail_the_version_and_return_the_unit() {
        let server = MockServer::start().await;
        testing::mount_identity(&server, "user_1").await;
        Mock::given(method("POST"))
            .and(path(
                "/tagmanager/v2/accounts/1/containers/2/workspaces/3:create_version",
            ))
            .and(body_partial_json(json!({ "name": "Release" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "compilerError": true })))
            .expect(2)
            .mount(&server)
            .await;

        let ledger = MemoryLedger::with("user_1", Feature::GTMVersions, (1, 0), (0, 0));
        let app = dashboard!(&server, ledger);

        // a single create unit is enough for both attempts once the first is refunded
        for _ in 0..2 {
            let envelope: Value = test::call_and_read_body_json(
                &app,
                test::TestRequest::post()
                    .uri("/gtm/versions")
                    .set_json(json!({
                        "accountId": "1",
                        "containerId": "2",
                        "workspaceId": "3",
                        "name": "Release"
                    }))
                    .to_request(),
            )
            .await;
            assert_eq!(envelope["success"], false);
            assert_eq!(envelope["limitReached"], false);
            assert_eq!(envelope["errors"].as_array().map(Vec::len), Some(1));
        }
    }

    #[actix_web::test]
    async fn malformed_bodies_are_rejected_before_the_gate() {
        let server = MockServer::start().await;
        testing::mount_identity(&server, "user_1").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        // no limit rows: a request reaching the gate would answer 200 with limitReached
        let app = dashboard!(&server, MemoryLedger::default());
        let requests = [
            test::TestRequest::post().uri("/gtm/triggers").set_json(json!({
                "accountId": "1", "containerId": "2", "workspaceId": "3",
                "items": [{ "name": "No type" }]
            })),
            test::TestRequest::put().uri("/gtm/variables").set_json(json!({
                "accountId": "1", "containerId": "2", "workspaceId": "3",
                "items": [{ "name": "Missing id", "type": "v" }]
            })),
            test::TestRequest::post().uri("/gtm/versions/publish").set_json(json!({
                "accountId": "1", "containerId": "2", "versionId": "latest"
            })),
            test::TestRequest::post().uri("/gtm/containers").set_json(json!({
                "accountId": "1",
                "items": [{ "name": "Site", "usageContext": ["desktop"] }]
            })),
            test::TestRequest::delete().uri("/gtm/workspaces").set_json(json!({
                "accountId": "1", "containerId": "x2", "items": ["3"]
            })),
        ];

        for request in requests {
            let res = test::call_service(&app, request.to_request()).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn deleting_missing_containers_flags_not_found() {
        let server = MockServer::start().await;
        testing::mount_identity(&server, "user_1").await;
        Mock::given(method("DELETE"))
            .and(path("/tagmanager/v2/accounts/1/containers/4"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/tagmanager/v2/accounts/1/containers/5"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "Not found or permission denied." }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = dashboard!(&server, MemoryLedger::default());
        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/gtm/containers")
                .set_json(json!({ "accountId": "1", "items": ["4", "5"] }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let envelope: Value = test::read_body_json(res).await;
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["notFoundError"], true);
        assert_eq!(envelope["results"][0]["success"], true);
        assert_eq!(envelope["results"][1]["notFound"], true);
    }
}
