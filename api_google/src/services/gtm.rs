use api_auth::GoogleToken;
use common::{
    error::AppError,
    feature::{Feature, FeatureResponse},
};
use google::{
    Api, Collection, WorkspaceRef,
    models::{
        gtm::{
            Container, CreateVersionOptions, CreateVersionResponse, PublishVersionResponse,
            Trigger, UserPermission, Variable, Workspace,
        },
        resource_id,
    },
};
use serde_json::json;

use crate::{
    dtos::{
        common::{AccountQuery, ContainerQuery, ResourceId, WorkspaceQuery},
        gtm::{
            CreateVersionRequest, NewContainer, NewPermission, NewTrigger, NewVariable,
            NewWorkspace, PublishVersionRequest, TriggerUpdate, VariableUpdate,
        },
    },
    provider::Provider,
    services::mutation::{self, Mutation},
};

fn workspace_of(query: &WorkspaceQuery) -> WorkspaceRef {
    WorkspaceRef::new(&query.account_id, &query.container_id, &query.workspace_id)
}

fn containers_of(account: &AccountQuery) -> Collection {
    Collection::GtmContainers {
        account_id: account.account_id.clone(),
    }
}

fn workspaces_of(container: &ContainerQuery) -> Collection {
    Collection::GtmWorkspaces {
        account_id: container.account_id.clone(),
        container_id: container.container_id.clone(),
    }
}

fn versions_of(container: &ContainerQuery) -> Collection {
    Collection::GtmVersionHeaders {
        account_id: container.account_id.clone(),
        container_id: container.container_id.clone(),
    }
}

pub async fn create_containers(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<NewContainer>,
) -> FeatureResponse {
    let collection = containers_of(&account);
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create containers", Feature::GTMContainers)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let container: Container = call
                .google
                .create(call.caller, Api::TagManager, path, &Container::from(item))
                .await?;
            Ok(Some(container.container_id))
        },
    )
    .await
}

pub async fn delete_containers(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    mutation::delete_all(provider, token, "Delete containers", containers_of(&account), items)
        .await
}

pub async fn create_workspaces(
    provider: &Provider,
    token: &GoogleToken,
    container: ContainerQuery,
    items: Vec<NewWorkspace>,
) -> FeatureResponse {
    let collection = workspaces_of(&container);
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create workspaces", Feature::GTMWorkspaces)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let workspace: Workspace = call
                .google
                .create(call.caller, Api::TagManager, path, &Workspace::from(item))
                .await?;
            Ok(Some(workspace.workspace_id))
        },
    )
    .await
}

pub async fn delete_workspaces(
    provider: &Provider,
    token: &GoogleToken,
    container: ContainerQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    mutation::delete_all(provider, token, "Delete workspaces", workspaces_of(&container), items)
        .await
}

pub async fn create_triggers(
    provider: &Provider,
    token: &GoogleToken,
    workspace: WorkspaceQuery,
    items: Vec<NewTrigger>,
) -> FeatureResponse {
    let collection = Collection::GtmTriggers(workspace_of(&workspace));
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create triggers", Feature::GTMTriggers).invalidates(collection.clone()),
        items,
        |call, item| async move {
            let mut trigger = item.0.0;
            trigger.trigger_id.clear();
            let trigger: Trigger = call
                .google
                .create(call.caller, Api::TagManager, path, &trigger)
                .await?;
            Ok(Some(trigger.trigger_id))
        },
    )
    .await
}

pub async fn update_triggers(
    provider: &Provider,
    token: &GoogleToken,
    workspace: WorkspaceQuery,
    items: Vec<TriggerUpdate>,
) -> FeatureResponse {
    let collection = Collection::GtmTriggers(workspace_of(&workspace));
    let target = &collection;

    mutation::apply(
        provider,
        token,
        Mutation::update("Update triggers", Feature::GTMTriggers).invalidates(collection.clone()),
        items,
        |call, item| async move {
            let trigger = item.0.0;
            let path = target.item_path(&trigger.trigger_id);
            let updated: Trigger = call
                .google
                .replace(call.caller, Api::TagManager, &path, &trigger)
                .await?;
            Ok(Some(updated.trigger_id))
        },
    )
    .await
}

pub async fn delete_triggers(
    provider: &Provider,
    token: &GoogleToken,
    workspace: WorkspaceQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GtmTriggers(workspace_of(&workspace));
    mutation::delete_all(provider, token, "Delete triggers", collection, items).await
}

pub async fn create_variables(
    provider: &Provider,
    token: &GoogleToken,
    workspace: WorkspaceQuery,
    items: Vec<NewVariable>,
) -> FeatureResponse {
    let collection = Collection::GtmVariables(workspace_of(&workspace));
    let path = collection.path();
    let path = path.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Create variables", Feature::GTMVariables)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let mut variable = item.0.0;
            variable.variable_id.clear();
            let variable: Variable = call
                .google
                .create(call.caller, Api::TagManager, path, &variable)
                .await?;
            Ok(Some(variable.variable_id))
        },
    )
    .await
}

pub async fn update_variables(
    provider: &Provider,
    token: &GoogleToken,
    workspace: WorkspaceQuery,
    items: Vec<VariableUpdate>,
) -> FeatureResponse {
    let collection = Collection::GtmVariables(workspace_of(&workspace));
    let target = &collection;

    mutation::apply(
        provider,
        token,
        Mutation::update("Update variables", Feature::GTMVariables)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let variable = item.0.0;
            let path = target.item_path(&variable.variable_id);
            let updated: Variable = call
                .google
                .replace(call.caller, Api::TagManager, &path, &variable)
                .await?;
            Ok(Some(updated.variable_id))
        },
    )
    .await
}

pub async fn delete_variables(
    provider: &Provider,
    token: &GoogleToken,
    workspace: WorkspaceQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GtmVariables(workspace_of(&workspace));
    mutation::delete_all(provider, token, "Delete variables", collection, items).await
}

/// Snapshots a workspace into a new container version.
pub async fn create_version(
    provider: &Provider,
    token: &GoogleToken,
    request: CreateVersionRequest,
) -> FeatureResponse {
    let container = ContainerQuery {
        account_id: request.workspace.account_id.clone(),
        container_id: request.workspace.container_id.clone(),
    };

    mutation::apply(
        provider,
        token,
        Mutation::create("Create version", Feature::GTMVersions)
            .invalidates(versions_of(&container))
            .invalidates(workspaces_of(&container)),
        vec![request],
        |call, request| async move {
            let path = workspace_of(&request.workspace).to_string();
            let response: CreateVersionResponse = call
                .google
                .action(
                    call.caller,
                    Api::TagManager,
                    &path,
                    "create_version",
                    &CreateVersionOptions {
                        name: request.name,
                        notes: request.notes,
                    },
                )
                .await?;
            if response.compiler_error == Some(true) {
                return Err(AppError::BadRequest(
                    "Workspace has compiler errors, fix them before creating a version"
                        .to_string(),
                ));
            }
            Ok(response
                .container_version
                .map(|version| version.container_version_id))
        },
    )
    .await
}

/// Publishes an existing container version; counts against the update allowance.
pub async fn publish_version(
    provider: &Provider,
    token: &GoogleToken,
    request: PublishVersionRequest,
) -> FeatureResponse {
    let versions = versions_of(&request.container);
    let target = &versions;

    mutation::apply(
        provider,
        token,
        Mutation::update("Publish version", Feature::GTMVersions).invalidates(versions.clone()),
        vec![request],
        |call, request| async move {
            let response: PublishVersionResponse = call
                .google
                .action(
                    call.caller,
                    Api::TagManager,
                    &target.item_path(&request.version_id),
                    "publish",
                    &json!({}),
                )
                .await?;
            if response.compiler_error == Some(true) {
                return Err(AppError::BadRequest(format!(
                    "Version {} has compiler errors",
                    request.version_id
                )));
            }
            Ok(Some(request.version_id))
        },
    )
    .await
}

pub async fn create_permissions(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<NewPermission>,
) -> FeatureResponse {
    let collection = Collection::GtmPermissions {
        account_id: account.account_id.clone(),
    };
    let path = collection.path();
    let path = path.as_str();
    let account_id = account.account_id.as_str();

    mutation::apply(
        provider,
        token,
        Mutation::create("Grant permissions", Feature::GTMPermissions)
            .invalidates(collection.clone()),
        items,
        |call, item| async move {
            let permission: UserPermission = call
                .google
                .create(call.caller, Api::TagManager, path, &item.into_permission(account_id))
                .await?;
            Ok(Some(resource_id(&permission.path).to_string()))
        },
    )
    .await
}

pub async fn delete_permissions(
    provider: &Provider,
    token: &GoogleToken,
    account: AccountQuery,
    items: Vec<ResourceId>,
) -> FeatureResponse {
    let collection = Collection::GtmPermissions {
        account_id: account.account_id,
    };
    mutation::delete_all(provider, token, "Revoke permissions", collection, items).await
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing;

    fn workspace() -> WorkspaceQuery {
        WorkspaceQuery {
            account_id: "1".to_string(),
            container_id: "2".to_string(),
            workspace_id: "3".to_string(),
        }
    }

    #[tokio::test]
    async fn updates_replace_the_whole_trigger() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(
                "/tagmanager/v2/accounts/1/containers/2/workspaces/3/triggers/9",
            ))
            .and(body_partial_json(json!({ "name": "Checkout", "type": "pageview" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "triggerId": "9", "name": "Checkout", "type": "pageview"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = testing::MemoryLedger::with("user_1", Feature::GTMTriggers, (0, 0), (1, 0));
        let provider = testing::provider(&server, ledger);
        let update: TriggerUpdate = serde_json::from_value(json!({
            "triggerId": "9", "name": "Checkout", "type": "pageview"
        }))
        .unwrap();

        let response =
            update_triggers(&provider, &testing::token("user_1"), workspace(), vec![update]).await;

        assert!(response.success, "{}", response.message);
        assert_eq!(response.results[0].id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn compiler_errors_fail_version_creation_and_refund() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/tagmanager/v2/accounts/1/containers/2/workspaces/3:create_version",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "compilerError": true })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ledger = testing::MemoryLedger::with("user_1", Feature::GTMVersions, (1, 0), (0, 0));
        let provider = testing::provider(&server, ledger);

        let response = create_version(
            &provider,
            &testing::token("user_1"),
            CreateVersionRequest {
                workspace: workspace(),
                name: "Release 1".to_string(),
                notes: None,
            },
        )
        .await;

        assert!(!response.success);
        assert_eq!(
            provider
                .tiers
                .remaining(
                    "user_1",
                    Feature::GTMVersions,
                    common::feature::LimitKind::Create
                )
                .await
                .unwrap(),
            1
        );
    }
}
