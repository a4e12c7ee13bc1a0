use common::error::{AppError, Res};
use google::models::gtm::{
    AccountAccess, Container, ContainerAccess, Trigger, UserPermission, Variable, Workspace,
};
use serde::Deserialize;

use super::common::{ContainerQuery, Labeled, Validate, WorkspaceQuery, ensure_id, ensure_present};

const USAGE_CONTEXTS: [&str; 5] = ["web", "android", "ios", "amp", "server"];
const ACCOUNT_PERMISSIONS: [&str; 2] = ["user", "admin"];
const CONTAINER_PERMISSIONS: [&str; 4] = ["read", "edit", "approve", "publish"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContainer {
    pub name: String,
    #[serde(default = "web_context")]
    pub usage_context: Vec<String>,
    #[serde(default)]
    pub domain_name: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn web_context() -> Vec<String> {
    vec!["web".to_string()]
}

impl From<NewContainer> for Container {
    fn from(container: NewContainer) -> Self {
        Container {
            name: container.name,
            usage_context: container.usage_context,
            domain_name: container.domain_name,
            notes: container.notes,
            ..Default::default()
        }
    }
}

impl Validate for NewContainer {
    fn validate(&self) -> Res<()> {
        ensure_present("name", &self.name)?;
        if self.usage_context.is_empty() {
            return Err(AppError::BadRequest(
                "usageContext must not be empty".to_string(),
            ));
        }
        match self
            .usage_context
            .iter()
            .find(|context| !USAGE_CONTEXTS.contains(&context.as_str()))
        {
            Some(context) => Err(AppError::BadRequest(format!(
                "Unknown usage context '{}'",
                context
            ))),
            None => Ok(()),
        }
    }
}

impl Labeled for NewContainer {
    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkspace {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<NewWorkspace> for Workspace {
    fn from(workspace: NewWorkspace) -> Self {
        Workspace {
            name: workspace.name,
            description: workspace.description,
            ..Default::default()
        }
    }
}

impl Validate for NewWorkspace {
    fn validate(&self) -> Res<()> {
        ensure_present("name", &self.name)
    }
}

impl Labeled for NewWorkspace {
    fn label(&self) -> String {
        self.name.clone()
    }
}

/// Trigger as sent by the dashboard; `triggerId` is required for updates only.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct TriggerInput(pub Trigger);

impl TriggerInput {
    fn validate_fields(&self) -> Res<()> {
        ensure_present("name", &self.0.name)?;
        ensure_present("type", &self.0.trigger_type)
    }
}

impl Labeled for TriggerInput {
    fn label(&self) -> String {
        self.0.name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct NewTrigger(pub TriggerInput);

impl Validate for NewTrigger {
    fn validate(&self) -> Res<()> {
        self.0.validate_fields()
    }
}

impl Labeled for NewTrigger {
    fn label(&self) -> String {
        self.0.label()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct TriggerUpdate(pub TriggerInput);

impl Validate for TriggerUpdate {
    fn validate(&self) -> Res<()> {
        ensure_id("triggerId", &self.0.0.trigger_id)?;
        self.0.validate_fields()
    }
}

impl Labeled for TriggerUpdate {
    fn label(&self) -> String {
        self.0.label()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct VariableInput(pub Variable);

impl VariableInput {
    fn validate_fields(&self) -> Res<()> {
        ensure_present("name", &self.0.name)?;
        ensure_present("type", &self.0.variable_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct NewVariable(pub VariableInput);

impl Validate for NewVariable {
    fn validate(&self) -> Res<()> {
        self.0.validate_fields()
    }
}

impl Labeled for NewVariable {
    fn label(&self) -> String {
        self.0.0.name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct VariableUpdate(pub VariableInput);

impl Validate for VariableUpdate {
    fn validate(&self) -> Res<()> {
        ensure_id("variableId", &self.0.0.variable_id)?;
        self.0.validate_fields()
    }
}

impl Labeled for VariableUpdate {
    fn label(&self) -> String {
        self.0.0.name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    #[serde(flatten)]
    pub workspace: WorkspaceQuery,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for CreateVersionRequest {
    fn validate(&self) -> Res<()> {
        self.workspace.validate()?;
        ensure_present("name", &self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishVersionRequest {
    #[serde(flatten)]
    pub container: ContainerQuery,
    pub version_id: String,
}

impl Validate for PublishVersionRequest {
    fn validate(&self) -> Res<()> {
        self.container.validate()?;
        ensure_id("versionId", &self.version_id)
    }
}

impl Labeled for CreateVersionRequest {
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Labeled for PublishVersionRequest {
    fn label(&self) -> String {
        self.version_id.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGrant {
    pub container_id: String,
    pub permission: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPermission {
    pub email_address: String,
    #[serde(default = "user_access")]
    pub account_permission: String,
    #[serde(default)]
    pub container_access: Vec<ContainerGrant>,
}

fn user_access() -> String {
    "user".to_string()
}

impl NewPermission {
    pub fn into_permission(self, account_id: &str) -> UserPermission {
        UserPermission {
            account_id: account_id.to_string(),
            email_address: self.email_address,
            account_access: AccountAccess {
                permission: self.account_permission,
            },
            container_access: self
                .container_access
                .into_iter()
                .map(|grant| ContainerAccess {
                    container_id: grant.container_id,
                    permission: grant.permission,
                })
                .collect(),
            ..Default::default()
        }
    }
}

impl Validate for NewPermission {
    fn validate(&self) -> Res<()> {
        if !self.email_address.contains('@') {
            return Err(AppError::BadRequest(format!(
                "'{}' is not an email address",
                self.email_address
            )));
        }
        if !ACCOUNT_PERMISSIONS.contains(&self.account_permission.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unknown account permission '{}'",
                self.account_permission
            )));
        }
        for grant in &self.container_access {
            ensure_id("containerId", &grant.container_id)?;
            if !CONTAINER_PERMISSIONS.contains(&grant.permission.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "Unknown container permission '{}'",
                    grant.permission
                )));
            }
        }
        Ok(())
    }
}

impl Labeled for NewPermission {
    fn label(&self) -> String {
        self.email_address.clone()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn trigger_update_needs_an_id() {
        let update: TriggerUpdate = serde_json::from_value(json!({
            "name": "Purchase",
            "type": "customEvent"
        }))
        .unwrap();
        assert!(update.validate().is_err());

        let create: NewTrigger = serde_json::from_value(json!({
            "name": "Purchase",
            "type": "customEvent"
        }))
        .unwrap();
        assert!(create.validate().is_ok());
    }

    #[test]
    fn container_defaults_to_web() {
        let container: NewContainer = serde_json::from_value(json!({ "name": "Site" })).unwrap();
        assert_eq!(container.usage_context, ["web"]);
        assert!(container.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_container_permission() {
        let permission: NewPermission = serde_json::from_value(json!({
            "emailAddress": "ana@example.com",
            "containerAccess": [{ "containerId": "3", "permission": "owner" }]
        }))
        .unwrap();
        assert!(permission.validate().is_err());
    }
}
