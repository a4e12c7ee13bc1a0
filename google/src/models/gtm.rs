//! Tag Manager API v2 resources.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub account_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub container_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_id: String,
    /// `web`, `android`, `ios`, `amp` or `server`
    pub usage_context: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Workspace {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub container_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Typed key/value used by triggers and variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<Parameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub map: Vec<Parameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    /// `equals`, `contains`, `matchRegex`, ...
    #[serde(rename = "type")]
    pub condition_type: String,
    pub parameter: Vec<Parameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Trigger {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub container_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub trigger_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_event_filter: Vec<Condition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Condition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auto_event_filter: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Variable {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub container_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workspace_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub variable_id: String,
    pub name: String,
    /// Short type code such as `v` (data layer) or `jsm` (custom JavaScript).
    #[serde(rename = "type")]
    pub variable_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BuiltInVariable {
    pub path: String,
    pub account_id: String,
    pub container_id: String,
    pub workspace_id: String,
    #[serde(rename = "type")]
    pub variable_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerVersionHeader {
    pub path: String,
    pub account_id: String,
    pub container_id: String,
    pub container_version_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_triggers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_variables: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerVersion {
    pub path: String,
    pub account_id: String,
    pub container_id: String,
    pub container_version_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Body of `workspaces/{id}:create_version`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateVersionOptions {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateVersionResponse {
    pub container_version: Option<ContainerVersion>,
    pub compiler_error: Option<bool>,
    pub new_workspace_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishVersionResponse {
    pub container_version: Option<ContainerVersion>,
    pub compiler_error: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountAccess {
    /// `user` or `admin`
    pub permission: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerAccess {
    pub container_id: String,
    /// `read`, `edit`, `approve` or `publish`
    pub permission: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPermission {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    pub email_address: String,
    pub account_access: AccountAccess,
    pub container_access: Vec<ContainerAccess>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_custom_event_filters() {
        let trigger: Trigger = serde_json::from_value(json!({
            "path": "accounts/1/containers/2/workspaces/3/triggers/4",
            "triggerId": "4",
            "name": "Purchase",
            "type": "customEvent",
            "customEventFilter": [{
                "type": "equals",
                "parameter": [
                    { "type": "template", "key": "arg0", "value": "{{_event}}" },
                    { "type": "template", "key": "arg1", "value": "purchase" }
                ]
            }]
        }))
        .unwrap();

        assert_eq!(trigger.trigger_type, "customEvent");
        assert_eq!(
            trigger.custom_event_filter[0].parameter[1].value.as_deref(),
            Some("purchase")
        );
    }

    #[test]
    fn new_container_body_has_no_ids() {
        let body = serde_json::to_value(Container {
            name: "Site".to_string(),
            usage_context: vec!["web".to_string()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({ "name": "Site", "usageContext": ["web"] }));
    }
}
