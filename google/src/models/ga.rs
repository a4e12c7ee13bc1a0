//! Google Analytics Admin API resources.
//!
//! Output-only fields are skipped when empty so the same types serve as
//! request bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Property {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// `accounts/{id}`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WebStreamData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    pub default_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AndroidAppStreamData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firebase_app_id: Option<String>,
    pub package_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IosAppStreamData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firebase_app_id: Option<String>,
    pub bundle_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DataStream {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// `WEB_DATA_STREAM`, `ANDROID_APP_DATA_STREAM` or `IOS_APP_DATA_STREAM`
    #[serde(rename = "type")]
    pub stream_type: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_stream_data: Option<WebStreamData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_app_stream_data: Option<AndroidAppStreamData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios_app_stream_data: Option<IosAppStreamData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomDimension {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub parameter_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// `EVENT`, `USER` or `ITEM`
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disallow_ads_personalization: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomMetric {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub parameter_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub measurement_unit: String,
    pub scope: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub restricted_metric_type: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionEvent {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counting_method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessBinding {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Email address of the bound user.
    pub user: String,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::resource_id;

    #[test]
    fn reads_web_stream_payload() {
        let stream: DataStream = serde_json::from_value(json!({
            "name": "properties/1/dataStreams/22",
            "type": "WEB_DATA_STREAM",
            "displayName": "Site",
            "webStreamData": { "measurementId": "G-ABC", "defaultUri": "https://example.com" },
            "createTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(resource_id(&stream.name), "22");
        assert_eq!(
            stream.web_stream_data.unwrap().measurement_id.as_deref(),
            Some("G-ABC")
        );
    }

    #[test]
    fn request_body_omits_output_fields() {
        let body = serde_json::to_value(Property {
            parent: "accounts/9".to_string(),
            display_name: "Shop".to_string(),
            time_zone: Some("Europe/Berlin".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            body,
            json!({ "parent": "accounts/9", "displayName": "Shop", "timeZone": "Europe/Berlin" })
        );
    }
}
