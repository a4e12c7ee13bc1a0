use common::error::{AppError, Res};
use google::models::ga::{
    AccessBinding, CustomDimension, CustomMetric, DataStream, Property, WebStreamData,
};
use serde::Deserialize;

use super::common::{Labeled, Validate, ensure_id, ensure_present};

const DIMENSION_SCOPES: [&str; 3] = ["EVENT", "USER", "ITEM"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub display_name: String,
    pub time_zone: String,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub industry_category: Option<String>,
}

impl NewProperty {
    pub fn into_property(self, account_id: &str) -> Property {
        Property {
            parent: format!("accounts/{}", account_id),
            display_name: self.display_name,
            time_zone: Some(self.time_zone),
            currency_code: self.currency_code,
            industry_category: self.industry_category,
            ..Default::default()
        }
    }
}

impl Validate for NewProperty {
    fn validate(&self) -> Res<()> {
        ensure_present("displayName", &self.display_name)?;
        ensure_present("timeZone", &self.time_zone)
    }
}

impl Labeled for NewProperty {
    fn label(&self) -> String {
        self.display_name.clone()
    }
}

/// Partial update; only the fields present end up in the update mask.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    pub property_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub industry_category: Option<String>,
}

impl PropertyUpdate {
    pub fn update_mask(&self) -> String {
        [
            ("displayName", self.display_name.is_some()),
            ("timeZone", self.time_zone.is_some()),
            ("currencyCode", self.currency_code.is_some()),
            ("industryCategory", self.industry_category.is_some()),
        ]
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(field, _)| field)
        .collect::<Vec<_>>()
        .join(",")
    }

    pub fn to_property(&self) -> Property {
        Property {
            display_name: self.display_name.clone().unwrap_or_default(),
            time_zone: self.time_zone.clone(),
            currency_code: self.currency_code.clone(),
            industry_category: self.industry_category.clone(),
            ..Default::default()
        }
    }
}

impl Validate for PropertyUpdate {
    fn validate(&self) -> Res<()> {
        ensure_id("propertyId", &self.property_id)?;
        if let Some(name) = &self.display_name {
            ensure_present("displayName", name)?;
        }
        if self.update_mask().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Nothing to update for property {}",
                self.property_id
            )));
        }
        Ok(())
    }
}

impl Labeled for PropertyUpdate {
    fn label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.property_id.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebStream {
    pub display_name: String,
    pub default_uri: String,
}

impl From<NewWebStream> for DataStream {
    fn from(stream: NewWebStream) -> Self {
        DataStream {
            stream_type: "WEB_DATA_STREAM".to_string(),
            display_name: stream.display_name,
            web_stream_data: Some(WebStreamData {
                measurement_id: None,
                default_uri: stream.default_uri,
            }),
            ..Default::default()
        }
    }
}

impl Validate for NewWebStream {
    fn validate(&self) -> Res<()> {
        ensure_present("displayName", &self.display_name)?;
        if !(self.default_uri.starts_with("https://") || self.default_uri.starts_with("http://")) {
            return Err(AppError::BadRequest(
                "defaultUri must be an http(s) URL".to_string(),
            ));
        }
        Ok(())
    }
}

impl Labeled for NewWebStream {
    fn label(&self) -> String {
        self.display_name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomDimension {
    pub parameter_name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "event_scope")]
    pub scope: String,
}

fn event_scope() -> String {
    "EVENT".to_string()
}

impl From<NewCustomDimension> for CustomDimension {
    fn from(dimension: NewCustomDimension) -> Self {
        CustomDimension {
            parameter_name: dimension.parameter_name,
            display_name: dimension.display_name,
            description: dimension.description,
            scope: dimension.scope,
            ..Default::default()
        }
    }
}

impl Validate for NewCustomDimension {
    fn validate(&self) -> Res<()> {
        ensure_present("parameterName", &self.parameter_name)?;
        ensure_present("displayName", &self.display_name)?;
        if !DIMENSION_SCOPES.contains(&self.scope.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unknown dimension scope '{}'",
                self.scope
            )));
        }
        Ok(())
    }
}

impl Labeled for NewCustomDimension {
    fn label(&self) -> String {
        self.display_name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomMetric {
    pub parameter_name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "standard_unit")]
    pub measurement_unit: String,
}

fn standard_unit() -> String {
    "STANDARD".to_string()
}

impl From<NewCustomMetric> for CustomMetric {
    fn from(metric: NewCustomMetric) -> Self {
        CustomMetric {
            parameter_name: metric.parameter_name,
            display_name: metric.display_name,
            description: metric.description,
            measurement_unit: metric.measurement_unit,
            // the only scope the Admin API accepts for custom metrics
            scope: "EVENT".to_string(),
            ..Default::default()
        }
    }
}

impl Validate for NewCustomMetric {
    fn validate(&self) -> Res<()> {
        ensure_present("parameterName", &self.parameter_name)?;
        ensure_present("displayName", &self.display_name)?;
        ensure_present("measurementUnit", &self.measurement_unit)
    }
}

impl Labeled for NewCustomMetric {
    fn label(&self) -> String {
        self.display_name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversionEvent {
    pub event_name: String,
}

impl Validate for NewConversionEvent {
    fn validate(&self) -> Res<()> {
        ensure_present("eventName", &self.event_name)
    }
}

impl Labeled for NewConversionEvent {
    fn label(&self) -> String {
        self.event_name.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccessBinding {
    /// Email address of the user to grant access to.
    pub user: String,
    pub roles: Vec<String>,
}

impl From<NewAccessBinding> for AccessBinding {
    fn from(binding: NewAccessBinding) -> Self {
        AccessBinding {
            name: String::new(),
            user: binding.user,
            roles: binding
                .roles
                .into_iter()
                .map(|role| {
                    if role.starts_with("predefinedRoles/") {
                        role
                    } else {
                        format!("predefinedRoles/{}", role)
                    }
                })
                .collect(),
        }
    }
}

impl Validate for NewAccessBinding {
    fn validate(&self) -> Res<()> {
        if !self.user.contains('@') {
            return Err(AppError::BadRequest(format!(
                "'{}' is not an email address",
                self.user
            )));
        }
        if self.roles.is_empty() {
            return Err(AppError::BadRequest("roles must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Labeled for NewAccessBinding {
    fn label(&self) -> String {
        self.user.clone()
    }
}
