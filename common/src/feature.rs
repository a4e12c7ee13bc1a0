use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Dashboard features that carry per-plan tier limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    GA4Properties,
    GA4Streams,
    GA4CustomDimensions,
    GA4CustomMetrics,
    GA4ConversionEvents,
    GA4AccessBindings,
    GTMContainers,
    GTMWorkspaces,
    GTMTriggers,
    GTMVariables,
    GTMVersions,
    GTMPermissions,
}

impl Feature {
    pub const ALL: [Feature; 12] = [
        Feature::GA4Properties,
        Feature::GA4Streams,
        Feature::GA4CustomDimensions,
        Feature::GA4CustomMetrics,
        Feature::GA4ConversionEvents,
        Feature::GA4AccessBindings,
        Feature::GTMContainers,
        Feature::GTMWorkspaces,
        Feature::GTMTriggers,
        Feature::GTMVariables,
        Feature::GTMVersions,
        Feature::GTMPermissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::GA4Properties => "GA4Properties",
            Feature::GA4Streams => "GA4Streams",
            Feature::GA4CustomDimensions => "GA4CustomDimensions",
            Feature::GA4CustomMetrics => "GA4CustomMetrics",
            Feature::GA4ConversionEvents => "GA4ConversionEvents",
            Feature::GA4AccessBindings => "GA4AccessBindings",
            Feature::GTMContainers => "GTMContainers",
            Feature::GTMWorkspaces => "GTMWorkspaces",
            Feature::GTMTriggers => "GTMTriggers",
            Feature::GTMVariables => "GTMVariables",
            Feature::GTMVersions => "GTMVersions",
            Feature::GTMPermissions => "GTMPermissions",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown feature '{}'", s)))
    }
}

/// Which counter pair of a tier limit an operation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Create,
    Update,
}

impl LimitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::Create => "create",
            LimitKind::Update => "update",
        }
    }
}

/// Outcome of one item of a (bulk) mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResult {
    pub id: Option<String>,
    pub name: String,
    pub success: bool,
    pub message: String,
    pub not_found: bool,
}

impl FeatureResult {
    pub fn succeeded(id: Option<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            message: format!("{} processed", name),
            id,
            name,
            success: true,
            not_found: false,
        }
    }

    pub fn failed(name: impl Into<String>, error: &AppError) -> Self {
        Self {
            id: None,
            name: name.into(),
            success: false,
            message: error.to_string(),
            not_found: error.is_not_found(),
        }
    }
}

/// Uniform envelope returned by every mutating action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResponse {
    pub success: bool,
    pub message: String,
    pub errors: Vec<String>,
    pub results: Vec<FeatureResult>,
    pub limit_reached: bool,
    pub not_found_error: bool,
}

impl FeatureResponse {
    pub fn limit_reached(feature: Feature, kind: LimitKind, remaining: i32) -> Self {
        let message = format!(
            "{} limit reached for {} ({} remaining)",
            kind.as_str(),
            feature,
            remaining.max(0)
        );
        Self {
            success: false,
            errors: vec![message.clone()],
            message,
            results: Vec::new(),
            limit_reached: true,
            not_found_error: false,
        }
    }

    pub fn failure(error: &AppError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            errors: vec![error.to_string()],
            results: Vec::new(),
            limit_reached: false,
            not_found_error: error.is_not_found(),
        }
    }

    /// Folds per-item results into one envelope.
    pub fn from_results(action: &str, results: Vec<FeatureResult>) -> Self {
        let failed: Vec<&FeatureResult> = results.iter().filter(|r| !r.success).collect();
        let errors: Vec<String> = failed
            .iter()
            .map(|r| format!("{}: {}", r.name, r.message))
            .collect();
        let not_found_error = failed.iter().any(|r| r.not_found);

        let message = if failed.is_empty() {
            format!("{}: {} item(s) succeeded", action, results.len())
        } else if failed.len() == results.len() {
            format!("{}: all {} item(s) failed", action, results.len())
        } else {
            format!(
                "{}: {} of {} item(s) succeeded",
                action,
                results.len() - failed.len(),
                results.len()
            )
        };

        Self {
            success: failed.is_empty(),
            message,
            errors,
            results,
            limit_reached: false,
            not_found_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_round_trip_through_strings() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>().unwrap(), feature);
        }
        assert!("GA4Audiences".parse::<Feature>().is_err());
    }

    #[test]
    fn partial_failure_is_not_success() {
        let results = vec![
            FeatureResult::succeeded(Some("1".into()), "a"),
            FeatureResult::failed("b", &AppError::Internal("boom".into())),
            FeatureResult::succeeded(Some("3".into()), "c"),
        ];
        let envelope = FeatureResponse::from_results("Delete containers", results);

        assert!(!envelope.success);
        assert_eq!(envelope.results.len(), 3);
        assert_eq!(envelope.results.iter().filter(|r| !r.success).count(), 1);
        assert_eq!(envelope.errors, vec!["b: boom".to_string()]);
        assert!(!envelope.not_found_error);
        assert!(!envelope.limit_reached);
        assert_eq!(envelope.message, "Delete containers: 2 of 3 item(s) succeeded");
    }

    #[test]
    fn missing_resource_raises_not_found_flag() {
        let err = AppError::Provider {
            status: 404,
            message: "Requested entity was not found.".into(),
        };
        let envelope =
            FeatureResponse::from_results("Update properties", vec![FeatureResult::failed("x", &err)]);
        assert!(envelope.not_found_error);
        assert_eq!(envelope.message, "Update properties: all 1 item(s) failed");
    }

    #[test]
    fn envelope_serializes_camel_case_flags() {
        let value = serde_json::to_value(FeatureResponse::limit_reached(
            Feature::GTMTriggers,
            LimitKind::Create,
            0,
        ))
        .unwrap();
        assert_eq!(value["limitReached"], true);
        assert_eq!(value["notFoundError"], false);
        assert_eq!(value["success"], false);
    }
}
