//! Addressing of the listable Google collections.

use std::fmt;

use crate::client::Api;

pub const GA_V1BETA: &str = "v1beta";
pub const GA_V1ALPHA: &str = "v1alpha";

/// Page size requested from the Analytics Admin API (its maximum).
const GA_PAGE_SIZE: &str = "200";

/// Every dashboard page that renders a cached listing.
pub const DASHBOARD_PAGES: [&str; 12] = [
    "/dashboard/ga/properties",
    "/dashboard/ga/streams",
    "/dashboard/ga/custom-dimensions",
    "/dashboard/ga/custom-metrics",
    "/dashboard/ga/conversions",
    "/dashboard/ga/access",
    "/dashboard/gtm/containers",
    "/dashboard/gtm/workspaces",
    "/dashboard/gtm/triggers",
    "/dashboard/gtm/variables",
    "/dashboard/gtm/versions",
    "/dashboard/gtm/permissions",
];

/// A Tag Manager workspace, parent of triggers and variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRef {
    pub account_id: String,
    pub container_id: String,
    pub workspace_id: String,
}

impl WorkspaceRef {
    pub fn new(account_id: &str, container_id: &str, workspace_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            container_id: container_id.to_string(),
            workspace_id: workspace_id.to_string(),
        }
    }
}

impl fmt::Display for WorkspaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accounts/{}/containers/{}/workspaces/{}",
            self.account_id, self.container_id, self.workspace_id
        )
    }
}

pub fn container_path(account_id: &str, container_id: &str) -> String {
    format!("accounts/{}/containers/{}", account_id, container_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    GaAccounts,
    GaProperties { account_id: String },
    GaDataStreams { property_id: String },
    GaCustomDimensions { property_id: String },
    GaCustomMetrics { property_id: String },
    GaConversionEvents { property_id: String },
    GaAccessBindings { account_id: String },
    GtmAccounts,
    GtmContainers { account_id: String },
    GtmWorkspaces { account_id: String, container_id: String },
    GtmTriggers(WorkspaceRef),
    GtmVariables(WorkspaceRef),
    GtmBuiltInVariables(WorkspaceRef),
    GtmVersionHeaders { account_id: String, container_id: String },
    GtmPermissions { account_id: String },
}

impl Collection {
    pub fn api(&self) -> Api {
        match self {
            Collection::GaAccounts
            | Collection::GaProperties { .. }
            | Collection::GaDataStreams { .. }
            | Collection::GaCustomDimensions { .. }
            | Collection::GaCustomMetrics { .. }
            | Collection::GaConversionEvents { .. }
            | Collection::GaAccessBindings { .. } => Api::AnalyticsAdmin,
            _ => Api::TagManager,
        }
    }

    /// Path of the collection relative to its API base.
    pub fn path(&self) -> String {
        match self {
            Collection::GaAccounts => format!("{}/accounts", GA_V1BETA),
            // properties are listed flat and filtered by parent
            Collection::GaProperties { .. } => format!("{}/properties", GA_V1BETA),
            Collection::GaDataStreams { property_id } => {
                format!("{}/properties/{}/dataStreams", GA_V1BETA, property_id)
            }
            Collection::GaCustomDimensions { property_id } => {
                format!("{}/properties/{}/customDimensions", GA_V1BETA, property_id)
            }
            Collection::GaCustomMetrics { property_id } => {
                format!("{}/properties/{}/customMetrics", GA_V1BETA, property_id)
            }
            Collection::GaConversionEvents { property_id } => {
                format!("{}/properties/{}/conversionEvents", GA_V1BETA, property_id)
            }
            Collection::GaAccessBindings { account_id } => {
                format!("{}/accounts/{}/accessBindings", GA_V1ALPHA, account_id)
            }
            Collection::GtmAccounts => "accounts".to_string(),
            Collection::GtmContainers { account_id } => {
                format!("accounts/{}/containers", account_id)
            }
            Collection::GtmWorkspaces {
                account_id,
                container_id,
            } => format!("{}/workspaces", container_path(account_id, container_id)),
            Collection::GtmTriggers(ws) => format!("{}/triggers", ws),
            Collection::GtmVariables(ws) => format!("{}/variables", ws),
            Collection::GtmBuiltInVariables(ws) => format!("{}/built_in_variables", ws),
            Collection::GtmVersionHeaders {
                account_id,
                container_id,
            } => format!("{}/version_headers", container_path(account_id, container_id)),
            Collection::GtmPermissions { account_id } => {
                format!("accounts/{}/user_permissions", account_id)
            }
        }
    }

    /// Path of a single member of the collection.
    pub fn item_path(&self, id: &str) -> String {
        match self {
            Collection::GtmVersionHeaders {
                account_id,
                container_id,
            } => format!("{}/versions/{}", container_path(account_id, container_id), id),
            _ => format!("{}/{}", self.path(), id),
        }
    }

    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if self.api() == Api::AnalyticsAdmin {
            query.push(("pageSize".to_string(), GA_PAGE_SIZE.to_string()));
        }
        if let Collection::GaProperties { account_id } = self {
            query.push(("filter".to_string(), format!("parent:accounts/{}", account_id)));
        }
        query
    }

    /// Name of the JSON array holding the page's items.
    pub fn items_field(&self) -> &'static str {
        match self {
            Collection::GaAccounts => "accounts",
            Collection::GaProperties { .. } => "properties",
            Collection::GaDataStreams { .. } => "dataStreams",
            Collection::GaCustomDimensions { .. } => "customDimensions",
            Collection::GaCustomMetrics { .. } => "customMetrics",
            Collection::GaConversionEvents { .. } => "conversionEvents",
            Collection::GaAccessBindings { .. } => "accessBindings",
            Collection::GtmAccounts => "account",
            Collection::GtmContainers { .. } => "container",
            Collection::GtmWorkspaces { .. } => "workspace",
            Collection::GtmTriggers(_) => "trigger",
            Collection::GtmVariables(_) => "variable",
            Collection::GtmBuiltInVariables(_) => "builtInVariable",
            Collection::GtmVersionHeaders { .. } => "containerVersionHeader",
            Collection::GtmPermissions { .. } => "userPermission",
        }
    }

    /// Segment of the cache key under the user's namespace.
    pub fn cache_segment(&self) -> String {
        match self {
            Collection::GaAccounts => "ga:accounts".to_string(),
            Collection::GaProperties { account_id } => format!("ga:properties:{}", account_id),
            Collection::GaDataStreams { property_id } => format!("ga:streams:{}", property_id),
            Collection::GaCustomDimensions { property_id } => {
                format!("ga:custom_dimensions:{}", property_id)
            }
            Collection::GaCustomMetrics { property_id } => {
                format!("ga:custom_metrics:{}", property_id)
            }
            Collection::GaConversionEvents { property_id } => {
                format!("ga:conversion_events:{}", property_id)
            }
            Collection::GaAccessBindings { account_id } => {
                format!("ga:access_bindings:{}", account_id)
            }
            Collection::GtmAccounts => "gtm:accounts".to_string(),
            Collection::GtmContainers { account_id } => format!("gtm:containers:{}", account_id),
            Collection::GtmWorkspaces {
                account_id,
                container_id,
            } => format!("gtm:workspaces:{}:{}", account_id, container_id),
            Collection::GtmTriggers(ws) => format!(
                "gtm:triggers:{}:{}:{}",
                ws.account_id, ws.container_id, ws.workspace_id
            ),
            Collection::GtmVariables(ws) => format!(
                "gtm:variables:{}:{}:{}",
                ws.account_id, ws.container_id, ws.workspace_id
            ),
            Collection::GtmBuiltInVariables(ws) => format!(
                "gtm:built_in_variables:{}:{}:{}",
                ws.account_id, ws.container_id, ws.workspace_id
            ),
            Collection::GtmVersionHeaders {
                account_id,
                container_id,
            } => format!("gtm:versions:{}:{}", account_id, container_id),
            Collection::GtmPermissions { account_id } => format!("gtm:permissions:{}", account_id),
        }
    }

    /// Dashboard page that renders this collection.
    pub fn page_path(&self) -> &'static str {
        match self {
            Collection::GaAccounts | Collection::GaProperties { .. } => "/dashboard/ga/properties",
            Collection::GaDataStreams { .. } => "/dashboard/ga/streams",
            Collection::GaCustomDimensions { .. } => "/dashboard/ga/custom-dimensions",
            Collection::GaCustomMetrics { .. } => "/dashboard/ga/custom-metrics",
            Collection::GaConversionEvents { .. } => "/dashboard/ga/conversions",
            Collection::GaAccessBindings { .. } => "/dashboard/ga/access",
            Collection::GtmAccounts | Collection::GtmContainers { .. } => {
                "/dashboard/gtm/containers"
            }
            Collection::GtmWorkspaces { .. } => "/dashboard/gtm/workspaces",
            Collection::GtmTriggers(_) => "/dashboard/gtm/triggers",
            Collection::GtmVariables(_) | Collection::GtmBuiltInVariables(_) => {
                "/dashboard/gtm/variables"
            }
            Collection::GtmVersionHeaders { .. } => "/dashboard/gtm/versions",
            Collection::GtmPermissions { .. } => "/dashboard/gtm/permissions",
        }
    }
}
