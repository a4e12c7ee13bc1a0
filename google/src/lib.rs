//! Client for the Google Analytics Admin API and the Tag Manager API v2.

use std::sync::Arc;

use common::env_config::GoogleConfig;
use limiter::ProviderThrottle;

pub mod client;
pub mod resources;
pub mod retry;

pub mod models {
    pub mod ga;
    pub mod gtm;

    /// Last segment of a resource name such as `properties/123/dataStreams/456`.
    pub fn resource_id(name: &str) -> &str {
        name.rsplit('/').next().unwrap_or(name)
    }
}

pub use client::{Api, Caller, Endpoints, GoogleClient};
pub use resources::{Collection, WorkspaceRef};
pub use retry::RetryPolicy;

/// Client whose calls are paced by `throttle`.
pub fn client(config: &GoogleConfig, throttle: Arc<ProviderThrottle>) -> GoogleClient {
    GoogleClient::new(
        Endpoints {
            analytics_admin: config.analytics_admin_url.clone(),
            tag_manager: config.tag_manager_url.clone(),
        },
        RetryPolicy::default(),
        throttle,
    )
}
