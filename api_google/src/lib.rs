//! Dashboard endpoints for Google Analytics 4 and Google Tag Manager.
//!
//! Listings are served read-through from the per-user cache; mutations pass
//! the tier gate and answer with a `FeatureResponse`. Every Google request is
//! paced by the client itself.

use actix_web::web;

pub use provider::Provider;

pub mod provider;
pub mod dtos {
    pub mod common;
    pub mod ga;
    pub mod gtm;
}
pub mod services {
    pub mod ga;
    pub mod gtm;
    pub mod listing;
    pub mod mutation;
}
mod routes {
    pub(crate) mod cache;
    pub(crate) mod ga;
    pub(crate) mod gtm;
    pub(crate) mod limits;
}
#[cfg(test)]
mod testing;

/// Mounts the GA4, GTM, cache and limit routes; expects to run behind the
/// auth middleware with a `web::Data<Provider>` and an `IdentityClient` registered.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(routes::ga::configure)
        .configure(routes::gtm::configure)
        .configure(routes::cache::configure)
        .configure(routes::limits::configure);
}
