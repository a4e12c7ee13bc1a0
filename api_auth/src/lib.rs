use actix_web::web;
use common::env_config::IdentityConfig;
use middleware::auth::AuthMiddleware;

pub use extract::google_token::GoogleToken;
pub use services::identity::IdentityClient;

pub mod middleware {
    pub mod auth;
}
pub mod extract {
    pub mod google_token;
}
pub mod services {
    pub mod identity;
}
mod routes {
    pub(crate) mod me;
}

/// Rejects requests without valid session claims.
pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}

pub fn identity_client(config: &IdentityConfig) -> IdentityClient {
    IdentityClient::new(config.api_url.clone(), config.secret_key.clone())
}

/// Mounts `/me`; expects to run behind `auth_middleware`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::me::get_me);
}
