use std::{env, sync::Arc};

#[derive(Clone, Debug, Default)]
/// Configuration struct for the server.
///
/// This struct holds all the necessary configuration parameters
/// required to initialize and run the server.
/// It includes database and cache connection details, identity provider
/// settings, Google API endpoints and pacing, server host and port,
/// CORS settings, logging preferences and Stripe credentials.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// The URL of Redis server to connect to. In-process cache is used when absent.
    pub redis_url: Option<String>,
    /// Lifetime of cached Google listings in seconds.
    pub cache_ttl_seconds: u64,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Inbound requests per second accepted by the global limiter.
    pub global_requests_per_second: u32,
    /// Identity provider settings.
    pub identity: IdentityConfig,
    /// Google API endpoints and outbound pacing.
    pub google: GoogleConfig,
    /// Rendering layer revalidation hook.
    pub revalidate: RevalidateConfig,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
}

#[derive(Clone, Debug, Default)]
/// Settings for the third-party identity provider.
///
/// Session tokens are verified either with a shared HMAC secret or with the
/// provider's RSA public key. The backend API of the provider is used to read
/// the Google OAuth access token of a user.
pub struct IdentityConfig {
    /// Shared secret for HS256 session tokens.
    pub jwt_secret: Option<String>,
    /// PEM encoded RSA public key for RS256 session tokens.
    pub jwt_public_key: Option<String>,
    /// Expected `iss` claim, if any.
    pub jwt_issuer: Option<String>,
    /// Base URL of the identity provider backend API.
    pub api_url: String,
    /// Secret key for the identity provider backend API.
    pub secret_key: String,
}

#[derive(Clone, Debug, Default)]
pub struct GoogleConfig {
    /// Base URL of the Analytics Admin API (version is part of each path).
    pub analytics_admin_url: String,
    /// Base URL of the Tag Manager API v2.
    pub tag_manager_url: String,
    /// Calls per second a single user may send to Google.
    pub user_calls_per_second: u32,
    /// Upper bound of parallel outbound calls across all users.
    pub max_concurrent_calls: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RevalidateConfig {
    pub url: Option<String>,
    pub secret: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl IdentityConfig {
    /// Creates a new `IdentityConfig` instance from environment variables.
    ///
    /// # Panics
    ///
    /// Panics when neither `IDENTITY_JWT_SECRET` nor `IDENTITY_JWT_PUBLIC_KEY` is set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = optional_var("IDENTITY_JWT_SECRET");
        let jwt_public_key = optional_var("IDENTITY_JWT_PUBLIC_KEY");
        if jwt_secret.is_none() && jwt_public_key.is_none() {
            panic!("IDENTITY_JWT_SECRET or IDENTITY_JWT_PUBLIC_KEY must be set");
        }

        IdentityConfig {
            jwt_secret,
            jwt_public_key,
            jwt_issuer: optional_var("IDENTITY_JWT_ISSUER"),
            api_url: var_or("IDENTITY_API_URL", "https://api.clerk.com"),
            secret_key: env::var("IDENTITY_SECRET_KEY").unwrap_or_default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: `development` or `production`
    /// - `DATABASE_URL`: Connection string for the database
    /// - `IDENTITY_JWT_SECRET` or `IDENTITY_JWT_PUBLIC_KEY`
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `REDIS_URL`, `CACHE_TTL_SECONDS` (default: 3600)
    /// - `GA_ADMIN_API_URL`, `GTM_API_URL`
    /// - `GOOGLE_USER_CALLS_PER_SECOND` (default: 10), `GOOGLE_MAX_CONCURRENT_CALLS` (default: 4)
    /// - `GLOBAL_REQUESTS_PER_SECOND` (default: 50)
    /// - `REVALIDATE_URL`, `REVALIDATE_SECRET`
    /// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        let stripe_webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            redis_url: optional_var("REDIS_URL"),
            cache_ttl_seconds: var_or("CACHE_TTL_SECONDS", "3600").parse().unwrap_or(3600),
            server_host: var_or("IP", "127.0.0.1"),
            server_port: var_or("PORT", "8080").parse().unwrap_or(8080),
            num_workers: var_or("WORKERS", "4").parse().unwrap_or(4),
            cors_allowed_origin: var_or("CORS_ALLOWED_ORIGIN", "http://localhost:3000"),
            console_logging_enabled: var_or("ENABLE_CONSOLE_LOGGING", "true").to_lowercase()
                == "true",
            global_requests_per_second: var_or("GLOBAL_REQUESTS_PER_SECOND", "50")
                .parse()
                .unwrap_or(50),
            identity: IdentityConfig::from_env(),
            google: GoogleConfig {
                analytics_admin_url: var_or(
                    "GA_ADMIN_API_URL",
                    "https://analyticsadmin.googleapis.com",
                ),
                tag_manager_url: var_or(
                    "GTM_API_URL",
                    "https://tagmanager.googleapis.com/tagmanager/v2",
                ),
                user_calls_per_second: var_or("GOOGLE_USER_CALLS_PER_SECOND", "10")
                    .parse()
                    .unwrap_or(10),
                max_concurrent_calls: var_or("GOOGLE_MAX_CONCURRENT_CALLS", "4")
                    .parse()
                    .unwrap_or(4),
            },
            revalidate: RevalidateConfig {
                url: optional_var("REVALIDATE_URL"),
                secret: env::var("REVALIDATE_SECRET").unwrap_or_default(),
            },
            stripe_secret_key,
            stripe_webhook_secret,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
