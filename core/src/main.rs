mod cors;
mod redis;

use std::{sync::Arc, time::Duration};

use actix_web::{
    App, HttpServer, Responder, get,
    web::{self},
};
use api_google::Provider;
use cache::Revalidator;
use common::{env_config::Config, http::Success};
use limiter::{PgLedger, ProviderThrottle, TierGate};

/// How often idle per-user Google limiters are dropped.
const THROTTLE_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[get("/health")]
async fn health() -> impl Responder {
    Success::ok(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.is_production();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup(!is_production).expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");

    // outbound pacing is shared by all workers
    let throttle = Arc::new(ProviderThrottle::new(
        config.google.user_calls_per_second,
        config.google.max_concurrent_calls,
    ));
    let pruned = Arc::clone(&throttle);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(THROTTLE_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            pruned.prune();
        }
    });

    let provider = web::Data::new(Provider {
        google: google::client(&config.google, throttle),
        cache: redis::setup_cache(&config),
        tiers: TierGate::new(Arc::new(PgLedger::new(pool.clone()))),
        revalidator: Revalidator::new(
            config.revalidate.url.clone(),
            config.revalidate.secret.clone(),
        ),
        cache_ttl: config.cache_ttl_seconds,
    });
    let identity = web::Data::new(api_auth::identity_client(&config.identity));

    log::info!(
        "Starting server on {}:{} ({})",
        config.server_host,
        config.server_port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(provider.clone())
            .app_data(identity.clone())
            .wrap(limiter::global_middleware(
                config_data.global_requests_per_second,
            )) // 4th
            .wrap(logger::middleware()) // 3rd
            .wrap(extractor::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(health)
                    .service(api_subs::mount_webhook())
                    .service(api_subs::mount_plans())
                    .service(
                        web::scope("/dashboard")
                            .wrap(api_auth::auth_middleware())
                            .configure(api_auth::configure)
                            .configure(api_subs::configure)
                            .configure(api_google::configure),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
