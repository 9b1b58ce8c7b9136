pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod services;
pub mod validation;

use crate::cache::AnalyticsCache;
use crate::config::Config;
use crate::db::DbPool;
use crate::middleware::auth::JwtVerifier;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub redis: redis::Client,
    pub cache: AnalyticsCache,
    pub config: Arc<Config>,
    pub jwt: JwtVerifier,
}

impl AppState {
    pub fn new(db: DbPool, redis: redis::Client, config: Config) -> Self {
        let jwt = JwtVerifier::new(&config.auth());
        let cache = AnalyticsCache::new(redis.clone(), config.analytics_cache_ttl_secs);
        Self {
            db,
            redis,
            cache,
            config: Arc::new(config),
            jwt,
        }
    }
}

pub fn init_tracing(config: &Config) {
    let logging = config.logging();
    let level_filter = match logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => logging.level.as_str(),
        _ => "info",
    };

    // RUST_LOG still wins when set, so per-module directives keep working.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_filter));

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
