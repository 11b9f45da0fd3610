use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staya_api::{app, metrics::Metrics, AppState, AuthConfig};
use staya_core::payment::StubPaymentGateway;
use staya_store::app_config::Config;
use staya_store::{
    DbClient, MemoryRateLimiter, MemoryStore, PgBookingRepository, PgHotelRepository, PgRouteRepository,
    PgUserRepository, RateLimiter, RedisClient, RedisRateLimiter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staya_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting Staya API on port {} ({})",
        config.server.port,
        config.server.environment
    );

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };

    // Rate limiter: Redis when configured, otherwise per process.
    let limiter: Arc<dyn RateLimiter> = match config.redis.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            let redis = RedisClient::new(url).await.context("Failed to connect to Redis")?;
            Arc::new(RedisRateLimiter::new(
                redis,
                config.rate_limit.max_requests,
                config.rate_limit.window_seconds,
            ))
        }
        None => Arc::new(MemoryRateLimiter::new(
            config.rate_limit.max_requests,
            config.rate_limit.window_seconds,
        )),
    };

    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    let app_state = if config.database.url.is_empty() {
        tracing::warn!("No database configured, using the in-memory store");
        let store = Arc::new(MemoryStore::new());
        AppState {
            users: store.clone(),
            hotels: store.clone(),
            routes: store.clone(),
            bookings: store,
            limiter,
            payments: Arc::new(StubPaymentGateway::new()),
            metrics,
            auth,
            environment: config.server.environment.clone(),
            expose_error_detail: !config.server.is_production(),
            frontend_url: config.cors.frontend_url.clone(),
            reference_attempts: config.booking.reference_attempts,
        }
    } else {
        let db = DbClient::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to run migrations")?;

        AppState {
            users: Arc::new(PgUserRepository::new(db.pool.clone())),
            hotels: Arc::new(PgHotelRepository::new(db.pool.clone())),
            routes: Arc::new(PgRouteRepository::new(db.pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
            limiter,
            payments: Arc::new(StubPaymentGateway::new()),
            metrics,
            auth,
            environment: config.server.environment.clone(),
            expose_error_detail: !config.server.is_production(),
            frontend_url: config.cors.frontend_url.clone(),
            reference_attempts: config.booking.reference_attempts,
        }
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
