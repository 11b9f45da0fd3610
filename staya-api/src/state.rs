use std::sync::Arc;

use staya_core::payment::{PaymentGateway, StubPaymentGateway};
use staya_core::repository::{BookingRepository, HotelRepository, RouteRepository, UserRepository};
use staya_store::{MemoryRateLimiter, MemoryStore, RateLimiter};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Token lifetime in seconds.
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub hotels: Arc<dyn HotelRepository>,
    pub routes: Arc<dyn RouteRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub limiter: Arc<dyn RateLimiter>,
    pub payments: Arc<dyn PaymentGateway>,
    pub metrics: Arc<Metrics>,
    pub auth: AuthConfig,
    pub environment: String,
    /// Show unhandled-error detail to clients; off in production.
    pub expose_error_detail: bool,
    pub frontend_url: String,
    pub reference_attempts: u32,
}

impl AppState {
    /// Everything backed by process memory: one shared store, the in-process
    /// limiter and the stub gateway.
    pub fn in_memory(auth: AuthConfig, max_requests: u64, window_seconds: u64) -> Result<Self, prometheus::Error> {
        let store = Arc::new(MemoryStore::new());
        Ok(Self {
            users: store.clone(),
            hotels: store.clone(),
            routes: store.clone(),
            bookings: store,
            limiter: Arc::new(MemoryRateLimiter::new(max_requests, window_seconds)),
            payments: Arc::new(StubPaymentGateway::new()),
            metrics: Arc::new(Metrics::new()?),
            auth,
            environment: "development".to_string(),
            expose_error_detail: true,
            frontend_url: "http://localhost:3000".to_string(),
            reference_attempts: 3,
        })
    }
}
