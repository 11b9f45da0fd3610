use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use staya_booking::BookingKind;

use crate::state::AppState;

/// Process-local counters exposed on `/metrics`.
pub struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
    bookings_created: IntCounterVec,
    rate_limited: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("staya_http_requests_total", "HTTP responses by status class"),
            &["class"],
        )?;
        let bookings_created = IntCounterVec::new(
            Opts::new("staya_bookings_created_total", "Bookings placed by kind"),
            &["kind"],
        )?;
        let rate_limited = IntCounter::new("staya_rate_limited_total", "Requests rejected by the rate limiter")?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(rate_limited.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            bookings_created,
            rate_limited,
        })
    }

    pub fn record_response(&self, status: StatusCode) {
        let class = format!("{}xx", status.as_u16() / 100);
        self.http_requests.with_label_values(&[class.as_str()]).inc();
    }

    pub fn record_booking(&self, kind: BookingKind) {
        self.bookings_created.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

pub async fn track(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    state.metrics.record_response(response.status());
    response
}

pub async fn export(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
