use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Per-client-address request budget. A failing limiter lets traffic through.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, AppError> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match state.limiter.check(&ip).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => {
            state.metrics.record_rate_limited();
            tracing::warn!("Rate limit exceeded for {}", ip);
            Err(AppError::TooManyRequests)
        }
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, allowing request: {}", e);
            Ok(next.run(req).await)
        }
    }
}
