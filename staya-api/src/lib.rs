use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod token;

pub use error::AppError;
pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", routes::auth::routes(state.clone()))
        .nest("/hotels", routes::hotels::routes(state.clone()))
        .nest("/travel", routes::travel::routes(state.clone()))
        .nest("/bookings", routes::bookings::routes(state.clone()))
        .nest("/payments", routes::payments::routes(state.clone()))
        .nest("/users", routes::users::routes(state.clone()))
        .nest("/admin", routes::admin::routes(state.clone()))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::export))
        .nest("/api", api)
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), error::expose_detail))
        .layer(from_fn_with_state(state.clone(), metrics::track))
        .layer(cors(&state.frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Only the configured frontend may call with credentials.
fn cors(frontend_url: &str) -> CorsLayer {
    let origin = match frontend_url.parse::<HeaderValue>() {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!("Ignoring unusable frontend origin {:?}", frontend_url);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "Staya Booking API is running",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.environment,
    }))
}

async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("Not found - {}", uri.path()))
}
