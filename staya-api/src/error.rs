use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use staya_booking::BookingError;
use staya_catalog::InventoryError;
use staya_core::identity::{CredentialError, RegistrationError};
use staya_core::payment::PaymentError;
use staya_core::RepoError;
use staya_shared::ValidationReport;

use crate::state::AppState;
use crate::token::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(ValidationReport),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PaymentDeclined(String),
    #[error("Too many requests from this IP, please try again later.")]
    TooManyRequests,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_authorized() -> Self {
        AppError::Unauthorized("Not authorized to access this route".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(report) => json!({
                "success": false,
                "error": report.to_string(),
                "details": report.violations(),
            }),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                let mut response = (status, Json(json!({ "success": false, "error": "Server Error" }))).into_response();
                response.extensions_mut().insert(ErrorDetail(format!("{:?}", err)));
                return response;
            }
            other => {
                if status.is_server_error() {
                    tracing::error!("{}", other);
                } else {
                    tracing::debug!("Request rejected with {}: {}", status, other);
                }
                json!({ "success": false, "error": other.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Debug rendering of an unhandled error, riding on the response until
/// [`expose_detail`] decides whether the client may see it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// Outside production, rewrite "Server Error" bodies to carry the error detail.
pub async fn expose_detail(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if !state.expose_error_detail {
        return response;
    }

    let body = json!({ "success": false, "error": "Server Error", "stack": detail });
    (response.status(), Json(body)).into_response()
}

impl From<ValidationReport> for AppError {
    fn from(report: ValidationReport) -> Self {
        AppError::Validation(report)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Duplicate(_) => AppError::BadRequest("Duplicate field value entered".to_string()),
            RepoError::Inventory(e) => e.into(),
            RepoError::Invalid(report) => AppError::Validation(report),
            RepoError::Stale => AppError::Conflict("Booking was changed by another request".to_string()),
            RepoError::Backend(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::RoomNotFound(_) => AppError::NotFound("Room not found".to_string()),
            InventoryError::UnknownSeat(_) | InventoryError::DuplicateSeat(_) => AppError::BadRequest(err.to_string()),
            InventoryError::RoomSoldOut
            | InventoryError::SeatUnavailable(_)
            | InventoryError::InsufficientSeats { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(report) => AppError::Validation(report),
            BookingError::Inventory(e) => e.into(),
            BookingError::Unavailable(msg) => AppError::BadRequest(msg),
            BookingError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Invalid(report) => AppError::Validation(report),
            RegistrationError::Credential(e) => e.into(),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(_) => AppError::Internal(err.into()),
            TokenError::Expired | TokenError::Invalid => AppError::Unauthorized(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_errors_map_to_envelope_statuses() {
        assert_eq!(AppError::from(RepoError::NotFound).status(), StatusCode::NOT_FOUND);
        let dup = AppError::from(RepoError::Duplicate("email".into()));
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
        assert_eq!(dup.to_string(), "Duplicate field value entered");
        let sold_out = AppError::from(RepoError::Inventory(InventoryError::RoomSoldOut));
        assert_eq!(sold_out.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_stale_and_invalid_repo_errors() {
        let stale = AppError::from(RepoError::Stale);
        assert_eq!(stale.status(), StatusCode::CONFLICT);

        let mut report = ValidationReport::new();
        report.push("rating", "Rating must be between 1 and 5");
        let invalid = AppError::from(RepoError::Invalid(report));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.to_string(), "Rating must be between 1 and 5");
    }

    async fn failing() -> Result<(), AppError> {
        Err(AppError::Internal(anyhow::anyhow!("pool timed out")))
    }

    async fn server_error_body(expose: bool) -> serde_json::Value {
        use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
        use tower::ServiceExt;

        let mut state = AppState::in_memory(
            crate::AuthConfig {
                secret: "secret".to_string(),
                expiration: 60,
            },
            100,
            60,
        )
        .unwrap();
        state.expose_error_detail = expose;

        let app = Router::new()
            .route("/boom", get(failing))
            .layer(from_fn_with_state(state.clone(), expose_detail))
            .with_state(state);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_detail_follows_environment() {
        let development = server_error_body(true).await;
        assert_eq!(development["error"], "Server Error");
        assert!(development["stack"].as_str().unwrap().contains("pool timed out"));

        let production = server_error_body(false).await;
        assert_eq!(production["error"], "Server Error");
        assert!(production.get("stack").is_none());
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        assert_eq!(AppError::from(TokenError::Expired).to_string(), "Token expired");
        assert_eq!(AppError::from(TokenError::Invalid).status(), StatusCode::UNAUTHORIZED);
    }
}
