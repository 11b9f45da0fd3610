use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use staya_core::{Role, User};

use crate::error::AppError;
use crate::state::AppState;
use crate::token;

pub const VENDOR_OR_ADMIN: &[Role] = &[Role::Vendor, Role::Admin];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// The account behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(AppError::not_authorized)
    }
}

// ============================================================================
// Bearer Token Middleware
// ============================================================================

pub async fn verify_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Authorization(bearer) = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(AppError::not_authorized)?;

    let claims = token::verify(&state.auth, bearer.token())?;

    // The account may have been removed since the token was issued.
    let user = state
        .users
        .get_user(claims.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    req.extensions_mut().insert(Principal { user });
    Ok(next.run(req).await)
}

// ============================================================================
// Role Gate
// ============================================================================

/// Must sit inside `verify_token`.
pub async fn authorize(
    State(roles): State<&'static [Role]>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    let role = principal.user.role;
    if !roles.contains(&role) {
        return Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            role
        )));
    }

    Ok(next.run(req).await)
}
