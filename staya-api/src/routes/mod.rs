use axum::{middleware::from_fn_with_state, routing::MethodRouter};

use staya_core::Role;

use crate::middleware::{authorize, verify_token};
use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod hotels;
pub mod payments;
pub mod travel;
pub mod users;

/// Require a valid bearer token.
pub(crate) fn signed_in(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(state.clone(), verify_token))
}

/// Require a valid bearer token held by one of `roles`.
pub(crate) fn restricted(
    route: MethodRouter<AppState>,
    state: &AppState,
    roles: &'static [Role],
) -> MethodRouter<AppState> {
    // Layers wrap outward: the token check added last runs first.
    route
        .route_layer(from_fn_with_state(roles, authorize))
        .route_layer(from_fn_with_state(state.clone(), verify_token))
}
