use axum::{extract::State, routing::get, Router};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::ADMIN_ONLY;
use crate::response::Envelope;
use crate::routes::restricted;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new().route("/", restricted(get(dashboard), &state, ADMIN_ONLY))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    users: u64,
    hotels: u64,
    routes: u64,
    bookings: u64,
}

async fn dashboard(State(state): State<AppState>) -> Result<Envelope<Dashboard>, AppError> {
    let (users, hotels, routes, bookings) = tokio::try_join!(
        state.users.count_users(),
        state.hotels.count_hotels(),
        state.routes.count_routes(),
        state.bookings.count_bookings(),
    )?;

    Ok(Envelope::ok(Dashboard {
        users,
        hotels,
        routes,
        bookings,
    }))
}
