use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use staya_catalog::inventory::bookable_seats;
use staya_catalog::{can_manage, BusRoute, RouteFilter, RouteInput, RoutePatch, SeatLayout};

use crate::error::AppError;
use crate::extract::{IdPath, JsonBody, PageQuery, QueryParams};
use crate::middleware::{Principal, VENDOR_OR_ADMIN};
use crate::response::Envelope;
use crate::routes::restricted;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_routes).merge(restricted(post(create_route), &state, VENDOR_OR_ADMIN)),
        )
        .route(
            "/{id}",
            get(get_route)
                .merge(restricted(put(update_route), &state, VENDOR_OR_ADMIN))
                .merge(restricted(delete(delete_route), &state, VENDOR_OR_ADMIN)),
        )
        .route("/{id}/seats", get(seat_availability))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatAvailability {
    route_id: Uuid,
    total_seats: u32,
    available_seats: u32,
    bookable: Vec<String>,
    seat_layout: SeatLayout,
}

async fn load(state: &AppState, id: Uuid) -> Result<BusRoute, AppError> {
    state
        .routes
        .get_route(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Route not found".to_string()))
}

async fn list_routes(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageQuery>,
    QueryParams(filter): QueryParams<RouteFilter>,
) -> Result<Envelope<Vec<BusRoute>>, AppError> {
    let page = page.request();
    let (routes, total) = state.routes.list_routes(&filter, page).await?;
    Ok(Envelope::page(routes, page.info(total)))
}

async fn get_route(State(state): State<AppState>, IdPath(id): IdPath) -> Result<Envelope<BusRoute>, AppError> {
    Ok(Envelope::ok(load(&state, id).await?))
}

async fn seat_availability(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Envelope<SeatAvailability>, AppError> {
    let route = load(&state, id).await?;
    Ok(Envelope::ok(SeatAvailability {
        route_id: route.id,
        total_seats: route.total_seats,
        available_seats: route.available_seats,
        bookable: bookable_seats(&route.seat_layout),
        seat_layout: route.seat_layout,
    }))
}

async fn create_route(
    State(state): State<AppState>,
    Principal { user }: Principal,
    JsonBody(input): JsonBody<RouteInput>,
) -> Result<Envelope<BusRoute>, AppError> {
    let route = BusRoute::create(input, Some(user.id), Utc::now())?;
    state.routes.create_route(&route).await?;

    tracing::info!("Route {} ({} -> {}) created by {}", route.id, route.from, route.to, user.id);
    Ok(Envelope::created(route))
}

async fn update_route(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Principal { user }: Principal,
    JsonBody(patch): JsonBody<RoutePatch>,
) -> Result<Envelope<BusRoute>, AppError> {
    let current = load(&state, id).await?;
    if !can_manage(current.vendor_id, user.id, user.is_admin()) {
        return Err(AppError::Unauthorized("Not authorized to update this route".to_string()));
    }

    let route = state.routes.update_route(id, patch, Utc::now()).await?;
    Ok(Envelope::ok(route))
}

async fn delete_route(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Principal { user }: Principal,
) -> Result<Envelope<Value>, AppError> {
    let route = load(&state, id).await?;
    if !can_manage(route.vendor_id, user.id, user.is_admin()) {
        return Err(AppError::Unauthorized("Not authorized to delete this route".to_string()));
    }

    state.routes.delete_route(route.id).await?;
    Ok(Envelope::ok(json!({})))
}
