use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use staya_catalog::{can_manage, Hotel, HotelFilter, HotelInput, HotelPatch};

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
            get(list_hotels).merge(restricted(post(create_hotel), &state, VENDOR_OR_ADMIN)),
        )
        .route(
            "/{id}",
            get(get_hotel)
                .merge(restricted(put(update_hotel), &state, VENDOR_OR_ADMIN))
                .merge(restricted(delete(delete_hotel), &state, VENDOR_OR_ADMIN)),
        )
}

async fn load(state: &AppState, id: uuid::Uuid) -> Result<Hotel, AppError> {
    state
        .hotels
        .get_hotel(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))
}

async fn list_hotels(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageQuery>,
    QueryParams(filter): QueryParams<HotelFilter>,
) -> Result<Envelope<Vec<Hotel>>, AppError> {
    let page = page.request();
    let (hotels, total) = state.hotels.list_hotels(&filter, page).await?;
    Ok(Envelope::page(hotels, page.info(total)))
}

async fn get_hotel(State(state): State<AppState>, IdPath(id): IdPath) -> Result<Envelope<Hotel>, AppError> {
    Ok(Envelope::ok(load(&state, id).await?))
}

async fn create_hotel(
    State(state): State<AppState>,
    Principal { user }: Principal,
    JsonBody(input): JsonBody<HotelInput>,
) -> Result<Envelope<Hotel>, AppError> {
    let hotel = Hotel::create(input, Some(user.id), Utc::now())?;
    state.hotels.create_hotel(&hotel).await?;

    tracing::info!("Hotel {} created by {}", hotel.id, user.id);
    Ok(Envelope::created(hotel))
}

async fn update_hotel(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Principal { user }: Principal,
    JsonBody(patch): JsonBody<HotelPatch>,
) -> Result<Envelope<Hotel>, AppError> {
    let current = load(&state, id).await?;
    if !can_manage(current.vendor_id, user.id, user.is_admin()) {
        return Err(AppError::Unauthorized("Not authorized to update this hotel".to_string()));
    }

    let hotel = state.hotels.update_hotel(id, patch, Utc::now()).await?;
    Ok(Envelope::ok(hotel))
}

async fn delete_hotel(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    Principal { user }: Principal,
) -> Result<Envelope<Value>, AppError> {
    let hotel = load(&state, id).await?;
    if !can_manage(hotel.vendor_id, user.id, user.is_admin()) {
        return Err(AppError::Unauthorized("Not authorized to delete this hotel".to_string()));
    }

    state.hotels.delete_hotel(hotel.id).await?;
    tracing::info!("Hotel {} deleted by {}", hotel.id, user.id);
    Ok(Envelope::ok(json!({})))
}
