use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;

use staya_booking::{
    plan_hotel_booking, plan_travel_booking, Booking, BookingKind, BookingReference, HotelBooking,
    HotelBookingRequest, TravelBooking, TravelBookingRequest,
};
use staya_core::repository::{place_hotel_booking, place_travel_booking};
use staya_core::User;

use crate::error::AppError;
use crate::extract::{JsonBody, PageQuery, QueryParams};
use crate::middleware::{Principal, ADMIN_ONLY};
use crate::response::Envelope;
use crate::routes::{restricted, signed_in};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", signed_in(get(list_bookings), &state))
        .route("/hotel", signed_in(post(create_hotel_booking), &state))
        .route("/travel", signed_in(post(create_travel_booking), &state))
        .route("/{reference}", signed_in(get(get_booking), &state))
        .route("/{reference}/cancel", signed_in(put(cancel_booking), &state))
        .route("/{reference}/complete", restricted(put(complete_booking), &state, ADMIN_ONLY))
}

/// Look a booking up by reference and make sure `user` may act on it.
pub(crate) async fn owned_booking(state: &AppState, reference: &str, user: &User) -> Result<Booking, AppError> {
    let not_found = || AppError::NotFound("Booking not found".to_string());

    let reference: BookingReference = reference.parse().map_err(|_| not_found())?;
    let booking = state
        .bookings
        .find_by_reference(&reference)
        .await?
        .ok_or_else(not_found)?;

    if booking.user_id() != user.id && !user.is_admin() {
        return Err(AppError::Forbidden("Not authorized to access this booking".to_string()));
    }
    Ok(booking)
}

async fn create_hotel_booking(
    State(state): State<AppState>,
    Principal { user }: Principal,
    JsonBody(request): JsonBody<HotelBookingRequest>,
) -> Result<Envelope<HotelBooking>, AppError> {
    let hotel = state
        .hotels
        .get_hotel(request.hotel_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))?;

    let booking = plan_hotel_booking(request, user.id, &hotel, Utc::now())?;
    let booking = place_hotel_booking(state.bookings.as_ref(), booking, state.reference_attempts).await?;

    state.metrics.record_booking(BookingKind::Hotel);
    tracing::info!(
        "Hotel booking {} placed for {} night(s), total {} {}",
        booking.state.booking_reference,
        booking.nights,
        booking.state.total_amount,
        booking.state.currency
    );
    Ok(Envelope::created(booking))
}

async fn create_travel_booking(
    State(state): State<AppState>,
    Principal { user }: Principal,
    JsonBody(request): JsonBody<TravelBookingRequest>,
) -> Result<Envelope<TravelBooking>, AppError> {
    let route = state
        .routes
        .get_route(request.route_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Route not found".to_string()))?;

    let booking = plan_travel_booking(request, user.id, &route, Utc::now())?;
    let booking = place_travel_booking(state.bookings.as_ref(), booking, state.reference_attempts).await?;

    state.metrics.record_booking(BookingKind::Travel);
    tracing::info!(
        "Travel booking {} placed for seats {:?}",
        booking.state.booking_reference,
        booking.seat_numbers
    );
    Ok(Envelope::created(booking))
}

async fn list_bookings(
    State(state): State<AppState>,
    Principal { user }: Principal,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Envelope<Vec<Booking>>, AppError> {
    let page = page.request();
    let (bookings, total) = if user.is_admin() {
        state.bookings.list_all(page).await?
    } else {
        state.bookings.list_for_user(user.id, page).await?
    };
    Ok(Envelope::page(bookings, page.info(total)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Principal { user }: Principal,
) -> Result<Envelope<Booking>, AppError> {
    Ok(Envelope::ok(owned_booking(&state, &reference, &user).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Principal { user }: Principal,
) -> Result<Envelope<Booking>, AppError> {
    let mut booking = owned_booking(&state, &reference, &user).await?;
    let from = booking.state().stage();
    booking.state_mut().cancel(Utc::now())?;
    state.bookings.cancel_booking(&booking, from).await?;

    tracing::info!("Booking {} cancelled by {}", booking.reference(), user.id);
    Ok(Envelope::ok(booking).with_message("Booking cancelled"))
}

async fn complete_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Principal { user }: Principal,
) -> Result<Envelope<Booking>, AppError> {
    let mut booking = owned_booking(&state, &reference, &user).await?;
    let from = booking.state().stage();
    booking.state_mut().complete(Utc::now())?;
    state.bookings.update_state(&booking, from).await?;
    Ok(Envelope::ok(booking))
}
