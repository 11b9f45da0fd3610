use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use staya_booking::{Booking, BookingReference, HotelBooking, Stage, TravelBooking};
use staya_catalog::{BusRoute, Hotel, HotelFilter, HotelPatch, InventoryError, RouteFilter, RoutePatch};
use staya_shared::{PageRequest, ValidationReport};

use crate::identity::User;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Resource not found")]
    NotFound,

    /// A unique key (email, phone, booking reference) is already taken.
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// An edit would leave the record violating its own rules.
    #[error(transparent)]
    Invalid(#[from] ValidationReport),

    /// The record moved on since it was read (e.g. cancelled while a payment was in flight).
    #[error("Booking was changed by another request")]
    Stale,

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; `Duplicate` when the email or phone is taken.
    async fn create_user(&self, user: &User) -> RepoResult<()>;

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn find_by_email_or_phone(&self, email: &str, phone: &str) -> RepoResult<Option<User>>;

    async fn update_user(&self, user: &User) -> RepoResult<()>;

    async fn list_users(&self, page: PageRequest) -> RepoResult<(Vec<User>, u64)>;

    async fn count_users(&self) -> RepoResult<u64>;
}

/// Repository trait for hotels and their embedded rooms
#[async_trait]
pub trait HotelRepository: Send + Sync {
    async fn create_hotel(&self, hotel: &Hotel) -> RepoResult<()>;

    async fn get_hotel(&self, id: Uuid) -> RepoResult<Option<Hotel>>;

    /// Active hotels matching the filter, best rated first, plus the total match count.
    async fn list_hotels(&self, filter: &HotelFilter, page: PageRequest) -> RepoResult<(Vec<Hotel>, u64)>;

    /// Apply `patch` to the stored hotel while holding it, so bookings that
    /// land meanwhile keep their room counts. Returns the updated hotel.
    async fn update_hotel(&self, id: Uuid, patch: HotelPatch, now: DateTime<Utc>) -> RepoResult<Hotel>;

    async fn delete_hotel(&self, id: Uuid) -> RepoResult<()>;

    async fn count_hotels(&self) -> RepoResult<u64>;
}

/// Repository trait for bus routes
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn create_route(&self, route: &BusRoute) -> RepoResult<()>;

    async fn get_route(&self, id: Uuid) -> RepoResult<Option<BusRoute>>;

    async fn list_routes(&self, filter: &RouteFilter, page: PageRequest) -> RepoResult<(Vec<BusRoute>, u64)>;

    /// Same contract as `update_hotel`; the seat map and counter are never written.
    async fn update_route(&self, id: Uuid, patch: RoutePatch, now: DateTime<Utc>) -> RepoResult<BusRoute>;

    async fn delete_route(&self, id: Uuid) -> RepoResult<()>;

    async fn count_routes(&self) -> RepoResult<u64>;
}

/// Repository trait for bookings of both kinds.
///
/// Creation and cancellation move inventory in the same atomic unit as the
/// booking write, so the last room or seat can only be sold once.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Reserve one room and insert the booking. `Duplicate` on a reference collision.
    async fn create_hotel_booking(&self, booking: &HotelBooking) -> RepoResult<()>;

    /// Mark the seats booked and insert the booking. `Duplicate` on a reference collision.
    async fn create_travel_booking(&self, booking: &TravelBooking) -> RepoResult<()>;

    async fn find_by_reference(&self, reference: &BookingReference) -> RepoResult<Option<Booking>>;

    /// Persist status, payment status and payment id, provided the stored
    /// booking is still at stage `from`; `Stale` otherwise.
    async fn update_state(&self, booking: &Booking, from: Stage) -> RepoResult<()>;

    /// Persist a cancelled booking and hand its room or seats back.
    /// `Stale` when the stored booking has left stage `from`.
    async fn cancel_booking(&self, booking: &Booking, from: Stage) -> RepoResult<()>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> RepoResult<(Vec<Booking>, u64)>;

    async fn list_all(&self, page: PageRequest) -> RepoResult<(Vec<Booking>, u64)>;

    async fn count_bookings(&self) -> RepoResult<u64>;
}

/// Insert a hotel booking, drawing a fresh reference whenever the current one collides.
pub async fn place_hotel_booking(
    repo: &dyn BookingRepository,
    mut booking: HotelBooking,
    attempts: u32,
) -> RepoResult<HotelBooking> {
    let mut remaining = attempts.max(1);
    loop {
        match repo.create_hotel_booking(&booking).await {
            Err(RepoError::Duplicate(field)) if field == "bookingReference" && remaining > 1 => {
                tracing::warn!("Booking reference {} collided, retrying", booking.state.booking_reference);
                remaining -= 1;
                booking.state.reissue_reference(chrono::Utc::now());
            }
            Err(e) => return Err(e),
            Ok(()) => return Ok(booking),
        }
    }
}

pub async fn place_travel_booking(
    repo: &dyn BookingRepository,
    mut booking: TravelBooking,
    attempts: u32,
) -> RepoResult<TravelBooking> {
    let mut remaining = attempts.max(1);
    loop {
        match repo.create_travel_booking(&booking).await {
            Err(RepoError::Duplicate(field)) if field == "bookingReference" && remaining > 1 => {
                tracing::warn!("Booking reference {} collided, retrying", booking.state.booking_reference);
                remaining -= 1;
                booking.state.reissue_reference(chrono::Utc::now());
            }
            Err(e) => return Err(e),
            Ok(()) => return Ok(booking),
        }
    }
}
