use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use staya_booking::{
    Booking, BookingKind, BookingReference, BookingState, BookingStatus, HotelBooking, PaymentStatus,
    Stage, TravelBooking,
};
use staya_catalog::InventoryError;
use staya_core::repository::{BookingRepository, RepoResult};
use staya_core::RepoError;
use staya_shared::{ContactDetails, Currency, PageRequest};

use crate::database::map_db_error;
use crate::hotel_repo::{lock_hotel, write_rooms};
use crate::route_repo::{lock_route, write_seats};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const HOTEL_BOOKING_COLUMNS: &str = "id, booking_reference, user_id, hotel_id, room_id, check_in_date, \
     check_out_date, nights, guests, guest_details, special_requests, total_amount, currency, status, \
     payment_status, payment_id, created_at, updated_at";

const TRAVEL_BOOKING_COLUMNS: &str = "id, booking_reference, user_id, route_id, travel_date, passengers, \
     seat_numbers, passenger_details, total_amount, currency, status, payment_status, payment_id, created_at, \
     updated_at";

#[derive(sqlx::FromRow)]
struct HotelBookingRow {
    id: Uuid,
    booking_reference: String,
    user_id: Uuid,
    hotel_id: Uuid,
    room_id: Uuid,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    nights: i32,
    guests: i32,
    guest_details: Json<ContactDetails>,
    special_requests: Option<String>,
    total_amount: f64,
    currency: String,
    status: String,
    payment_status: String,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct TravelBookingRow {
    id: Uuid,
    booking_reference: String,
    user_id: Uuid,
    route_id: Uuid,
    travel_date: NaiveDate,
    passengers: i32,
    seat_numbers: Json<Vec<String>>,
    passenger_details: Json<Vec<ContactDetails>>,
    total_amount: f64,
    currency: String,
    status: String,
    payment_status: String,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[allow(clippy::too_many_arguments)]
fn state_from_columns(
    reference: String,
    total_amount: f64,
    currency: String,
    status: String,
    payment_status: String,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> RepoResult<BookingState> {
    let corrupt = |what: &str, value: &str| RepoError::Backend(format!("Unknown {}: {}", what, value));
    Ok(BookingState {
        booking_reference: reference
            .parse::<BookingReference>()
            .map_err(|e| RepoError::Backend(e.to_string()))?,
        total_amount,
        currency: currency.parse::<Currency>().map_err(RepoError::Backend)?,
        status: BookingStatus::parse(&status).ok_or_else(|| corrupt("booking status", &status))?,
        payment_status: PaymentStatus::parse(&payment_status)
            .ok_or_else(|| corrupt("payment status", &payment_status))?,
        payment_id,
        created_at,
        updated_at,
    })
}

impl TryFrom<HotelBookingRow> for HotelBooking {
    type Error = RepoError;

    fn try_from(row: HotelBookingRow) -> Result<Self, Self::Error> {
        Ok(HotelBooking {
            id: row.id,
            user_id: row.user_id,
            hotel_id: row.hotel_id,
            room_id: row.room_id,
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
            nights: row.nights.max(0) as u32,
            guests: row.guests.max(0) as u32,
            guest_details: row.guest_details.0,
            special_requests: row.special_requests,
            state: state_from_columns(
                row.booking_reference,
                row.total_amount,
                row.currency,
                row.status,
                row.payment_status,
                row.payment_id,
                row.created_at,
                row.updated_at,
            )?,
        })
    }
}

impl TryFrom<TravelBookingRow> for TravelBooking {
    type Error = RepoError;

    fn try_from(row: TravelBookingRow) -> Result<Self, Self::Error> {
        Ok(TravelBooking {
            id: row.id,
            user_id: row.user_id,
            route_id: row.route_id,
            travel_date: row.travel_date,
            passengers: row.passengers.max(0) as u32,
            seat_numbers: row.seat_numbers.0,
            passenger_details: row.passenger_details.0,
            state: state_from_columns(
                row.booking_reference,
                row.total_amount,
                row.currency,
                row.status,
                row.payment_status,
                row.payment_id,
                row.created_at,
                row.updated_at,
            )?,
        })
    }
}

fn table_for(kind: BookingKind) -> &'static str {
    match kind {
        BookingKind::Hotel => "hotel_bookings",
        BookingKind::Travel => "travel_bookings",
    }
}

/// Write the lifecycle columns, provided the row is still at stage `from`.
/// A row that moved on is left alone and reported as `Stale`.
async fn write_state(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    booking: &Booking,
    from: Stage,
) -> RepoResult<()> {
    let state = booking.state();
    let result = sqlx::query(&format!(
        "UPDATE {} SET status = $2, payment_status = $3, payment_id = $4, updated_at = $5 \
         WHERE booking_reference = $1 AND status = $6 AND payment_status = $7",
        table_for(booking.kind())
    ))
    .bind(state.booking_reference.as_str())
    .bind(state.status.as_str())
    .bind(state.payment_status.as_str())
    .bind(&state.payment_id)
    .bind(state.updated_at)
    .bind(from.status.as_str())
    .bind(from.payment_status.as_str())
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;

    if result.rows_affected() == 0 {
        let (exists,): (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE booking_reference = $1)",
            table_for(booking.kind())
        ))
        .bind(state.booking_reference.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_db_error)?;
        return Err(if exists { RepoError::Stale } else { RepoError::NotFound });
    }
    Ok(())
}

impl PgBookingRepository {
    /// Both tables newest first, merged. Each side fetches enough rows to fill the requested page.
    async fn merged_page(&self, user_id: Option<Uuid>, page: PageRequest) -> RepoResult<(Vec<Booking>, u64)> {
        let window = (page.offset() + page.limit as u64) as i64;
        let scope = if user_id.is_some() { " WHERE user_id = $1" } else { "" };
        let limit_param = if user_id.is_some() { "$2" } else { "$1" };

        let hotel_sql = format!(
            "SELECT {} FROM hotel_bookings{} ORDER BY created_at DESC LIMIT {}",
            HOTEL_BOOKING_COLUMNS, scope, limit_param
        );
        let travel_sql = format!(
            "SELECT {} FROM travel_bookings{} ORDER BY created_at DESC LIMIT {}",
            TRAVEL_BOOKING_COLUMNS, scope, limit_param
        );
        let mut hotel_query = sqlx::query_as::<_, HotelBookingRow>(&hotel_sql);
        let mut travel_query = sqlx::query_as::<_, TravelBookingRow>(&travel_sql);
        if let Some(user_id) = user_id {
            hotel_query = hotel_query.bind(user_id);
            travel_query = travel_query.bind(user_id);
        }

        let hotel_rows = hotel_query.bind(window).fetch_all(&self.pool).await.map_err(map_db_error)?;
        let travel_rows = travel_query.bind(window).fetch_all(&self.pool).await.map_err(map_db_error)?;

        let mut bookings = Vec::with_capacity(hotel_rows.len() + travel_rows.len());
        for row in hotel_rows {
            bookings.push(Booking::Hotel(HotelBooking::try_from(row)?));
        }
        for row in travel_rows {
            bookings.push(Booking::Travel(TravelBooking::try_from(row)?));
        }
        bookings.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let total = match user_id {
            Some(user_id) => {
                let (count,): (i64,) = sqlx::query_as(
                    "SELECT (SELECT COUNT(*) FROM hotel_bookings WHERE user_id = $1) \
                          + (SELECT COUNT(*) FROM travel_bookings WHERE user_id = $1)",
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;
                count as u64
            }
            None => self.count_bookings().await?,
        };

        Ok((page.apply(&bookings), total))
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_hotel_booking(&self, booking: &HotelBooking) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let mut hotel = lock_hotel(&mut tx, booking.hotel_id).await?;
        hotel.reserve_room(booking.room_id)?;
        write_rooms(&mut tx, &hotel).await?;

        let state = &booking.state;
        sqlx::query(&format!(
            "INSERT INTO hotel_bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
            HOTEL_BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .bind(state.booking_reference.as_str())
        .bind(booking.user_id)
        .bind(booking.hotel_id)
        .bind(booking.room_id)
        .bind(booking.check_in_date)
        .bind(booking.check_out_date)
        .bind(booking.nights as i32)
        .bind(booking.guests as i32)
        .bind(Json(&booking.guest_details))
        .bind(&booking.special_requests)
        .bind(state.total_amount)
        .bind(state.currency.code())
        .bind(state.status.as_str())
        .bind(state.payment_status.as_str())
        .bind(&state.payment_id)
        .bind(state.created_at)
        .bind(state.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn create_travel_booking(&self, booking: &TravelBooking) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let mut route = lock_route(&mut tx, booking.route_id).await?;
        route.reserve_seats(&booking.seat_numbers)?;
        write_seats(&mut tx, &route).await?;

        let state = &booking.state;
        sqlx::query(&format!(
            "INSERT INTO travel_bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            TRAVEL_BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .bind(state.booking_reference.as_str())
        .bind(booking.user_id)
        .bind(booking.route_id)
        .bind(booking.travel_date)
        .bind(booking.passengers as i32)
        .bind(Json(&booking.seat_numbers))
        .bind(Json(&booking.passenger_details))
        .bind(state.total_amount)
        .bind(state.currency.code())
        .bind(state.status.as_str())
        .bind(state.payment_status.as_str())
        .bind(&state.payment_id)
        .bind(state.created_at)
        .bind(state.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn find_by_reference(&self, reference: &BookingReference) -> RepoResult<Option<Booking>> {
        match reference.kind() {
            BookingKind::Hotel => {
                let row = sqlx::query_as::<_, HotelBookingRow>(&format!(
                    "SELECT {} FROM hotel_bookings WHERE booking_reference = $1",
                    HOTEL_BOOKING_COLUMNS
                ))
                .bind(reference.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;
                row.map(|r| HotelBooking::try_from(r).map(Booking::Hotel)).transpose()
            }
            BookingKind::Travel => {
                let row = sqlx::query_as::<_, TravelBookingRow>(&format!(
                    "SELECT {} FROM travel_bookings WHERE booking_reference = $1",
                    TRAVEL_BOOKING_COLUMNS
                ))
                .bind(reference.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;
                row.map(|r| TravelBooking::try_from(r).map(Booking::Travel)).transpose()
            }
        }
    }

    async fn update_state(&self, booking: &Booking, from: Stage) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        write_state(&mut tx, booking, from).await?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn cancel_booking(&self, booking: &Booking, from: Stage) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        write_state(&mut tx, booking, from).await?;

        match booking {
            Booking::Hotel(b) => match lock_hotel(&mut tx, b.hotel_id).await {
                Ok(mut hotel) => match hotel.release_room(b.room_id) {
                    Ok(()) => write_rooms(&mut tx, &hotel).await?,
                    Err(InventoryError::RoomNotFound(_)) => {
                        tracing::warn!("Room {} no longer exists; nothing to release", b.room_id)
                    }
                    Err(e) => return Err(e.into()),
                },
                Err(RepoError::NotFound) => {
                    tracing::warn!("Hotel {} no longer exists; nothing to release", b.hotel_id)
                }
                Err(e) => return Err(e),
            },
            Booking::Travel(b) => match lock_route(&mut tx, b.route_id).await {
                Ok(mut route) => {
                    route.release_seats(&b.seat_numbers);
                    write_seats(&mut tx, &route).await?;
                }
                Err(RepoError::NotFound) => {
                    tracing::warn!("Route {} no longer exists; nothing to release", b.route_id)
                }
                Err(e) => return Err(e),
            },
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> RepoResult<(Vec<Booking>, u64)> {
        self.merged_page(Some(user_id), page).await
    }

    async fn list_all(&self, page: PageRequest) -> RepoResult<(Vec<Booking>, u64)> {
        self.merged_page(None, page).await
    }

    async fn count_bookings(&self) -> RepoResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM hotel_bookings) + (SELECT COUNT(*) FROM travel_bookings)",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(count as u64)
    }
}
