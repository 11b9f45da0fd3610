use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use staya_catalog::{GeoLocation, Hotel, HotelFilter, HotelPatch, Room};
use staya_core::repository::{HotelRepository, RepoResult};
use staya_core::RepoError;
use staya_shared::{Currency, PageRequest};

use crate::database::{like_pattern, map_db_error};

pub struct PgHotelRepository {
    pool: PgPool,
}

impl PgHotelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const HOTEL_COLUMNS: &str = "id, name, description, address, city, state, country, images, amenities, \
     rating, review_count, price_per_night, currency, rooms, latitude, longitude, is_active, vendor_id, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct HotelRow {
    id: Uuid,
    name: String,
    description: String,
    address: String,
    city: String,
    state: String,
    country: String,
    images: Json<Vec<String>>,
    amenities: Json<Vec<String>>,
    rating: f64,
    review_count: i32,
    price_per_night: f64,
    currency: String,
    rooms: Json<Vec<Room>>,
    latitude: f64,
    longitude: f64,
    is_active: bool,
    vendor_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HotelRow> for Hotel {
    type Error = RepoError;

    fn try_from(row: HotelRow) -> Result<Self, Self::Error> {
        let currency: Currency = row.currency.parse().map_err(RepoError::Backend)?;
        Ok(Hotel {
            id: row.id,
            name: row.name,
            description: row.description,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            images: row.images.0,
            amenities: row.amenities.0,
            rating: row.rating,
            review_count: row.review_count.max(0) as u32,
            price_per_night: row.price_per_night,
            currency,
            rooms: row.rooms.0,
            location: GeoLocation {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            is_active: row.is_active,
            vendor_id: row.vendor_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &HotelFilter) {
    qb.push(" WHERE is_active = TRUE");
    if let Some(city) = filter.city.as_deref().filter(|c| !c.trim().is_empty()) {
        qb.push(" AND city ILIKE ").push_bind(like_pattern(city));
    }
    if let Some(state) = filter.state.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND state ILIKE ").push_bind(like_pattern(state));
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price_per_night >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price_per_night <= ").push_bind(max);
    }
    if let Some(rating) = filter.rating {
        qb.push(" AND rating >= ").push_bind(rating);
    }
}

/// Load a hotel row inside an open transaction, locking it until commit.
pub(crate) async fn lock_hotel(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    id: Uuid,
) -> RepoResult<Hotel> {
    let row = sqlx::query_as::<_, HotelRow>(&format!(
        "SELECT {} FROM hotels WHERE id = $1 FOR UPDATE",
        HOTEL_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_db_error)?
    .ok_or(RepoError::NotFound)?;
    Hotel::try_from(row)
}

pub(crate) async fn write_rooms(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    hotel: &Hotel,
) -> RepoResult<()> {
    sqlx::query("UPDATE hotels SET rooms = $2, updated_at = NOW() WHERE id = $1")
        .bind(hotel.id)
        .bind(Json(&hotel.rooms))
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;
    Ok(())
}

#[async_trait]
impl HotelRepository for PgHotelRepository {
    async fn create_hotel(&self, hotel: &Hotel) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hotels (id, name, description, address, city, state, country, images, amenities,
                                rating, review_count, price_per_night, currency, rooms, latitude, longitude,
                                is_active, vendor_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(hotel.id)
        .bind(&hotel.name)
        .bind(&hotel.description)
        .bind(&hotel.address)
        .bind(&hotel.city)
        .bind(&hotel.state)
        .bind(&hotel.country)
        .bind(Json(&hotel.images))
        .bind(Json(&hotel.amenities))
        .bind(hotel.rating)
        .bind(hotel.review_count as i32)
        .bind(hotel.price_per_night)
        .bind(hotel.currency.code())
        .bind(Json(&hotel.rooms))
        .bind(hotel.location.latitude)
        .bind(hotel.location.longitude)
        .bind(hotel.is_active)
        .bind(hotel.vendor_id)
        .bind(hotel.created_at)
        .bind(hotel.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn get_hotel(&self, id: Uuid) -> RepoResult<Option<Hotel>> {
        let row = sqlx::query_as::<_, HotelRow>(&format!("SELECT {} FROM hotels WHERE id = $1", HOTEL_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        row.map(Hotel::try_from).transpose()
    }

    async fn list_hotels(&self, filter: &HotelFilter, page: PageRequest) -> RepoResult<(Vec<Hotel>, u64)> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM hotels", HOTEL_COLUMNS));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY rating DESC, created_at DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = qb
            .build_query_as::<HotelRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        let hotels = rows.into_iter().map(Hotel::try_from).collect::<RepoResult<Vec<_>>>()?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM hotels");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok((hotels, total as u64))
    }

    async fn update_hotel(&self, id: Uuid, patch: HotelPatch, now: DateTime<Utc>) -> RepoResult<Hotel> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let mut hotel = lock_hotel(&mut tx, id).await?;
        hotel.apply(patch, now)?;

        sqlx::query(
            r#"
            UPDATE hotels
            SET name = $2, description = $3, address = $4, city = $5, state = $6, country = $7,
                images = $8, amenities = $9, rating = $10, review_count = $11, price_per_night = $12,
                currency = $13, rooms = $14, latitude = $15, longitude = $16, is_active = $17,
                updated_at = $18
            WHERE id = $1
            "#,
        )
        .bind(hotel.id)
        .bind(&hotel.name)
        .bind(&hotel.description)
        .bind(&hotel.address)
        .bind(&hotel.city)
        .bind(&hotel.state)
        .bind(&hotel.country)
        .bind(Json(&hotel.images))
        .bind(Json(&hotel.amenities))
        .bind(hotel.rating)
        .bind(hotel.review_count as i32)
        .bind(hotel.price_per_night)
        .bind(hotel.currency.code())
        .bind(Json(&hotel.rooms))
        .bind(hotel.location.latitude)
        .bind(hotel.location.longitude)
        .bind(hotel.is_active)
        .bind(hotel.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(hotel)
    }

    async fn delete_hotel(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM hotels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn count_hotels(&self) -> RepoResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM hotels")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(count as u64)
    }
}
