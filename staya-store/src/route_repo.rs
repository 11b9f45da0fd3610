use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use staya_catalog::{BusRoute, BusType, RouteFilter, RoutePatch, SeatLayout};
use staya_core::repository::{RepoResult, RouteRepository};
use staya_core::RepoError;
use staya_shared::{Currency, PageRequest};

use crate::database::{like_pattern, map_db_error};

pub struct PgRouteRepository {
    pool: PgPool,
}

impl PgRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const ROUTE_COLUMNS: &str = "id, operator_name, operator_logo, origin, destination, departure_time, \
     arrival_time, duration, price, currency, bus_type, amenities, total_seats, available_seats, seat_layout, \
     is_active, vendor_id, created_at, updated_at";

// Departure times are stored as entered ("7:30" or "07:30"); sort on minutes past midnight.
const DEPARTURE_ORDER: &str = "split_part(departure_time, ':', 1)::int * 60 + split_part(departure_time, ':', 2)::int";

#[derive(sqlx::FromRow)]
pub(crate) struct RouteRow {
    id: Uuid,
    operator_name: String,
    operator_logo: Option<String>,
    origin: String,
    destination: String,
    departure_time: String,
    arrival_time: String,
    duration: String,
    price: f64,
    currency: String,
    bus_type: String,
    amenities: Json<Vec<String>>,
    total_seats: i32,
    available_seats: i32,
    seat_layout: Json<SeatLayout>,
    is_active: bool,
    vendor_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RouteRow> for BusRoute {
    type Error = RepoError;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        let currency: Currency = row.currency.parse().map_err(RepoError::Backend)?;
        let bus_type = BusType::parse(&row.bus_type)
            .ok_or_else(|| RepoError::Backend(format!("Unknown bus type: {}", row.bus_type)))?;
        Ok(BusRoute {
            id: row.id,
            operator_name: row.operator_name,
            operator_logo: row.operator_logo,
            from: row.origin,
            to: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            duration: row.duration,
            price: row.price,
            currency,
            bus_type,
            amenities: row.amenities.0,
            total_seats: row.total_seats.max(0) as u32,
            available_seats: row.available_seats.max(0) as u32,
            seat_layout: row.seat_layout.0,
            is_active: row.is_active,
            vendor_id: row.vendor_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RouteFilter) {
    qb.push(" WHERE is_active = TRUE");
    if let Some(from) = filter.from.as_deref().filter(|f| !f.trim().is_empty()) {
        qb.push(" AND origin ILIKE ").push_bind(like_pattern(from));
    }
    if let Some(to) = filter.to.as_deref().filter(|t| !t.trim().is_empty()) {
        qb.push(" AND destination ILIKE ").push_bind(like_pattern(to));
    }
}

pub(crate) async fn lock_route(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    id: Uuid,
) -> RepoResult<BusRoute> {
    let row = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {} FROM bus_routes WHERE id = $1 FOR UPDATE",
        ROUTE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_db_error)?
    .ok_or(RepoError::NotFound)?;
    BusRoute::try_from(row)
}

pub(crate) async fn write_seats(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    route: &BusRoute,
) -> RepoResult<()> {
    sqlx::query("UPDATE bus_routes SET seat_layout = $2, available_seats = $3, updated_at = NOW() WHERE id = $1")
        .bind(route.id)
        .bind(Json(&route.seat_layout))
        .bind(route.available_seats as i32)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;
    Ok(())
}

#[async_trait]
impl RouteRepository for PgRouteRepository {
    async fn create_route(&self, route: &BusRoute) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bus_routes (id, operator_name, operator_logo, origin, destination, departure_time,
                                    arrival_time, duration, price, currency, bus_type, amenities, total_seats,
                                    available_seats, seat_layout, is_active, vendor_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(route.id)
        .bind(&route.operator_name)
        .bind(&route.operator_logo)
        .bind(&route.from)
        .bind(&route.to)
        .bind(&route.departure_time)
        .bind(&route.arrival_time)
        .bind(&route.duration)
        .bind(route.price)
        .bind(route.currency.code())
        .bind(route.bus_type.as_str())
        .bind(Json(&route.amenities))
        .bind(route.total_seats as i32)
        .bind(route.available_seats as i32)
        .bind(Json(&route.seat_layout))
        .bind(route.is_active)
        .bind(route.vendor_id)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn get_route(&self, id: Uuid) -> RepoResult<Option<BusRoute>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!("SELECT {} FROM bus_routes WHERE id = $1", ROUTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        row.map(BusRoute::try_from).transpose()
    }

    async fn list_routes(&self, filter: &RouteFilter, page: PageRequest) -> RepoResult<(Vec<BusRoute>, u64)> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM bus_routes", ROUTE_COLUMNS));
        push_filters(&mut qb, filter);
        qb.push(format!(" ORDER BY {} ASC, created_at DESC LIMIT ", DEPARTURE_ORDER))
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = qb
            .build_query_as::<RouteRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        let routes = rows.into_iter().map(BusRoute::try_from).collect::<RepoResult<Vec<_>>>()?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bus_routes");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok((routes, total as u64))
    }

    async fn update_route(&self, id: Uuid, patch: RoutePatch, now: DateTime<Utc>) -> RepoResult<BusRoute> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let mut route = lock_route(&mut tx, id).await?;
        route.apply(patch, now)?;

        sqlx::query(
            r#"
            UPDATE bus_routes
            SET operator_name = $2, operator_logo = $3, origin = $4, destination = $5, departure_time = $6,
                arrival_time = $7, duration = $8, price = $9, currency = $10, bus_type = $11, amenities = $12,
                is_active = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(route.id)
        .bind(&route.operator_name)
        .bind(&route.operator_logo)
        .bind(&route.from)
        .bind(&route.to)
        .bind(&route.departure_time)
        .bind(&route.arrival_time)
        .bind(&route.duration)
        .bind(route.price)
        .bind(route.currency.code())
        .bind(route.bus_type.as_str())
        .bind(Json(&route.amenities))
        .bind(route.is_active)
        .bind(route.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(route)
    }

    async fn delete_route(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM bus_routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn count_routes(&self) -> RepoResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bus_routes")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(count as u64)
    }
}
