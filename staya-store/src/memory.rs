use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use staya_booking::{Booking, BookingReference, HotelBooking, Stage, TravelBooking};
use staya_catalog::search::{sort_hotels, sort_routes};
use staya_catalog::{BusRoute, Hotel, HotelFilter, HotelPatch, InventoryError, RouteFilter, RoutePatch};
use staya_core::repository::{
    BookingRepository, HotelRepository, RepoResult, RouteRepository, UserRepository,
};
use staya_core::{RepoError, User};
use staya_shared::PageRequest;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    hotels: HashMap<Uuid, Hotel>,
    routes: HashMap<Uuid, BusRoute>,
    bookings: Vec<Booking>,
}

/// Process-local store used by the test suite and by database-less dev runs.
///
/// Every operation takes the one table lock, so inventory checks and booking
/// inserts cannot interleave.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The stored booking, provided it is still at stage `from`.
fn stored_at<'a>(
    bookings: &'a mut [Booking],
    reference: &BookingReference,
    from: Stage,
) -> RepoResult<&'a mut Booking> {
    let stored = bookings
        .iter_mut()
        .find(|b| b.reference() == reference)
        .ok_or(RepoError::NotFound)?;
    if stored.state().stage() != from {
        return Err(RepoError::Stale);
    }
    Ok(stored)
}

fn newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(taken) = tables
            .users
            .values()
            .find(|u| u.email == user.email || u.phone == user.phone)
        {
            let field = if taken.email == user.email { "email" } else { "phone" };
            return Err(RepoError::Duplicate(field.to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_or_phone(&self, email: &str, phone: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let phone = phone.trim();
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email || u.phone == phone)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.id != user.id && u.phone == user.phone) {
            return Err(RepoError::Duplicate("phone".to_string()));
        }
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn list_users(&self, page: PageRequest) -> RepoResult<(Vec<User>, u64)> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((page.apply(&users), users.len() as u64))
    }

    async fn count_users(&self) -> RepoResult<u64> {
        Ok(self.tables.lock().await.users.len() as u64)
    }
}

#[async_trait]
impl HotelRepository for MemoryStore {
    async fn create_hotel(&self, hotel: &Hotel) -> RepoResult<()> {
        self.tables.lock().await.hotels.insert(hotel.id, hotel.clone());
        Ok(())
    }

    async fn get_hotel(&self, id: Uuid) -> RepoResult<Option<Hotel>> {
        Ok(self.tables.lock().await.hotels.get(&id).cloned())
    }

    async fn list_hotels(&self, filter: &HotelFilter, page: PageRequest) -> RepoResult<(Vec<Hotel>, u64)> {
        let tables = self.tables.lock().await;
        let mut hotels: Vec<Hotel> = tables.hotels.values().filter(|h| filter.matches(h)).cloned().collect();
        sort_hotels(&mut hotels);
        Ok((page.apply(&hotels), hotels.len() as u64))
    }

    async fn update_hotel(&self, id: Uuid, patch: HotelPatch, now: DateTime<Utc>) -> RepoResult<Hotel> {
        let mut tables = self.tables.lock().await;
        let hotel = tables.hotels.get_mut(&id).ok_or(RepoError::NotFound)?;
        hotel.apply(patch, now)?;
        Ok(hotel.clone())
    }

    async fn delete_hotel(&self, id: Uuid) -> RepoResult<()> {
        self.tables
            .lock()
            .await
            .hotels
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn count_hotels(&self) -> RepoResult<u64> {
        Ok(self.tables.lock().await.hotels.len() as u64)
    }
}

#[async_trait]
impl RouteRepository for MemoryStore {
    async fn create_route(&self, route: &BusRoute) -> RepoResult<()> {
        self.tables.lock().await.routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn get_route(&self, id: Uuid) -> RepoResult<Option<BusRoute>> {
        Ok(self.tables.lock().await.routes.get(&id).cloned())
    }

    async fn list_routes(&self, filter: &RouteFilter, page: PageRequest) -> RepoResult<(Vec<BusRoute>, u64)> {
        let tables = self.tables.lock().await;
        let mut routes: Vec<BusRoute> = tables.routes.values().filter(|r| filter.matches(r)).cloned().collect();
        sort_routes(&mut routes);
        Ok((page.apply(&routes), routes.len() as u64))
    }

    async fn update_route(&self, id: Uuid, patch: RoutePatch, now: DateTime<Utc>) -> RepoResult<BusRoute> {
        let mut tables = self.tables.lock().await;
        let route = tables.routes.get_mut(&id).ok_or(RepoError::NotFound)?;
        route.apply(patch, now)?;
        Ok(route.clone())
    }

    async fn delete_route(&self, id: Uuid) -> RepoResult<()> {
        self.tables
            .lock()
            .await
            .routes
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn count_routes(&self) -> RepoResult<u64> {
        Ok(self.tables.lock().await.routes.len() as u64)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_hotel_booking(&self, booking: &HotelBooking) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        let reference = &booking.state.booking_reference;
        if tables.bookings.iter().any(|b| b.reference() == reference) {
            return Err(RepoError::Duplicate("bookingReference".to_string()));
        }

        let hotel = tables.hotels.get_mut(&booking.hotel_id).ok_or(RepoError::NotFound)?;
        hotel.reserve_room(booking.room_id)?;
        tables.bookings.push(Booking::Hotel(booking.clone()));
        Ok(())
    }

    async fn create_travel_booking(&self, booking: &TravelBooking) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        let reference = &booking.state.booking_reference;
        if tables.bookings.iter().any(|b| b.reference() == reference) {
            return Err(RepoError::Duplicate("bookingReference".to_string()));
        }

        let route = tables.routes.get_mut(&booking.route_id).ok_or(RepoError::NotFound)?;
        route.reserve_seats(&booking.seat_numbers)?;
        tables.bookings.push(Booking::Travel(booking.clone()));
        Ok(())
    }

    async fn find_by_reference(&self, reference: &BookingReference) -> RepoResult<Option<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables.bookings.iter().find(|b| b.reference() == reference).cloned())
    }

    async fn update_state(&self, booking: &Booking, from: Stage) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        let stored = stored_at(&mut tables.bookings, booking.reference(), from)?;
        *stored.state_mut() = booking.state().clone();
        Ok(())
    }

    async fn cancel_booking(&self, booking: &Booking, from: Stage) -> RepoResult<()> {
        let mut tables = self.tables.lock().await;
        let stored = stored_at(&mut tables.bookings, booking.reference(), from)?;
        *stored.state_mut() = booking.state().clone();

        match booking {
            Booking::Hotel(b) => {
                if let Some(hotel) = tables.hotels.get_mut(&b.hotel_id) {
                    match hotel.release_room(b.room_id) {
                        Ok(()) | Err(InventoryError::RoomNotFound(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            Booking::Travel(b) => {
                if let Some(route) = tables.routes.get_mut(&b.route_id) {
                    route.release_seats(&b.seat_numbers);
                }
            }
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid, page: PageRequest) -> RepoResult<(Vec<Booking>, u64)> {
        let tables = self.tables.lock().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id() == user_id)
            .cloned()
            .collect();
        newest_first(&mut bookings);
        Ok((page.apply(&bookings), bookings.len() as u64))
    }

    async fn list_all(&self, page: PageRequest) -> RepoResult<(Vec<Booking>, u64)> {
        let tables = self.tables.lock().await;
        let mut bookings = tables.bookings.clone();
        newest_first(&mut bookings);
        Ok((page.apply(&bookings), bookings.len() as u64))
    }

    async fn count_bookings(&self) -> RepoResult<u64> {
        Ok(self.tables.lock().await.bookings.len() as u64)
    }
}
