use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

use staya_catalog::inventory::normalize_seats;
use staya_catalog::{BusRoute, Hotel};
use staya_shared::validation::check;
use staya_shared::{ContactDetails, ValidationReport};

use crate::models::{BookingState, HotelBooking, TravelBooking};
use crate::reference::BookingKind;
use crate::BookingError;

pub const MAX_PARTY_SIZE: u32 = 10;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HotelBookingRequest {
    pub hotel_id: Uuid,
    pub room_id: Uuid,
    #[serde(deserialize_with = "calendar_date")]
    pub check_in_date: NaiveDate,
    #[serde(deserialize_with = "calendar_date")]
    pub check_out_date: NaiveDate,
    #[validate(range(min = 1, max = 10, message = "Guests must be between 1 and 10"))]
    pub guests: u32,
    #[validate(nested)]
    pub guest_details: ContactDetails,
    #[validate(length(max = 500, message = "Special requests cannot be more than 500 characters"))]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TravelBookingRequest {
    pub route_id: Uuid,
    #[serde(deserialize_with = "calendar_date")]
    pub travel_date: NaiveDate,
    #[validate(range(min = 1, max = 10, message = "Passengers must be between 1 and 10"))]
    pub passengers: u32,
    #[validate(length(min = 1, message = "Please select at least one seat"))]
    pub seat_numbers: Vec<String>,
    #[validate(nested)]
    pub passenger_details: Vec<ContactDetails>,
}

/// Accept either a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
fn calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| serde::de::Error::custom(format!("Invalid date: {}", raw)))
}

/// Build a pending hotel booking. Inventory is reserved later, by the store, atomically.
pub fn plan_hotel_booking(
    request: HotelBookingRequest,
    user_id: Uuid,
    hotel: &Hotel,
    now: DateTime<Utc>,
) -> Result<HotelBooking, BookingError> {
    check(&request)?;

    let mut report = ValidationReport::new();
    let today = now.date_naive();
    if request.check_in_date < today {
        report.push("checkInDate", "Check-in date cannot be in the past");
    }
    if request.check_out_date <= request.check_in_date {
        report.push("checkOutDate", "Check-out date must be after check-in date");
    }
    report.into_result()?;

    if !hotel.is_active || hotel.id != request.hotel_id {
        return Err(BookingError::Unavailable("This hotel is not accepting bookings".to_string()));
    }

    let room = hotel
        .room(request.room_id)
        .ok_or(staya_catalog::InventoryError::RoomNotFound(request.room_id))?;
    if !room.is_available || room.available_rooms == 0 {
        return Err(staya_catalog::InventoryError::RoomSoldOut.into());
    }
    if request.guests > room.capacity {
        return Err(ValidationReport::single(
            "guests",
            format!("This room accommodates at most {} guests", room.capacity),
        )
        .into());
    }

    let nights = (request.check_out_date - request.check_in_date).num_days().max(1) as u32;
    let total = room.price_per_night * nights as f64;

    Ok(HotelBooking {
        id: Uuid::new_v4(),
        user_id,
        hotel_id: hotel.id,
        room_id: room.id,
        check_in_date: request.check_in_date,
        check_out_date: request.check_out_date,
        nights,
        guests: request.guests,
        guest_details: request.guest_details.normalized(),
        special_requests: request.special_requests.filter(|s| !s.trim().is_empty()),
        state: BookingState::new(BookingKind::Hotel, total, hotel.currency, now),
    })
}

/// Build a pending travel booking after checking the seats against the current map.
pub fn plan_travel_booking(
    request: TravelBookingRequest,
    user_id: Uuid,
    route: &BusRoute,
    now: DateTime<Utc>,
) -> Result<TravelBooking, BookingError> {
    check(&request)?;

    let mut report = ValidationReport::new();
    if request.travel_date < now.date_naive() {
        report.push("travelDate", "Travel date cannot be in the past");
    }
    if request.seat_numbers.len() != request.passengers as usize {
        report.push("seatNumbers", "Number of seats must match number of passengers");
    }
    if request.passenger_details.len() != request.passengers as usize {
        report.push("passengerDetails", "Please provide details for every passenger");
    }
    report.into_result()?;

    if !route.is_active || route.id != request.route_id {
        return Err(BookingError::Unavailable("This route is not accepting bookings".to_string()));
    }

    let seats = normalize_seats(&request.seat_numbers);
    route.check_seats(&seats)?;

    let total = route.price * request.passengers as f64;

    Ok(TravelBooking {
        id: Uuid::new_v4(),
        user_id,
        route_id: route.id,
        travel_date: request.travel_date,
        passengers: request.passengers,
        seat_numbers: seats,
        passenger_details: request
            .passenger_details
            .into_iter()
            .map(ContactDetails::normalized)
            .collect(),
        state: BookingState::new(BookingKind::Travel, total, route.currency, now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentStatus};
    use chrono::Duration;
    use serde_json::json;
    use staya_catalog::InventoryError;

    fn hotel() -> Hotel {
        let input = serde_json::from_value(json!({
            "name": "Mambilla Plateau Resort",
            "description": "Cool highland air",
            "address": "1 Gembu Road",
            "city": "Gembu",
            "pricePerNight": 25000.0,
            "location": { "latitude": 6.7, "longitude": 11.25 },
            "rooms": [{
                "name": "Deluxe Double",
                "description": "Queen bed",
                "type": "double",
                "capacity": 2,
                "pricePerNight": 30000.0,
                "totalRooms": 1,
                "availableRooms": 1
            }]
        }))
        .unwrap();
        Hotel::create(input, None, Utc::now()).unwrap()
    }

    fn route() -> BusRoute {
        let input = serde_json::from_value(json!({
            "operatorName": "Jalingo Express",
            "from": "Jalingo",
            "to": "Abuja",
            "departureTime": "07:30",
            "arrivalTime": "15:45",
            "duration": "8h 15m",
            "price": 12000.0,
            "busType": "standard",
            "totalSeats": 12,
            "availableSeats": 12,
            "seatLayout": { "rows": 4, "seatsPerRow": 3 }
        }))
        .unwrap();
        BusRoute::create(input, None, Utc::now()).unwrap()
    }

    fn guest() -> serde_json::Value {
        json!({
            "firstName": "Ada",
            "lastName": "Obi",
            "email": "ada@mail.com",
            "phone": "08031234567"
        })
    }

    fn hotel_request(hotel: &Hotel, check_in: NaiveDate, check_out: NaiveDate, guests: u32) -> HotelBookingRequest {
        serde_json::from_value(json!({
            "hotelId": hotel.id,
            "roomId": hotel.rooms[0].id,
            "checkInDate": check_in.to_string(),
            "checkOutDate": check_out.to_string(),
            "guests": guests,
            "guestDetails": guest()
        }))
        .unwrap()
    }

    #[test]
    fn test_hotel_booking_totals() {
        let hotel = hotel();
        let now = Utc::now();
        let today = now.date_naive();
        let request = hotel_request(&hotel, today + Duration::days(1), today + Duration::days(3), 2);

        let booking = plan_hotel_booking(request, Uuid::new_v4(), &hotel, now).unwrap();
        assert_eq!(booking.nights, 2);
        assert_eq!(booking.state.total_amount, 60000.0);
        assert_eq!(booking.state.status, BookingStatus::Pending);
        assert_eq!(booking.state.payment_status, PaymentStatus::Pending);
        assert!(booking.state.booking_reference.as_str().starts_with("HTL-"));
    }

    #[test]
    fn test_rejects_bad_dates() {
        let hotel = hotel();
        let now = Utc::now();
        let today = now.date_naive();

        let same_day = hotel_request(&hotel, today + Duration::days(2), today + Duration::days(2), 1);
        let err = plan_hotel_booking(same_day, Uuid::new_v4(), &hotel, now).unwrap_err();
        assert_eq!(err.to_string(), "Check-out date must be after check-in date");

        let past = hotel_request(&hotel, today - Duration::days(1), today + Duration::days(2), 1);
        let err = plan_hotel_booking(past, Uuid::new_v4(), &hotel, now).unwrap_err();
        assert_eq!(err.to_string(), "Check-in date cannot be in the past");
    }

    #[test]
    fn test_same_day_check_in_is_allowed() {
        let hotel = hotel();
        let now = Utc::now();
        let today = now.date_naive();
        let request = hotel_request(&hotel, today, today + Duration::days(1), 1);
        assert!(plan_hotel_booking(request, Uuid::new_v4(), &hotel, now).is_ok());
    }

    #[test]
    fn test_room_capacity_and_sold_out() {
        let mut hotel = hotel();
        let now = Utc::now();
        let today = now.date_naive();

        let crowd = hotel_request(&hotel, today + Duration::days(1), today + Duration::days(2), 3);
        assert!(matches!(
            plan_hotel_booking(crowd, Uuid::new_v4(), &hotel, now),
            Err(BookingError::Validation(_))
        ));

        let room_id = hotel.rooms[0].id;
        hotel.reserve_room(room_id).unwrap();
        let request = hotel_request(&hotel, today + Duration::days(1), today + Duration::days(2), 1);
        assert!(matches!(
            plan_hotel_booking(request, Uuid::new_v4(), &hotel, now),
            Err(BookingError::Inventory(InventoryError::RoomSoldOut))
        ));
    }

    #[test]
    fn test_accepts_timestamp_dates() {
        let hotel = hotel();
        let tomorrow = Utc::now() + Duration::days(1);
        let request: HotelBookingRequest = serde_json::from_value(json!({
            "hotelId": hotel.id,
            "roomId": hotel.rooms[0].id,
            "checkInDate": tomorrow.to_rfc3339(),
            "checkOutDate": (tomorrow + Duration::days(1)).format("%Y-%m-%d").to_string(),
            "guests": 1,
            "guestDetails": guest()
        }))
        .unwrap();
        assert_eq!(request.check_in_date, tomorrow.date_naive());
    }

    #[test]
    fn test_travel_booking_checks_seats() {
        let route = route();
        let now = Utc::now();
        let date = (now + Duration::days(5)).date_naive();

        let request: TravelBookingRequest = serde_json::from_value(json!({
            "routeId": route.id,
            "travelDate": date.to_string(),
            "passengers": 2,
            "seatNumbers": ["1a", "1B"],
            "passengerDetails": [guest(), guest()]
        }))
        .unwrap();
        let booking = plan_travel_booking(request, Uuid::new_v4(), &route, now).unwrap();
        assert_eq!(booking.seat_numbers, vec!["1A", "1B"]);
        assert_eq!(booking.state.total_amount, 24000.0);
        assert!(booking.state.booking_reference.as_str().starts_with("TRV-"));

        let mismatch: TravelBookingRequest = serde_json::from_value(json!({
            "routeId": route.id,
            "travelDate": date.to_string(),
            "passengers": 2,
            "seatNumbers": ["1A"],
            "passengerDetails": [guest(), guest()]
        }))
        .unwrap();
        let err = plan_travel_booking(mismatch, Uuid::new_v4(), &route, now).unwrap_err();
        assert_eq!(err.to_string(), "Number of seats must match number of passengers");

        let taken: TravelBookingRequest = serde_json::from_value(json!({
            "routeId": route.id,
            "travelDate": date.to_string(),
            "passengers": 1,
            "seatNumbers": ["9Z"],
            "passengerDetails": [guest()]
        }))
        .unwrap();
        assert!(matches!(
            plan_travel_booking(taken, Uuid::new_v4(), &route, now),
            Err(BookingError::Inventory(InventoryError::UnknownSeat(_)))
        ));
    }
}
