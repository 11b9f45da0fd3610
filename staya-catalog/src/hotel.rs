use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use staya_shared::validation::check;
use staya_shared::{Currency, ValidationReport};

pub const DEFAULT_STATE: &str = "Taraba State";
pub const DEFAULT_COUNTRY: &str = "Nigeria";
pub const DEFAULT_RATING: f64 = 4.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Suite,
    Family,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
}

/// A bookable room category embedded in a hotel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub capacity: u32,
    pub price_per_night: f64,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub is_available: bool,
    pub total_rooms: u32,
    pub available_rooms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub rating: f64,
    pub review_count: u32,
    pub price_per_night: f64,
    pub currency: Currency,
    pub rooms: Vec<Room>,
    pub location: GeoLocation,
    pub is_active: bool,
    pub vendor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomInput {
    /// Present when an update keeps an existing room (and its bookings) addressable.
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 100, message = "Room name is required and cannot be more than 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "Room description is required and cannot be more than 500 characters"))]
    pub description: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    #[validate(range(min = 1, max = 10, message = "Capacity must be between 1 and 10"))]
    pub capacity: u32,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price_per_night: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub is_available: Option<bool>,
    #[validate(range(min = 1, message = "Total rooms must be at least 1"))]
    pub total_rooms: u32,
    pub available_rooms: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HotelInput {
    #[validate(length(min = 1, max = 100, message = "Hotel name is required and cannot be more than 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 1000, message = "Description is required and cannot be more than 1000 characters"))]
    pub description: String,
    #[validate(length(min = 1, max = 200, message = "Address is required and cannot be more than 200 characters"))]
    pub address: String,
    #[validate(length(min = 1, max = 50, message = "City is required and cannot be more than 50 characters"))]
    pub city: String,
    #[validate(length(min = 1, message = "State cannot be empty"))]
    pub state: Option<String>,
    #[validate(length(min = 1, message = "Country cannot be empty"))]
    pub country: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price_per_night: f64,
    pub currency: Option<Currency>,
    #[serde(default)]
    #[validate(nested)]
    pub rooms: Vec<RoomInput>,
    #[validate(nested)]
    pub location: GeoLocation,
    pub is_active: Option<bool>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HotelPatch {
    #[validate(length(min = 1, max = 100, message = "Hotel name is required and cannot be more than 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "Description is required and cannot be more than 1000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Address is required and cannot be more than 200 characters"))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 50, message = "City is required and cannot be more than 50 characters"))]
    pub city: Option<String>,
    #[validate(length(min = 1, message = "State cannot be empty"))]
    pub state: Option<String>,
    #[validate(length(min = 1, message = "Country cannot be empty"))]
    pub country: Option<String>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price_per_night: Option<f64>,
    pub currency: Option<Currency>,
    #[validate(nested)]
    pub rooms: Option<Vec<RoomInput>>,
    #[validate(nested)]
    pub location: Option<GeoLocation>,
    pub is_active: Option<bool>,
}

impl RoomInput {
    fn into_room(self) -> Room {
        Room {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name.trim().to_string(),
            description: self.description,
            room_type: self.room_type,
            capacity: self.capacity,
            price_per_night: self.price_per_night,
            images: self.images,
            amenities: trimmed(self.amenities),
            is_available: self.is_available.unwrap_or(true),
            total_rooms: self.total_rooms,
            available_rooms: self.available_rooms,
        }
    }
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).collect()
}

impl Hotel {
    /// Validate a create payload and build the hotel owned by `vendor_id`.
    pub fn create(input: HotelInput, vendor_id: Option<Uuid>, now: DateTime<Utc>) -> Result<Hotel, ValidationReport> {
        let mut report = check(&input).err().unwrap_or_default();

        let hotel = Hotel {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            address: input.address,
            city: input.city.trim().to_string(),
            state: input.state.map(|s| s.trim().to_string()).unwrap_or_else(|| DEFAULT_STATE.to_string()),
            country: input.country.map(|c| c.trim().to_string()).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            images: input.images,
            amenities: trimmed(input.amenities),
            rating: input.rating.unwrap_or(DEFAULT_RATING),
            review_count: input.review_count.unwrap_or(0),
            price_per_night: input.price_per_night,
            currency: input.currency.unwrap_or_default(),
            rooms: input.rooms.into_iter().map(RoomInput::into_room).collect(),
            location: input.location,
            is_active: input.is_active.unwrap_or(true),
            vendor_id,
            created_at: now,
            updated_at: now,
        };

        report.merge(hotel.check_invariants());
        report.into_result()?;
        Ok(hotel)
    }

    /// Apply a partial update. The hotel is left untouched when validation fails.
    pub fn apply(&mut self, patch: HotelPatch, now: DateTime<Utc>) -> Result<(), ValidationReport> {
        let mut report = check(&patch).err().unwrap_or_default();

        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(address) = patch.address {
            next.address = address;
        }
        if let Some(city) = patch.city {
            next.city = city.trim().to_string();
        }
        if let Some(state) = patch.state {
            next.state = state.trim().to_string();
        }
        if let Some(country) = patch.country {
            next.country = country.trim().to_string();
        }
        if let Some(images) = patch.images {
            next.images = images;
        }
        if let Some(amenities) = patch.amenities {
            next.amenities = trimmed(amenities);
        }
        if let Some(rating) = patch.rating {
            next.rating = rating;
        }
        if let Some(review_count) = patch.review_count {
            next.review_count = review_count;
        }
        if let Some(price) = patch.price_per_night {
            next.price_per_night = price;
        }
        if let Some(currency) = patch.currency {
            next.currency = currency;
        }
        if let Some(rooms) = patch.rooms {
            next.rooms = rooms.into_iter().map(RoomInput::into_room).collect();
        }
        if let Some(location) = patch.location {
            next.location = location;
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }

        report.merge(next.check_invariants());
        report.into_result()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Cross-field rules the derived validators cannot express.
    pub fn check_invariants(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for (index, room) in self.rooms.iter().enumerate() {
            if room.available_rooms > room.total_rooms {
                report.push(
                    format!("rooms[{}].availableRooms", index),
                    "Available rooms cannot exceed total rooms",
                );
            }
        }
        report
    }

    pub fn room(&self, room_id: Uuid) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn room_mut(&mut self, room_id: Uuid) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == room_id)
    }
}
