use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use staya_shared::validation::check;
use staya_shared::{Currency, ValidationReport};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BusType {
    Standard,
    Luxury,
    Vip,
}

impl BusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusType::Standard => "standard",
            BusType::Luxury => "luxury",
            BusType::Vip => "vip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(BusType::Standard),
            "luxury" => Some(BusType::Luxury),
            "vip" => Some(BusType::Vip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatState {
    Available,
    Booked,
    Blocked,
    Aisle,
}

/// Seat grid of a coach. Rows are numbered from 1, positions lettered from `A`,
/// so `seat_map[2][1]` is seat `3B`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatLayout {
    pub rows: u32,
    pub seats_per_row: u32,
    pub seat_map: Vec<Vec<SeatState>>,
}

impl SeatLayout {
    /// Row-major grid where the first `total_seats` positions are bookable and the rest blocked.
    pub fn generate(rows: u32, seats_per_row: u32, total_seats: u32) -> Self {
        let seat_map = (0..rows)
            .map(|r| {
                (0..seats_per_row)
                    .map(|c| {
                        if r * seats_per_row + c < total_seats {
                            SeatState::Available
                        } else {
                            SeatState::Blocked
                        }
                    })
                    .collect()
            })
            .collect();

        Self { rows, seats_per_row, seat_map }
    }

    pub fn label(row: usize, position: usize) -> String {
        format!("{}{}", row + 1, (b'A' + position as u8) as char)
    }

    /// Resolve a label such as `12C` to grid coordinates, if it lies inside the grid.
    pub fn locate(&self, label: &str) -> Option<(usize, usize)> {
        let label = label.trim().to_ascii_uppercase();
        let letter = label.chars().last()?;
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let row: usize = label[..label.len() - 1].parse().ok()?;
        if row == 0 {
            return None;
        }
        let position = (letter as u8 - b'A') as usize;
        let cells = self.seat_map.get(row - 1)?;
        cells.get(position)?;
        Some((row - 1, position))
    }

    pub fn state_of(&self, label: &str) -> Option<SeatState> {
        self.locate(label).map(|(r, c)| self.seat_map[r][c])
    }

    pub fn available_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        for (r, row) in self.seat_map.iter().enumerate() {
            for (c, state) in row.iter().enumerate() {
                if *state == SeatState::Available {
                    labels.push(Self::label(r, c));
                }
            }
        }
        labels
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusRoute {
    pub id: Uuid,
    pub operator_name: String,
    pub operator_logo: Option<String>,
    pub from: String,
    pub to: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub price: f64,
    pub currency: Currency,
    pub bus_type: BusType,
    pub amenities: Vec<String>,
    pub total_seats: u32,
    pub available_seats: u32,
    pub seat_layout: SeatLayout,
    pub is_active: bool,
    pub vendor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeatLayoutInput {
    #[validate(range(min = 3, max = 30, message = "Bus must have between 3 and 30 rows"))]
    pub rows: u32,
    #[validate(range(min = 2, max = 5, message = "Each row must have between 2 and 5 seats"))]
    pub seats_per_row: u32,
    pub seat_map: Option<Vec<Vec<SeatState>>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RouteInput {
    #[validate(length(min = 1, max = 100, message = "Operator name is required and cannot be more than 100 characters"))]
    pub operator_name: String,
    pub operator_logo: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Departure location is required and cannot be more than 100 characters"))]
    pub from: String,
    #[validate(length(min = 1, max = 100, message = "Destination location is required and cannot be more than 100 characters"))]
    pub to: String,
    #[validate(custom(function = "staya_shared::validation::clock_time"))]
    pub departure_time: String,
    #[validate(custom(function = "staya_shared::validation::clock_time"))]
    pub arrival_time: String,
    #[validate(custom(function = "staya_shared::validation::journey_duration"))]
    pub duration: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    pub currency: Option<Currency>,
    pub bus_type: BusType,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[validate(range(min = 10, max = 60, message = "Bus must have between 10 and 60 seats"))]
    pub total_seats: u32,
    pub available_seats: u32,
    #[validate(nested)]
    pub seat_layout: SeatLayoutInput,
    pub is_active: Option<bool>,
}

/// Partial update of the commercial fields. Seat inventory is managed through bookings.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoutePatch {
    #[validate(length(min = 1, max = 100, message = "Operator name is required and cannot be more than 100 characters"))]
    pub operator_name: Option<String>,
    pub operator_logo: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Departure location is required and cannot be more than 100 characters"))]
    pub from: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Destination location is required and cannot be more than 100 characters"))]
    pub to: Option<String>,
    #[validate(custom(function = "staya_shared::validation::clock_time"))]
    pub departure_time: Option<String>,
    #[validate(custom(function = "staya_shared::validation::clock_time"))]
    pub arrival_time: Option<String>,
    #[validate(custom(function = "staya_shared::validation::journey_duration"))]
    pub duration: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub bus_type: Option<BusType>,
    pub amenities: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl BusRoute {
    pub fn create(input: RouteInput, vendor_id: Option<Uuid>, now: DateTime<Utc>) -> Result<BusRoute, ValidationReport> {
        check(&input)?;

        let layout = input.seat_layout;
        let seat_layout = match layout.seat_map {
            Some(seat_map) => SeatLayout {
                rows: layout.rows,
                seats_per_row: layout.seats_per_row,
                seat_map,
            },
            None => SeatLayout::generate(layout.rows, layout.seats_per_row, input.total_seats),
        };

        let route = BusRoute {
            id: Uuid::new_v4(),
            operator_name: input.operator_name.trim().to_string(),
            operator_logo: input.operator_logo,
            from: input.from.trim().to_string(),
            to: input.to.trim().to_string(),
            departure_time: input.departure_time,
            arrival_time: input.arrival_time,
            duration: input.duration,
            price: input.price,
            currency: input.currency.unwrap_or_default(),
            bus_type: input.bus_type,
            amenities: input.amenities.into_iter().map(|a| a.trim().to_string()).collect(),
            total_seats: input.total_seats,
            available_seats: input.available_seats,
            seat_layout,
            is_active: input.is_active.unwrap_or(true),
            vendor_id,
            created_at: now,
            updated_at: now,
        };

        route.check_invariants().into_result()?;
        Ok(route)
    }

    pub fn apply(&mut self, patch: RoutePatch, now: DateTime<Utc>) -> Result<(), ValidationReport> {
        check(&patch)?;

        let mut next = self.clone();
        if let Some(operator_name) = patch.operator_name {
            next.operator_name = operator_name.trim().to_string();
        }
        if let Some(logo) = patch.operator_logo {
            next.operator_logo = Some(logo);
        }
        if let Some(from) = patch.from {
            next.from = from.trim().to_string();
        }
        if let Some(to) = patch.to {
            next.to = to.trim().to_string();
        }
        if let Some(departure) = patch.departure_time {
            next.departure_time = departure;
        }
        if let Some(arrival) = patch.arrival_time {
            next.arrival_time = arrival;
        }
        if let Some(duration) = patch.duration {
            next.duration = duration;
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(currency) = patch.currency {
            next.currency = currency;
        }
        if let Some(bus_type) = patch.bus_type {
            next.bus_type = bus_type;
        }
        if let Some(amenities) = patch.amenities {
            next.amenities = amenities;
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }

        next.check_invariants().into_result()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Seat-count and grid consistency. A violation rejects the write outright.
    pub fn check_invariants(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        if self.available_seats > self.total_seats {
            report.push("availableSeats", "Available seats cannot exceed total seats");
        }

        let layout = &self.seat_layout;
        let grid_ok = layout.seat_map.len() == layout.rows as usize
            && layout
                .seat_map
                .iter()
                .all(|row| row.len() == layout.seats_per_row as usize);
        if !grid_ok {
            report.push(
                "seatLayout.seatMap",
                "Seat map must have exactly rows x seatsPerRow positions",
            );
        }

        if u64::from(layout.rows) * u64::from(layout.seats_per_row) < u64::from(self.total_seats) {
            report.push(
                "seatLayout",
                "Seat layout has fewer positions than total seats",
            );
        }

        report
    }
}
