use std::collections::HashSet;

use uuid::Uuid;

use crate::hotel::Hotel;
use crate::route::{BusRoute, SeatLayout, SeatState};

/// Availability bookkeeping for rooms and seats.
///
/// Both stores call these methods inside their own atomic section (a row lock
/// or a mutex), so a reservation either applies completely or not at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Room not found: {0}")]
    RoomNotFound(Uuid),

    #[error("No rooms of this type are available for booking")]
    RoomSoldOut,

    #[error("Seat {0} does not exist on this route")]
    UnknownSeat(String),

    #[error("Seat {0} is not available")]
    SeatUnavailable(String),

    #[error("Seat {0} was selected more than once")]
    DuplicateSeat(String),

    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats {
        requested: u32,
        available: u32,
    },
}

impl Hotel {
    /// Take one room of the given category out of availability.
    pub fn reserve_room(&mut self, room_id: Uuid) -> Result<(), InventoryError> {
        let room = self.room_mut(room_id).ok_or(InventoryError::RoomNotFound(room_id))?;

        if !room.is_available || room.available_rooms == 0 {
            return Err(InventoryError::RoomSoldOut);
        }

        room.available_rooms -= 1;
        Ok(())
    }

    /// Return a previously reserved room. Never exceeds the category's total.
    pub fn release_room(&mut self, room_id: Uuid) -> Result<(), InventoryError> {
        let room = self.room_mut(room_id).ok_or(InventoryError::RoomNotFound(room_id))?;
        room.available_rooms = (room.available_rooms + 1).min(room.total_rooms);
        Ok(())
    }
}

impl BusRoute {
    /// Check that every seat can be booked without touching the route.
    pub fn check_seats(&self, seats: &[String]) -> Result<(), InventoryError> {
        let mut seen = HashSet::new();
        for seat in seats {
            let label = seat.trim().to_ascii_uppercase();
            if !seen.insert(label.clone()) {
                return Err(InventoryError::DuplicateSeat(label));
            }
            match self.seat_layout.state_of(&label) {
                None | Some(SeatState::Aisle) => return Err(InventoryError::UnknownSeat(label)),
                Some(SeatState::Available) => {}
                Some(_) => return Err(InventoryError::SeatUnavailable(label)),
            }
        }

        let requested = seats.len() as u32;
        if requested > self.available_seats {
            return Err(InventoryError::InsufficientSeats {
                requested,
                available: self.available_seats,
            });
        }

        Ok(())
    }

    /// Mark the seats booked and decrement the counter, all or nothing.
    pub fn reserve_seats(&mut self, seats: &[String]) -> Result<(), InventoryError> {
        self.check_seats(seats)?;

        for seat in seats {
            if let Some((r, c)) = self.seat_layout.locate(seat) {
                self.seat_layout.seat_map[r][c] = SeatState::Booked;
            }
        }
        self.available_seats -= seats.len() as u32;
        Ok(())
    }

    pub fn release_seats(&mut self, seats: &[String]) {
        let mut released = 0;
        for seat in seats {
            if let Some((r, c)) = self.seat_layout.locate(seat) {
                if self.seat_layout.seat_map[r][c] == SeatState::Booked {
                    self.seat_layout.seat_map[r][c] = SeatState::Available;
                    released += 1;
                }
            }
        }
        self.available_seats = (self.available_seats + released).min(self.total_seats);
    }
}

/// Normalise user-entered seat labels (`" 2b"` -> `"2B"`).
pub fn normalize_seats(seats: &[String]) -> Vec<String> {
    seats
        .iter()
        .map(|s| s.trim().to_ascii_uppercase())
        .collect()
}

/// Seat labels as shown to customers, e.g. for an availability endpoint.
pub fn bookable_seats(layout: &SeatLayout) -> Vec<String> {
    layout.available_labels()
}
