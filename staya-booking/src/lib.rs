pub mod models;
pub mod planner;
pub mod reference;

pub use models::{Booking, BookingState, BookingStatus, HotelBooking, PaymentStatus, Stage, TravelBooking};
pub use planner::{plan_hotel_booking, plan_travel_booking, HotelBookingRequest, TravelBookingRequest};
pub use reference::{BookingKind, BookingReference};

use staya_catalog::InventoryError;
use staya_shared::ValidationReport;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(#[from] ValidationReport),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("{0}")]
    Unavailable(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}
