use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staya_shared::{ContactDetails, Currency};

use crate::reference::{BookingKind, BookingReference};
use crate::BookingError;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Where a booking sits in its lifecycle. State writes are conditional on
/// the stored booking still being at the stage the caller read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

/// Reference, money and lifecycle fields common to both booking kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingState {
    pub booking_reference: BookingReference,
    pub total_amount: f64,
    pub currency: Currency,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingState {
    pub fn new(kind: BookingKind, total_amount: f64, currency: Currency, now: DateTime<Utc>) -> Self {
        Self {
            booking_reference: BookingReference::generate(kind, now),
            total_amount,
            currency,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn stage(&self) -> Stage {
        Stage {
            status: self.status,
            payment_status: self.payment_status,
        }
    }

    /// Replace the reference after a uniqueness collision.
    pub fn reissue_reference(&mut self, now: DateTime<Utc>) {
        let kind = self.booking_reference.kind();
        self.booking_reference = BookingReference::generate(kind, now);
    }

    /// Transition: pending/pending → confirmed/paid
    pub fn confirm_payment(&mut self, payment_id: String, now: DateTime<Utc>) -> Result<(), BookingError> {
        if self.status != BookingStatus::Pending || self.payment_status != PaymentStatus::Pending {
            return Err(self.invalid("paid"));
        }
        self.status = BookingStatus::Confirmed;
        self.payment_status = PaymentStatus::Paid;
        self.payment_id = Some(payment_id);
        self.updated_at = now;
        Ok(())
    }

    /// Transition: payment pending → failed. The booking itself stays pending.
    pub fn fail_payment(&mut self, now: DateTime<Utc>) -> Result<(), BookingError> {
        if self.status != BookingStatus::Pending || self.payment_status != PaymentStatus::Pending {
            return Err(self.invalid("failed"));
        }
        self.payment_status = PaymentStatus::Failed;
        self.updated_at = now;
        Ok(())
    }

    /// Transition: confirmed → completed
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), BookingError> {
        if self.status != BookingStatus::Confirmed {
            return Err(self.invalid("completed"));
        }
        self.status = BookingStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Transition: pending|confirmed → cancelled. A paid booking is refunded.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), BookingError> {
        if !matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed) {
            return Err(self.invalid("cancelled"));
        }
        self.status = BookingStatus::Cancelled;
        if self.payment_status == PaymentStatus::Paid {
            self.payment_status = PaymentStatus::Refunded;
        }
        self.updated_at = now;
        Ok(())
    }

    fn invalid(&self, to: &str) -> BookingError {
        BookingError::InvalidTransition {
            from: format!("{}/{}", self.status.as_str(), self.payment_status.as_str()),
            to: to.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotelBooking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hotel_id: Uuid,
    pub room_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub nights: u32,
    pub guests: u32,
    pub guest_details: ContactDetails,
    pub special_requests: Option<String>,
    #[serde(flatten)]
    pub state: BookingState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TravelBooking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub route_id: Uuid,
    pub travel_date: NaiveDate,
    pub passengers: u32,
    pub seat_numbers: Vec<String>,
    pub passenger_details: Vec<ContactDetails>,
    #[serde(flatten)]
    pub state: BookingState,
}

/// Either kind of booking, as returned by lookups across both collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Booking {
    Hotel(HotelBooking),
    Travel(TravelBooking),
}

impl Booking {
    pub fn kind(&self) -> BookingKind {
        match self {
            Booking::Hotel(_) => BookingKind::Hotel,
            Booking::Travel(_) => BookingKind::Travel,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Booking::Hotel(b) => b.id,
            Booking::Travel(b) => b.id,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            Booking::Hotel(b) => b.user_id,
            Booking::Travel(b) => b.user_id,
        }
    }

    pub fn state(&self) -> &BookingState {
        match self {
            Booking::Hotel(b) => &b.state,
            Booking::Travel(b) => &b.state,
        }
    }

    pub fn state_mut(&mut self) -> &mut BookingState {
        match self {
            Booking::Hotel(b) => &mut b.state,
            Booking::Travel(b) => &mut b.state,
        }
    }

    pub fn reference(&self) -> &BookingReference {
        &self.state().booking_reference
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.state().created_at
    }
}

impl From<HotelBooking> for Booking {
    fn from(value: HotelBooking) -> Self {
        Booking::Hotel(value)
    }
}

impl From<TravelBooking> for Booking {
    fn from(value: TravelBooking) -> Self {
        Booking::Travel(value)
    }
}
