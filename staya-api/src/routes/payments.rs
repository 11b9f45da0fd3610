use axum::{extract::State, routing::post, Router};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use staya_booking::{Booking, BookingStatus, PaymentStatus};
use staya_core::payment::{ChargeOutcome, ChargeRequest};

use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::middleware::Principal;
use crate::response::Envelope;
use crate::routes::bookings::owned_booking;
use crate::routes::signed_in;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new().route("/", signed_in(post(pay_for_booking), &state))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest {
    #[validate(length(min = 1, message = "Please provide a booking reference"))]
    booking_reference: String,
    payment_method: Option<String>,
}

async fn pay_for_booking(
    State(state): State<AppState>,
    Principal { user }: Principal,
    ValidatedJson(request): ValidatedJson<PaymentRequest>,
) -> Result<Envelope<Booking>, AppError> {
    let mut booking = owned_booking(&state, &request.booking_reference, &user).await?;

    let current = booking.state();
    if current.status != BookingStatus::Pending || current.payment_status != PaymentStatus::Pending {
        return Err(AppError::BadRequest("This booking is not awaiting payment".to_string()));
    }
    let from = current.stage();

    let charge = ChargeRequest {
        booking_reference: current.booking_reference.to_string(),
        amount: current.total_amount,
        currency: current.currency,
        payment_method: request.payment_method,
    };

    match state.payments.charge(&charge).await? {
        ChargeOutcome::Approved { payment_id } => {
            booking.state_mut().confirm_payment(payment_id.clone(), Utc::now())?;
            if let Err(e) = state.bookings.update_state(&booking, from).await {
                // Cancelled (or paid) while the charge was in flight; give the money back.
                tracing::warn!("Booking {} changed during payment, refunding {}", booking.reference(), payment_id);
                state.payments.refund(&payment_id).await?;
                return Err(e.into());
            }
            tracing::info!("Payment captured for booking {}", booking.reference());
            Ok(Envelope::ok(booking).with_message("Payment successful"))
        }
        ChargeOutcome::Declined { reason } => {
            booking.state_mut().fail_payment(Utc::now())?;
            state.bookings.update_state(&booking, from).await?;
            tracing::warn!("Payment declined for booking {}: {}", booking.reference(), reason);
            Err(AppError::PaymentDeclined(reason))
        }
    }
}
