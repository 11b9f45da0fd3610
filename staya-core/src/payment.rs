use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staya_shared::Currency;

/// A single charge against a booking total
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub booking_reference: String,
    pub amount: f64,
    pub currency: Currency,
    /// Opaque token from the client-side payment widget.
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ChargeOutcome {
    Approved { payment_id: String },
    Declined { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, PaymentError>;

    /// Reverse an approved charge that could not be applied to its booking.
    async fn refund(&self, payment_id: &str) -> Result<(), PaymentError>;
}

/// Stands in for a real provider: approves everything except payment
/// methods carrying the decline marker.
pub struct StubPaymentGateway {
    decline_marker: String,
}

impl StubPaymentGateway {
    pub fn new() -> Self {
        Self {
            decline_marker: "decline".to_string(),
        }
    }
}

impl Default for StubPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, PaymentError> {
        tracing::info!(
            "Charging {} {} for booking {}",
            request.amount,
            request.currency,
            request.booking_reference
        );

        let declined = request
            .payment_method
            .as_deref()
            .is_some_and(|m| m.starts_with(&self.decline_marker));

        if declined {
            return Ok(ChargeOutcome::Declined {
                reason: "Card declined".to_string(),
            });
        }

        Ok(ChargeOutcome::Approved {
            payment_id: format!("pay_{}", Uuid::new_v4().simple()),
        })
    }

    async fn refund(&self, payment_id: &str) -> Result<(), PaymentError> {
        tracing::info!("Refunding payment {}", payment_id);
        Ok(())
    }
}
