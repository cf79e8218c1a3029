use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Processing,
    Succeeded,
    Failed,
}

/// Outcome reported by the payment collaborator for a booking.
///
/// The reservation core records these against the booking but never drives
/// the payment flow itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub booking_id: Uuid,
    pub provider_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub reported_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Ask the provider to collect the given amount for a booking.
    /// The definitive outcome arrives later through the webhook.
    async fn request_charge(
        &self,
        booking_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Retrieve the provider's view of a charge.
    async fn charge_status(
        &self,
        provider_reference: &str,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct MockPaymentAdapter;

#[async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn request_charge(
        &self,
        booking_id: Uuid,
        _amount: Decimal,
        _currency: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        // Encode the booking id so the mock can "remember" it
        Ok(format!("mock_ch_{}", booking_id.simple()))
    }

    async fn charge_status(
        &self,
        provider_reference: &str,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        if provider_reference.starts_with("mock_ch_") {
            Ok(PaymentStatus::Succeeded)
        } else {
            Ok(PaymentStatus::Failed)
        }
    }
}
