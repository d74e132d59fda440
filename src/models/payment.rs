//! Payment models, including the gateway web-view bridge messages.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the customer pays for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Online,
}

/// Gateway order created by `POST /payment/create-order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    #[serde(alias = "id")]
    pub order_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Public gateway key the checkout page is opened with
    #[serde(default)]
    pub key: Option<String>,
}

fn default_currency() -> String {
    "INR".to_string()
}

/// Body of `POST /payment/create-order`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub booking_id: String,
    pub amount: f64,
}

/// Gateway proof of payment, forwarded to `POST /payment/verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub booking_id: String,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Server verdict on a verification or cash confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Message posted by the checkout web view back to the app.
///
/// Wire format: `{"type": "PAYMENT_SUCCESS", "data": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayMessage {
    PaymentSuccess(GatewaySuccess),
    PaymentFailed(Option<Value>),
    PaymentCancelled(Option<Value>),
}

/// Fields the gateway hands back on success.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewaySuccess {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Deserialize)]
struct BridgeEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

impl GatewayMessage {
    /// Parse a raw bridge message.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let envelope: BridgeEnvelope = serde_json::from_str(raw)?;
        match envelope.kind.as_str() {
            "PAYMENT_SUCCESS" => {
                let data = envelope.data.ok_or_else(|| {
                    AppError::Decode("PAYMENT_SUCCESS without data".to_string())
                })?;
                Ok(GatewayMessage::PaymentSuccess(serde_json::from_value(data)?))
            }
            "PAYMENT_FAILED" => Ok(GatewayMessage::PaymentFailed(envelope.data)),
            "PAYMENT_CANCELLED" => Ok(GatewayMessage::PaymentCancelled(envelope.data)),
            other => Err(AppError::Decode(format!(
                "unknown payment bridge message: {}",
                other
            ))),
        }
    }

    /// Failure description carried by a `PAYMENT_FAILED` message, if any.
    pub fn failure_reason(&self) -> Option<String> {
        let GatewayMessage::PaymentFailed(Some(data)) = self else {
            return None;
        };
        data.get("description")
            .or_else(|| data.get("message"))
            .or_else(|| data.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}
