// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment endpoints and gateway checkout handling.
//!
//! Online payments run in three steps:
//! 1. Create a gateway order on the backend
//! 2. Open the gateway checkout (web view) with that order
//! 3. Forward the gateway's success message to the backend for verification

use crate::error::AppError;
use crate::models::{
    CreateOrderRequest, GatewayMessage, PaymentOrder, PaymentReceipt, PaymentVerification,
};
use crate::services::api_client::ApiClient;
use serde::Serialize;

#[derive(Serialize)]
struct CashPaymentRequest<'a> {
    booking_id: &'a str,
}

/// Final state of a checkout attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Paid(PaymentReceipt),
    Failed(String),
    Cancelled,
}

/// Payment API.
#[derive(Clone)]
pub struct PaymentService {
    api: ApiClient,
}

impl PaymentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_order(
        &self,
        booking_id: &str,
        amount: f64,
    ) -> Result<PaymentOrder, AppError> {
        let body = CreateOrderRequest {
            booking_id: booking_id.to_string(),
            amount,
        };
        let order: PaymentOrder = self.api.post("/payment/create-order", &body).await?;
        tracing::info!(booking_id, order_id = %order.order_id, "Payment order created");
        Ok(order)
    }

    pub async fn verify(
        &self,
        verification: &PaymentVerification,
    ) -> Result<PaymentReceipt, AppError> {
        self.api.post("/payment/verify", verification).await
    }

    /// Record that the booking will be paid in cash.
    pub async fn confirm_cash(&self, booking_id: &str) -> Result<PaymentReceipt, AppError> {
        self.api
            .post("/payment/cash", &CashPaymentRequest { booking_id })
            .await
    }

    /// Act on a message posted by the checkout web view.
    ///
    /// Success is only final once the backend verifies the signature.
    pub async fn complete_checkout(
        &self,
        booking_id: &str,
        message: GatewayMessage,
    ) -> Result<CheckoutOutcome, AppError> {
        match message {
            GatewayMessage::PaymentSuccess(success) => {
                let verification = PaymentVerification {
                    booking_id: booking_id.to_string(),
                    order_id: success.order_id,
                    payment_id: success.payment_id,
                    signature: success.signature,
                };
                let receipt = self.verify(&verification).await?;
                if receipt.verified {
                    tracing::info!(booking_id, "Payment verified");
                    Ok(CheckoutOutcome::Paid(receipt))
                } else {
                    let reason = receipt
                        .message
                        .unwrap_or_else(|| "Payment verification failed".to_string());
                    tracing::warn!(booking_id, reason = %reason, "Payment not verified");
                    Ok(CheckoutOutcome::Failed(reason))
                }
            }
            failed @ GatewayMessage::PaymentFailed(_) => {
                let reason = failed
                    .failure_reason()
                    .unwrap_or_else(|| "Payment failed".to_string());
                tracing::warn!(booking_id, reason = %reason, "Gateway reported failure");
                Ok(CheckoutOutcome::Failed(reason))
            }
            GatewayMessage::PaymentCancelled(_) => {
                tracing::info!(booking_id, "Checkout cancelled by user");
                Ok(CheckoutOutcome::Cancelled)
            }
        }
    }
}
