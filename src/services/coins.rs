// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coin wallet endpoints.

use crate::error::AppError;
use crate::models::{CoinBalance, CoinTransaction, CoinTransferRequest, CoinTransferResult, Page};
use crate::services::api_client::{ApiClient, ApiRequest};
use crate::services::booking::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

/// Coins API.
#[derive(Clone)]
pub struct CoinService {
    api: ApiClient,
}

impl CoinService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn balance(&self) -> Result<CoinBalance, AppError> {
        self.api.get("/coins/balance").await
    }

    pub async fn history(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Page<CoinTransaction>, AppError> {
        let request = ApiRequest::get("/coins/history")
            .query("page", page.unwrap_or(DEFAULT_PAGE))
            .query("limit", limit.unwrap_or(DEFAULT_PAGE_SIZE));
        self.api.send(request).await
    }

    pub async fn transfer(
        &self,
        recipient_phone: &str,
        amount: f64,
        note: Option<&str>,
    ) -> Result<CoinTransferResult, AppError> {
        let body = CoinTransferRequest {
            recipient_phone: recipient_phone.to_string(),
            amount,
            note: note.map(str::to_string),
        };
        let result: CoinTransferResult = self.api.post("/coins/transfer", &body).await?;
        tracing::info!(amount, "Coins transferred");
        Ok(result)
    }
}
