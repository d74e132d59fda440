//! Coin wallet models.

use serde::{Deserialize, Serialize};

/// Current coin balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinBalance {
    #[serde(alias = "coins")]
    pub balance: f64,
    #[serde(default)]
    pub rupee_value: Option<f64>,
}

/// One ledger entry from `GET /coins/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransaction {
    #[serde(alias = "_id", deserialize_with = "super::de::string_or_number")]
    pub id: String,
    /// `credit` or `debit`
    #[serde(rename = "type", alias = "transaction_type")]
    pub kind: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /coins/transfer`.
#[derive(Debug, Clone, Serialize)]
pub struct CoinTransferRequest {
    pub recipient_phone: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of a coin transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransferResult {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub new_balance: Option<f64>,
}
