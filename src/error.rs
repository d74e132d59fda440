// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error type shared by the store, HTTP client and API wrappers.

use reqwest::StatusCode;

/// Generic message shown when the server gave us nothing better.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 401 on a request that has already been retried after a refresh.
    #[error("Authentication required")]
    Unauthorized,

    #[error("No refresh token stored")]
    NoRefreshToken,

    /// Refresh failed; the session is over and the user must log in again.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("API error ({status}): {message}")]
    Api {
        status: StatusCode,
        message: String,
    },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True if this error ends the authenticated session.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized | AppError::NoRefreshToken | AppError::RefreshFailed(_)
        )
    }

    /// True if the failure happened before we got a response, so the
    /// user can simply try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Transport(_) => true,
            AppError::Api { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Message to show the user: the server's own message when it sent
    /// one, otherwise a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Unauthorized | AppError::NoRefreshToken | AppError::RefreshFailed(_) => {
                "Your session has expired. Please log in again.".to_string()
            }
            AppError::Transport(_) => {
                "Unable to reach the server. Check your connection and retry.".to_string()
            }
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
