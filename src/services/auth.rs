// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Phone/OTP authentication and profile endpoints.

use crate::error::AppError;
use crate::models::{LoginResponse, User};
use crate::services::api_client::{ApiClient, ApiRequest};
use crate::session::LogoutReason;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SendOtpRequest<'a> {
    phone: &'a str,
}

#[derive(Serialize)]
struct VerifyOtpRequest<'a> {
    phone: &'a str,
    otp: &'a str,
}

/// Acknowledgement from `POST /auth/send-otp`.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpSent {
    #[serde(default)]
    pub message: Option<String>,
    /// Seconds until another OTP may be requested
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// Auth API.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Ask the backend to text an OTP to `phone`.
    pub async fn send_otp(&self, phone: &str) -> Result<OtpSent, AppError> {
        let request = ApiRequest::post("/auth/send-otp")
            .unauthenticated()
            .json(&SendOtpRequest { phone })?;
        let sent = self.api.send(request).await?;
        tracing::info!("OTP requested");
        Ok(sent)
    }

    /// Exchange phone + OTP for tokens and start the session.
    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<User, AppError> {
        let request = ApiRequest::post("/auth/verify-otp")
            .unauthenticated()
            .json(&VerifyOtpRequest { phone, otp })?;
        let login: LoginResponse = self.api.send(request).await?;

        self.api
            .session()
            .begin(&login.credentials(), &login.user)
            .await?;
        Ok(login.user)
    }

    /// Fetch the profile and replace the stored copy.
    pub async fn profile(&self) -> Result<User, AppError> {
        let user: User = self.api.get("/auth/profile").await?;
        self.api.session().store().set_user(&user).await?;
        Ok(user)
    }

    /// Log out on the server (best effort) and clear local credentials.
    ///
    /// The server call never triggers a token refresh, so exactly one
    /// `LoggedOut` event is emitted.
    pub async fn logout(&self) -> Result<(), AppError> {
        let session = self.api.session();
        if let Some(token) = session.store().access_token().await {
            let request = ApiRequest::post("/auth/logout")
                .unauthenticated()
                .bearer(token);
            let result: Result<serde_json::Value, AppError> = self.api.send(request).await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        session.end(LogoutReason::UserRequested).await
    }
}
