// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated REST client for the booking backend.
//!
//! Handles:
//! - Attaching the stored access token as a bearer header
//! - Single-flight token refresh when the backend answers 401
//! - Replaying the rejected request once with the new token
//! - Unwrapping `{ success, data, message }` response envelopes

use crate::config::Config;
use crate::error::AppError;
use crate::models::Credentials;
use crate::session::{LogoutReason, Session};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// An outgoing API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    authenticated: bool,
    /// Fixed bearer token for requests that bypass the refresh path.
    bearer: Option<String>,
    /// Set once the request has been replayed after a refresh.
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            bearer: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, AppError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Send without a bearer token and never attempt a refresh.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Send this token as-is. Combined with `unauthenticated`, a 401 is
    /// returned to the caller instead of triggering a refresh.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// Outcome of the most recent refresh, handed to requests that waited on it.
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Refreshed { access_token: String },
    NoRefreshToken,
    Failed(String),
}

impl RefreshOutcome {
    fn into_result(self) -> Result<String, AppError> {
        match self {
            RefreshOutcome::Refreshed { access_token } => Ok(access_token),
            RefreshOutcome::NoRefreshToken => Err(AppError::NoRefreshToken),
            RefreshOutcome::Failed(msg) => Err(AppError::RefreshFailed(msg)),
        }
    }
}

/// Serializes token refreshes.
///
/// `epoch` counts completed refreshes. A request remembers the epoch it was
/// sent under; if the epoch has moved by the time it holds the lock,
/// someone else already refreshed and the stored outcome is reused.
/// `tokio::sync::Mutex` is fair, so waiters are released in arrival order.
#[derive(Default)]
struct RefreshGate {
    epoch: AtomicU64,
    last: Mutex<Option<RefreshOutcome>>,
}

/// Token pair returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    /// Some deployments only rotate the access token.
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Booking backend client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    gate: Arc<RefreshGate>,
}

impl ApiClient {
    /// Create a client for the backend named in `config`.
    pub fn new(config: &Config, session: Session) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http(http, &config.api_base_url, session))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, base_url: &str, session: Session) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            gate: Arc::new(RefreshGate::default()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Convenience Wrappers ────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    /// Send a request and decode the (unwrapped) response body.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, AppError> {
        let path = request.path.clone();
        let body = self.execute(request).await?;
        serde_json::from_value(unwrap_envelope(body)?).map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Unexpected response shape");
            AppError::Decode(format!("{}: {}", path, e))
        })
    }

    // ─── Interception ────────────────────────────────────────────

    /// Run a request through the auth interceptor and return the raw JSON body.
    ///
    /// A 401 on an authenticated, not-yet-retried request triggers (or waits
    /// for) a refresh, then the request is replayed exactly once.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, AppError> {
        let seen_epoch = self.gate.epoch.load(Ordering::Acquire);
        let token = if request.authenticated {
            self.session.store().access_token().await
        } else {
            None
        };

        let response = self.dispatch(&request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !request.authenticated {
            return check_response_json(response).await;
        }
        if request.retried {
            return Err(AppError::Unauthorized);
        }

        tracing::info!(path = %request.path, "Access token rejected, refreshing");
        let replayed = self.replay(request, seen_epoch).await?;

        if replayed.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                path = %replayed.url().path(),
                "Request rejected again after token refresh"
            );
            return Err(AppError::Unauthorized);
        }
        check_response_json(replayed).await
    }

    /// Refresh (at most once per epoch) and resend `request` with the new token.
    ///
    /// The gate stays held until the replay has been answered, so replays
    /// reach the server in the order their 401s queued on the gate.
    async fn replay(
        &self,
        mut request: ApiRequest,
        seen_epoch: u64,
    ) -> Result<reqwest::Response, AppError> {
        let mut last = self.gate.last.lock().await;

        let outcome = if self.gate.epoch.load(Ordering::Acquire) != seen_epoch {
            // A refresh finished after this request went out; reuse its result.
            tracing::debug!("Reusing result of concurrent token refresh");
            last.clone().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Refresh epoch advanced without an outcome"))
            })?
        } else {
            let outcome = self.refresh_tokens().await;
            *last = Some(outcome.clone());
            self.gate.epoch.fetch_add(1, Ordering::AcqRel);
            outcome
        };
        let access_token = outcome.into_result()?;

        request.retried = true;
        let response = self.dispatch(&request, Some(&access_token)).await;
        drop(last);
        response
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Any failure ends the session.
    async fn refresh_tokens(&self) -> RefreshOutcome {
        let store = self.session.store();

        let Some(refresh_token) = store.refresh_token().await else {
            tracing::warn!("Access token rejected and no refresh token stored");
            self.end_session("no refresh token".to_string()).await;
            return RefreshOutcome::NoRefreshToken;
        };

        match self.request_refresh(&refresh_token).await {
            Ok(credentials) => {
                if let Err(e) = self.session.refreshed(&credentials).await {
                    // The new tokens still work for this process.
                    tracing::error!(error = %e, "Failed to persist refreshed tokens");
                }
                tracing::info!("Token refreshed");
                RefreshOutcome::Refreshed {
                    access_token: credentials.access_token,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, logging out");
                let msg = e.to_string();
                self.end_session(msg.clone()).await;
                RefreshOutcome::Failed(msg)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<Credentials, AppError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .unauthenticated()
            .json(&RefreshRequest { refresh_token })?;
        let response = self.dispatch(&request, None).await?;
        let body = unwrap_envelope(check_response_json(response).await?)?;
        let tokens: RefreshResponse = serde_json::from_value(body)?;

        Ok(Credentials {
            access_token: tokens.access_token,
            refresh_token: tokens
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
        })
    }

    async fn end_session(&self, reason: String) {
        if let Err(e) = self.session.end(LogoutReason::RefreshFailed(reason)).await {
            tracing::error!(error = %e, "Failed to clear credentials after refresh failure");
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token.or(request.bearer.as_deref()) {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            retried = request.retried,
            "Sending request"
        );

        builder
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json(response: reqwest::Response) -> Result<Value, AppError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_default();
        tracing::debug!(status = %status, message = %message, "Request failed");
        return Err(AppError::Api { status, message });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Transport(e.to_string()))?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull a human-readable message out of an error body.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Strip a `{ success, data, message }` envelope if present.
///
/// Only objects carrying a `success` flag are treated as envelopes, so
/// payloads that merely have a `data` field pass through untouched.
pub(crate) fn unwrap_envelope(value: Value) -> Result<Value, AppError> {
    let Value::Object(mut map) = value else {
        return Ok(value);
    };

    match map.get("success") {
        Some(Value::Bool(false)) => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Err(AppError::Api {
                status: StatusCode::OK,
                message,
            })
        }
        Some(Value::Bool(true)) => Ok(map.remove("data").unwrap_or(Value::Null)),
        _ => Ok(Value::Object(map)),
    }
}
