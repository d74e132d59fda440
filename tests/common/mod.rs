// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use ride_booking_client::config::Config;
use ride_booking_client::models::{Credentials, User};
use ride_booking_client::services::ApiClient;
use ride_booking_client::session::Session;
use serde_json::json;
use std::time::Duration;
use wiremock::MockServer;

pub const OLD_ACCESS: &str = "access-old";
pub const OLD_REFRESH: &str = "refresh-old";
pub const NEW_ACCESS: &str = "access-new";
pub const NEW_REFRESH: &str = "refresh-new";

/// Config pointing every backend at the mock server.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    Config {
        api_base_url: format!("{}/api", server.uri()),
        geocoder_base_url: server.uri(),
        router_base_url: server.uri(),
        request_timeout: Duration::from_secs(5),
        ..Config::test_default()
    }
}

#[allow(dead_code)]
pub fn test_user() -> User {
    serde_json::from_value(json!({
        "id": "u-1",
        "name": "Asha",
        "phone": "+919800000001",
        "role": "customer"
    }))
    .expect("valid user")
}

/// In-memory session logged in with the "old" token pair.
#[allow(dead_code)]
pub async fn logged_in_session() -> Session {
    let session = Session::in_memory();
    session
        .begin(
            &Credentials {
                access_token: OLD_ACCESS.to_string(),
                refresh_token: OLD_REFRESH.to_string(),
            },
            &test_user(),
        )
        .await
        .expect("login should succeed");
    session
}

/// API client for the mock server with a logged-in session.
#[allow(dead_code)]
pub async fn test_client(server: &MockServer) -> ApiClient {
    ApiClient::new(&test_config(server), logged_in_session().await).expect("client builds")
}

#[allow(dead_code)]
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
