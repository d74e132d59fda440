// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated session: the credential store plus a broadcast channel
//! for session lifecycle events.
//!
//! Constructed explicitly and handed to the API client; nothing here is
//! process-global.

use crate::error::AppError;
use crate::models::{Credentials, User};
use crate::store::CredentialStore;
use std::path::Path;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequested,
    /// Token refresh failed; the user has to authenticate again.
    RefreshFailed(String),
}

/// Lifecycle notifications for whoever drives the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: String },
    TokensRefreshed,
    LoggedOut { reason: LogoutReason },
}

/// Shared session handle. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    store: CredentialStore,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(store: CredentialStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// Open a session backed by the credential file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        Ok(Self::new(CredentialStore::open(path).await?))
    }

    /// Session that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::new(CredentialStore::in_memory())
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Subscribe to lifecycle events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.store.is_authenticated().await
    }

    /// Record a successful login.
    pub async fn begin(&self, credentials: &Credentials, user: &User) -> Result<(), AppError> {
        self.store.login(credentials, user).await?;
        tracing::info!(user_id = %user.id, "Session started");
        self.emit(SessionEvent::LoggedIn {
            user_id: user.id.clone(),
        });
        Ok(())
    }

    /// Store a refreshed token pair.
    pub(crate) async fn refreshed(&self, credentials: &Credentials) -> Result<(), AppError> {
        self.store.set_credentials(credentials).await?;
        self.emit(SessionEvent::TokensRefreshed);
        Ok(())
    }

    /// Clear credentials and announce the logout.
    pub async fn end(&self, reason: LogoutReason) -> Result<(), AppError> {
        let cleared = self.store.clear().await;
        tracing::info!(reason = ?reason, "Session ended");
        self.emit(SessionEvent::LoggedOut { reason });
        cleared
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
