// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store with typed operations.
//!
//! Holds:
//! - Access and refresh tokens
//! - The logged-in user's profile
//!
//! State lives in memory behind a mutex and, when opened from a path, is
//! written through to a small JSON key-value file after every mutation.

use crate::error::AppError;
use crate::models::{AuthState, Credentials, User};
use crate::store::keys;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persisted credential store.
#[derive(Clone)]
pub struct CredentialStore {
    /// Backing file; `None` keeps everything in memory.
    path: Option<PathBuf>,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl CredentialStore {
    /// Open (or create) a store persisted at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    // A corrupt file is treated as logged out rather than fatal.
                    tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable credential file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            has_tokens = entries.contains_key(keys::AUTH_TOKEN),
            "Opened credential store"
        );

        Ok(Self {
            path: Some(path),
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    /// Create a store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    // ─── Tokens ──────────────────────────────────────────────────

    /// Both tokens, if a complete pair is stored.
    pub async fn credentials(&self) -> Option<Credentials> {
        let entries = self.entries.lock().await;
        Some(Credentials {
            access_token: entries.get(keys::AUTH_TOKEN)?.clone(),
            refresh_token: entries.get(keys::REFRESH_TOKEN)?.clone(),
        })
    }

    pub async fn access_token(&self) -> Option<String> {
        self.entries.lock().await.get(keys::AUTH_TOKEN).cloned()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.entries.lock().await.get(keys::REFRESH_TOKEN).cloned()
    }

    /// Replace the stored token pair.
    pub async fn set_credentials(&self, credentials: &Credentials) -> Result<(), AppError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            keys::AUTH_TOKEN.to_string(),
            credentials.access_token.clone(),
        );
        entries.insert(
            keys::REFRESH_TOKEN.to_string(),
            credentials.refresh_token.clone(),
        );
        self.persist(&entries).await
    }

    // ─── Session State ───────────────────────────────────────────

    pub async fn auth_state(&self) -> AuthState {
        let entries = self.entries.lock().await;
        read_auth_state(&entries)
    }

    pub async fn user(&self) -> Option<User> {
        self.auth_state().await.user
    }

    /// Logged in means a token pair is present and the state says so.
    pub async fn is_authenticated(&self) -> bool {
        let entries = self.entries.lock().await;
        entries.contains_key(keys::AUTH_TOKEN)
            && entries.contains_key(keys::REFRESH_TOKEN)
            && read_auth_state(&entries).is_authenticated
    }

    /// Store tokens and profile after a successful login.
    pub async fn login(&self, credentials: &Credentials, user: &User) -> Result<(), AppError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            keys::AUTH_TOKEN.to_string(),
            credentials.access_token.clone(),
        );
        entries.insert(
            keys::REFRESH_TOKEN.to_string(),
            credentials.refresh_token.clone(),
        );
        write_auth_state(
            &mut entries,
            &AuthState {
                user: Some(user.clone()),
                is_authenticated: true,
            },
        )?;
        self.persist(&entries).await
    }

    /// Replace the stored profile wholesale.
    pub async fn set_user(&self, user: &User) -> Result<(), AppError> {
        let mut entries = self.entries.lock().await;
        let mut state = read_auth_state(&entries);
        state.user = Some(user.clone());
        write_auth_state(&mut entries, &state)?;
        self.persist(&entries).await
    }

    /// Remove tokens and profile, leaving a logged-out store.
    pub async fn clear(&self) -> Result<(), AppError> {
        let mut entries = self.entries.lock().await;
        entries.remove(keys::AUTH_TOKEN);
        entries.remove(keys::REFRESH_TOKEN);
        write_auth_state(&mut entries, &AuthState::default())?;
        self.persist(&entries).await
    }

    /// Write the current entries through to disk (temp file + rename).
    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;

        Ok(())
    }
}

fn read_auth_state(entries: &BTreeMap<String, String>) -> AuthState {
    entries
        .get(keys::AUTH_STATE)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default()
}

fn write_auth_state(
    entries: &mut BTreeMap<String, String>,
    state: &AuthState,
) -> Result<(), AppError> {
    entries.insert(keys::AUTH_STATE.to_string(), serde_json::to_string(state)?);
    Ok(())
}
