//! Persisted client-side storage.

pub mod credentials;

pub use credentials::CredentialStore;

/// Key names in the persisted key-value file.
pub mod keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    /// Serialized `AuthState` (user profile + logged-in flag)
    pub const AUTH_STATE: &str = "auth_state";
}
