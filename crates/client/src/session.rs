//! Session context shared between the API client and its callers
//!
//! The session holds the signed-in user and the access/refresh token pair.
//! It is owned by a [`SessionStore`] which is injected into the client, so
//! every client instance (and every test) can work against its own session.

use crate::types::User;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Current authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Role carried in the access token's `role` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

#[derive(Deserialize)]
struct RoleClaim {
    role: Option<Role>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Role claimed by the current access token.
    ///
    /// The payload is decoded without verifying the signature; the backend
    /// remains the authority on what the token may do.
    pub fn role(&self) -> Option<Role> {
        let token = self.access_token.as_deref()?;
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice::<RoleClaim>(&bytes).ok()?.role
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

/// Owner of the process-wide session.
///
/// Only login, logout and a successful token refresh write to the store;
/// everything else reads a snapshot through [`SessionStore::session`].
pub trait SessionStore: Send + Sync {
    /// Snapshot of the current session
    fn session(&self) -> Session;

    /// Replace the access token after a refresh
    fn set_access_token(&self, access_token: String);

    /// Install a freshly authenticated session
    fn set_auth(&self, user: User, access_token: String, refresh_token: String);

    /// Clear user and both tokens
    fn logout(&self);
}

/// In-memory session store; clones share the same session
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a previously persisted session
    pub fn restore(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Apply a mutation and return the resulting session
    pub fn update(&self, f: impl FnOnce(&mut Session)) -> Session {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut session);
        session.clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn session(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_access_token(&self, access_token: String) {
        self.update(|session| session.access_token = Some(access_token));
    }

    fn set_auth(&self, user: User, access_token: String, refresh_token: String) {
        self.update(|session| {
            *session = Session {
                user: Some(user),
                access_token: Some(access_token),
                refresh_token: Some(refresh_token),
            };
        });
    }

    fn logout(&self) {
        self.update(|session| *session = Session::default());
    }
}
