//! Operator session persistence.
//!
//! The registry keeps the signed-in operator's session as an opaque JSON
//! blob behind a small storage trait, so hosts can back it with whatever
//! keeps state across restarts.

use crate::types::{UserId, UserRole};
use campus_registry_core::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A decoded operator session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    pub token: Uuid,
}

impl Session {
    #[must_use]
    pub fn issue(user_id: UserId, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
            token: Uuid::new_v4(),
        }
    }
}

/// Raw session storage. Values are opaque strings; decoding happens in
/// [`load_session`].
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, raw: String);
    fn clear(&self);
}

/// Process-local token store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.lock().clone()
    }

    fn set(&self, raw: String) {
        *self.lock() = Some(raw);
    }

    fn clear(&self) {
        *self.lock() = None;
    }
}

/// Serialize and persist a session.
pub fn store_session(store: &dyn TokenStore, session: &Session) {
    match serde_json::to_string(session) {
        Ok(raw) => store.set(raw),
        Err(error) => {
            tracing::warn!(%error, "Failed to serialize session, not persisting");
        }
    }
}

/// Load and decode the persisted session, if any.
///
/// A corrupt blob is treated as signed-out: it is logged, cleared and
/// `None` is returned rather than failing the caller.
pub fn load_session(store: &dyn TokenStore) -> Option<Session> {
    let raw = store.get()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(error) => {
            tracing::warn!(%error, "Discarding corrupt session blob");
            store.clear();
            None
        }
    }
}
