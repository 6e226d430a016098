//! Identity token slot
//!
//! Written once by the entry point after login, read at the start of every turn.
//! Sub-agents never read it directly: the token travels down in
//! [`InvocationContext`](super::InvocationContext).

use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token, if a non-empty one has been set
    pub fn get_token(&self) -> Option<String> {
        // A poisoned lock still holds a valid Option<String>
        let guard = self.slot.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().filter(|t| !t.trim().is_empty()).cloned()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
    }

    pub fn clear(&self) {
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}
