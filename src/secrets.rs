//! One-shot storage for freshly issued client secrets.
//!
//! After issuance the plaintext secret is parked here, keyed by the caller
//! and the token, so the caller's next retrieve can show it once. Taking a
//! slot removes it; a second retrieve sees nothing. The vault is held in
//! [`crate::AppState`] and passed explicitly to the handlers that need it.

use crate::types::{ApiTokenId, UserId};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SecretVault {
    slots: Arc<DashMap<(UserId, ApiTokenId), String>>,
}

impl SecretVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a plaintext secret for a single later disclosure.
    ///
    /// A second stash for the same (caller, token) pair replaces the first;
    /// in practice issuance is the only writer and token ids are fresh.
    pub fn stash(&self, caller: UserId, token: ApiTokenId, secret: String) {
        self.slots.insert((caller, token), secret);
    }

    /// Consume the slot, returning the secret if it was still unclaimed.
    /// Removal and retrieval are a single map operation, so two concurrent
    /// takers cannot both see the secret.
    pub fn take(&self, caller: UserId, token: ApiTokenId) -> Option<String> {
        self.slots.remove(&(caller, token)).map(|(_, secret)| secret)
    }
}
