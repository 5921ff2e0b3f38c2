use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::CredentialStore;
use crate::{Credential, CredentialError};

const LOCATION: &str = "memory";

/// In-memory credential store for testing and simulation
///
/// Clones share the same state. Every successful save is recorded so tests
/// can assert on how often (and with what) the handshake persisted. Loads and
/// saves can be made to fail to exercise the error policy.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    credential: Option<Credential>,
    saves: Vec<Credential>,
    fail_loads: bool,
    fail_saves: bool,
}

impl MemoryCredentialStore {
    /// Create an empty store (device not paired).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        let store = Self::new();
        store.lock().credential = Some(credential);
        store
    }

    /// Make every subsequent load fail.
    #[must_use]
    pub fn failing_loads(self) -> Self {
        self.lock().fail_loads = true;
        self
    }

    /// Make every subsequent save fail.
    #[must_use]
    pub fn failing_saves(self) -> Self {
        self.lock().fail_saves = true;
        self
    }

    /// Credentials passed to successful `save` calls, oldest first.
    pub fn saves(&self) -> Vec<Credential> {
        self.lock().saves.clone()
    }

    /// Currently stored credential.
    pub fn current(&self) -> Option<Credential> {
        self.lock().credential.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let inner = self.lock();
        if inner.fail_loads {
            return Err(CredentialError::Read {
                location: LOCATION.to_string(),
                reason: "injected load failure".to_string(),
            });
        }
        Ok(inner.credential.clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        let mut inner = self.lock();
        if inner.fail_saves {
            return Err(CredentialError::Write {
                location: LOCATION.to_string(),
                reason: "injected save failure".to_string(),
            });
        }
        inner.credential = Some(credential.clone());
        inner.saves.push(credential.clone());
        Ok(())
    }

    fn location(&self) -> String {
        LOCATION.to_string()
    }
}
