//! Credential storage abstraction
//!
//! Trait-based abstraction for persisting the single pairing credential. The
//! trait is synchronous: the credential is a few bytes read once per session
//! and written at most once.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::{Credential, CredentialError};

/// Load/save capability for the pairing credential.
///
/// Absence is not an error: `load` returns `Ok(None)` when the device has not
/// been paired yet.
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential.
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Persist `credential`, replacing any previous one.
    ///
    /// # Invariants
    ///
    /// - Post: a subsequent `load` returns `credential`
    fn save(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
