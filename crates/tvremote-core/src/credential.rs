//! Pairing credential.

use std::fmt;

/// Opaque client key granted by the device after the first approved pairing.
///
/// Immutable once created. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a client key. Returns `None` for an empty key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    /// Client key text, as presented to the device.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_not_a_credential() {
        assert_eq!(Credential::new(""), None);
        assert_eq!(Credential::new("abc123").map(|c| c.as_str().to_owned()), Some("abc123".into()));
    }

    #[test]
    fn debug_is_redacted() {
        let credential = Credential::new("abc123").unwrap();
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
    }
}
