use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use super::CredentialStore;
use crate::{Credential, CredentialError};

/// Credential persisted as a single text file.
///
/// Surrounding whitespace is ignored on load, so a hand-edited file with a
/// trailing newline still works. Saves go through a sibling temporary file
/// that is renamed into place.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Well-known credential location, relative to the working directory.
    pub const DEFAULT_PATH: &'static str = "./client-key.txt";

    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CredentialError::Read { location: self.location(), reason: e.to_string() });
            },
        };

        let text = String::from_utf8(bytes)
            .map_err(|_| CredentialError::Encoding { location: self.location() })?;

        Ok(Credential::new(text.trim()))
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        let temp = self.temp_path();
        let write_err =
            |e: io::Error| CredentialError::Write { location: self.location(), reason: e.to_string() };

        fs::write(&temp, credential.as_str()).map_err(write_err)?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(write_err(e));
        }

        tracing::debug!(path = %self.path.display(), "credential saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
