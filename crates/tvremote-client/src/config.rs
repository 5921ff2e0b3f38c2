//! Client configuration.

use std::{fs, path::PathBuf, time::Duration};

use serde_json::Value;
use tvremote_core::FileCredentialStore;
use tvremote_proto::RegisterPayload;

use crate::ClientError;

/// Secure WebSocket port of the device's remote-control service.
pub const DEFAULT_PORT: u16 = 3001;

/// Default limit for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to connect, pair and issue the initial command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Device host name or IP address
    pub host: String,
    /// Device port
    pub port: u16,
    /// Where the pairing credential is persisted
    pub credential_path: PathBuf,
    /// Pairing manifest overriding the embedded default
    pub manifest_path: Option<PathBuf>,
    /// Open the service menu once paired
    pub send_service_menu: bool,
    /// Limit for establishing the connection
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            credential_path: PathBuf::from(FileCredentialStore::DEFAULT_PATH),
            manifest_path: None,
            send_service_menu: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Device URL, `wss://HOST:PORT/`. Bare IPv6 literals are bracketed.
    pub fn url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("wss://[{}]:{}/", self.host, self.port)
        } else {
            format!("wss://{}:{}/", self.host, self.port)
        }
    }

    /// Credential store at the configured path.
    pub fn credential_store(&self) -> FileCredentialStore {
        FileCredentialStore::new(&self.credential_path)
    }

    /// Registration template: the manifest file if configured, else the
    /// embedded manifest.
    ///
    /// # Errors
    ///
    /// - `ClientError::Config` if the manifest file is unreadable or not JSON
    /// - `ClientError::Decode` if the embedded manifest is corrupt
    pub fn register_payload(&self) -> Result<RegisterPayload, ClientError> {
        let Some(path) = &self.manifest_path else {
            return Ok(RegisterPayload::with_default_manifest()?);
        };

        let text = fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read manifest {}: {e}", path.display()))
        })?;
        let manifest: Value = serde_json::from_str(&text).map_err(|e| {
            ClientError::Config(format!("manifest {} is not valid JSON: {e}", path.display()))
        })?;

        Ok(RegisterPayload::new(manifest))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn with_host(host: &str) -> ClientConfig {
        ClientConfig { host: host.to_string(), ..Default::default() }
    }

    #[test]
    fn url_formats() {
        assert_eq!(with_host("192.168.1.20").url(), "wss://192.168.1.20:3001/");
        assert_eq!(with_host("tv.local").url(), "wss://tv.local:3001/");
        assert_eq!(with_host("fe80::1").url(), "wss://[fe80::1]:3001/");
        assert_eq!(with_host("[fe80::1]").url(), "wss://[fe80::1]:3001/");
    }

    #[test]
    fn embedded_manifest_by_default() {
        let payload = ClientConfig::default().register_payload().unwrap();

        assert!(payload.manifest().is_object());
        assert_eq!(payload.client_key(), None);
    }

    #[test]
    fn manifest_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, r#"{"appId":"custom"}"#).unwrap();
        let config = ClientConfig { manifest_path: Some(path), ..Default::default() };

        let payload = config.register_payload().unwrap();

        assert_eq!(payload.manifest(), &json!({"appId": "custom"}));
    }

    #[test]
    fn bad_manifest_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{").unwrap();

        let bad_json = ClientConfig { manifest_path: Some(path), ..Default::default() };
        let missing = ClientConfig {
            manifest_path: Some(dir.path().join("absent.json")),
            ..Default::default()
        };

        assert!(matches!(bad_json.register_payload(), Err(ClientError::Config(_))));
        assert!(matches!(missing.register_payload(), Err(ClientError::Config(_))));
    }
}
