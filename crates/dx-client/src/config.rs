//! Client configuration.
//!
//! The client never retries. Timeouts are off unless set here; they belong to
//! the transport, so they are configured explicitly rather than assumed.

use std::path::Path;
use std::time::Duration;

use dx_common::{DxError, DxResult};
use dx_protocol::DEFAULT_API_ROOT;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Connection settings for a data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service address, e.g. `http://127.0.0.1:8002`. A bare `host:port` is
    /// taken as plain HTTP.
    pub base_url: String,
    /// Path prefix of every route.
    #[serde(default = "default_api_root")]
    pub api_root: String,
    /// Whole-request timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Connection establishment timeout in milliseconds.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_string()
}

/// Milliseconds in `d`, rounding a non-zero sub-millisecond duration up to 1.
fn whole_millis(d: Duration) -> u64 {
    let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 && !d.is_zero() {
        1
    } else {
        ms
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_root: default_api_root(),
            timeout_ms: None,
            connect_timeout_ms: None,
        }
    }

    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(whole_millis(timeout));
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(whole_millis(timeout));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Base URL with a scheme.
    pub fn normalized_base_url(&self) -> String {
        let trimmed = self.base_url.trim();
        if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> DxResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| DxError::Config(format!("invalid client config: {}", e)))
    }

    /// Load from a YAML file.
    pub fn load(path: &Path) -> DxResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DxError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), base_url = %config.base_url, "Loaded client config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_yaml_str("base_url: 127.0.0.1:8002\n").unwrap();
        assert_eq!(config.api_root, "dspaces");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.normalized_base_url(), "http://127.0.0.1:8002");
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
base_url: "https://dx.example.org"
api_root: "api/v2"
timeout_ms: 30000
connect_timeout_ms: 1500
"#;
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.normalized_base_url(), "https://dx.example.org");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.yaml");
        std::fs::write(&path, "base_url: dx.internal:9000\ntimeout_ms: 10000\n").unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.normalized_base_url(), "http://dx.internal:9000");
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));

        assert!(matches!(
            ClientConfig::load(&dir.path().join("missing.yaml")),
            Err(DxError::Config(_))
        ));
    }

    #[test]
    fn test_sub_second_timeouts_survive() {
        let config = ClientConfig::new("h:1")
            .with_timeout(Duration::from_millis(500))
            .with_connect_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.timeout_ms, Some(500));

        let config = ClientConfig::new("h:1").with_timeout(Duration::from_micros(10));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            ClientConfig::from_yaml_str("api_root: x\n"),
            Err(DxError::Config(_))
        ));
    }
}
