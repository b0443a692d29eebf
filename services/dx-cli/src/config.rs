//! CLI configuration file.
//!
//! ```yaml
//! client:
//!   base_url: "127.0.0.1:8002"
//!   timeout_ms: 60000
//! sources:
//!   catalog_namespace: "cmip6-planetary"
//!   local_models: ["mymodel"]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use dx_client::ClientConfig;
use dx_interface::SourceConfig;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub client: Option<ClientConfig>,
    #[serde(default)]
    pub sources: SourceConfig,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded CLI config");
        Ok(config)
    }

    /// Client settings, with `server` taking precedence over the file.
    pub fn client_config(&self, server: Option<&str>) -> Result<ClientConfig> {
        match (server, &self.client) {
            (Some(server), Some(client)) => Ok(ClientConfig {
                base_url: server.to_string(),
                ..client.clone()
            }),
            (Some(server), None) => Ok(ClientConfig::new(server)),
            (None, Some(client)) => Ok(client.clone()),
            (None, None) => anyhow::bail!(
                "No server configured: pass --server, set DX_SERVER, \
                 or add a client section to --config"
            ),
        }
    }
}
