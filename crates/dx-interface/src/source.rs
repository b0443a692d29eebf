//! Data sources known to the semantic layer.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use dx_common::{DxError, DxResult};
use serde::{Deserialize, Serialize};

/// Where a semantic request is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Versioned, geospatially indexed downscaled climate catalog.
    #[serde(rename = "planetary-gddp")]
    PlanetaryGddp,
    /// Unversioned arrays written by the user.
    #[serde(rename = "local")]
    Local,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::PlanetaryGddp => "planetary-gddp",
            SourceKind::Local => "local",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = DxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planetary-gddp" => Ok(SourceKind::PlanetaryGddp),
            "local" => Ok(SourceKind::Local),
            other => Err(DxError::UnknownSource(other.to_string())),
        }
    }
}

/// Per-source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Namespace holding the catalog objects.
    pub catalog_namespace: String,
    /// Models accepted by the local source.
    pub local_models: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            catalog_namespace: "cmip6-planetary".to_string(),
            local_models: vec!["mymodel".to_string()],
        }
    }
}

impl SourceConfig {
    pub fn accepts_local_model(&self, model: &str) -> bool {
        self.local_models.iter().any(|m| m == model)
    }

    pub fn from_yaml_str(yaml: &str) -> DxResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| DxError::Config(format!("invalid source config: {}", e)))
    }

    pub fn load(path: &Path) -> DxResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DxError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("planetary-gddp".parse::<SourceKind>().unwrap(), SourceKind::PlanetaryGddp);
        assert_eq!("local".parse::<SourceKind>().unwrap(), SourceKind::Local);
        assert!(matches!(
            "era5".parse::<SourceKind>(),
            Err(DxError::UnknownSource(s)) if s == "era5"
        ));
    }

    #[test]
    fn test_config_defaults_and_override() {
        let config = SourceConfig::from_yaml_str("local_models: [a, b]\n").unwrap();
        assert_eq!(config.catalog_namespace, "cmip6-planetary");
        assert!(config.accepts_local_model("b"));
        assert!(!config.accepts_local_model("mymodel"));

        assert!(SourceConfig::default().accepts_local_model("mymodel"));
    }
}
