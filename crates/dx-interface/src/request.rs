//! Semantic requests and their resolution to store addresses.

use dx_common::{ArrayBox, DxError, DxResult, ExecArg, ObjectRef};
use serde::{Deserialize, Serialize};

use crate::geo::GeoBounds;
use crate::naming::VariableName;
use crate::source::{SourceConfig, SourceKind};
use crate::version::DateVersion;

/// A request against the versioned catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRequest {
    pub variable: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub geo: GeoBounds,
}

/// A request against user-written arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRequest {
    pub variable: String,
    pub model: String,
    #[serde(default)]
    pub geo: GeoBounds,
}

/// A request in domain terms, tagged by its source.
///
/// ```json
/// {"source": "planetary-gddp", "variable": "tas", "model": "ACCESS-ESM1-5",
///  "start_date": "1982-11-28", "end_date": "1982-11-29",
///  "geo": {"lower": {"lat": 38.9, "lon": -77.0}, "upper": {"lat": 40.7, "lon": -74.0}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum SemanticRequest {
    #[serde(rename = "planetary-gddp")]
    PlanetaryGddp(CatalogRequest),
    #[serde(rename = "local")]
    Local(LocalRequest),
}

/// The store address a semantic request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub object: ObjectRef,
    pub region: ArrayBox,
}

impl ResolvedRequest {
    pub fn into_exec_arg(self) -> ExecArg {
        ExecArg::new(self.object, self.region)
    }
}

impl SemanticRequest {
    pub fn source(&self) -> SourceKind {
        match self {
            SemanticRequest::PlanetaryGddp(_) => SourceKind::PlanetaryGddp,
            SemanticRequest::Local(_) => SourceKind::Local,
        }
    }

    pub fn geo(&self) -> &GeoBounds {
        match self {
            SemanticRequest::PlanetaryGddp(r) => &r.geo,
            SemanticRequest::Local(r) => &r.geo,
        }
    }

    /// Translate to an object reference and index box.
    pub fn resolve(&self, config: &SourceConfig) -> DxResult<ResolvedRequest> {
        let region = self.geo().to_box()?;

        let object = match self {
            SemanticRequest::PlanetaryGddp(r) => {
                let name = VariableName {
                    variable: r.variable.clone(),
                    model: r.model.clone(),
                    scenario: r.scenario.clone(),
                };
                let version = DateVersion::parse(&r.start_date, &r.end_date)?;
                ObjectRef::new(name.to_string(), version.pack())
                    .in_namespace(config.catalog_namespace.clone())
            }
            SemanticRequest::Local(r) => {
                if !config.accepts_local_model(&r.model) {
                    return Err(DxError::Config(format!(
                        "model '{}' is not served by the local source",
                        r.model
                    )));
                }
                let name = VariableName::new(r.variable.clone()).with_model(r.model.clone());
                ObjectRef::new(name.to_string(), 0)
            }
        };

        Ok(ResolvedRequest { object, region })
    }

    pub fn to_exec_arg(&self, config: &SourceConfig) -> DxResult<ExecArg> {
        self.resolve(config).map(ResolvedRequest::into_exec_arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx_common::Extent;

    fn catalog_tas() -> SemanticRequest {
        SemanticRequest::PlanetaryGddp(CatalogRequest {
            variable: "tas".to_string(),
            start_date: "1982-11-28".to_string(),
            end_date: "1982-11-29".to_string(),
            model: Some("ACCESS-ESM1-5".to_string()),
            scenario: None,
            geo: GeoBounds::new((38.9, -77.0), (40.7, -74.0)),
        })
    }

    #[test]
    fn test_resolve_catalog() {
        let resolved = catalog_tas().resolve(&SourceConfig::default()).unwrap();
        assert_eq!(
            resolved.object,
            ObjectRef::new("v:tas,m:ACCESS-ESM1-5", (12_019 << 16) | 1)
                .in_namespace("cmip6-planetary")
        );
        assert_eq!(
            resolved.region.bounds,
            vec![Extent::new(395, 8), Extent::new(412, 13)]
        );
    }

    #[test]
    fn test_resolve_local() {
        let request = SemanticRequest::Local(LocalRequest {
            variable: "pressure".to_string(),
            model: "mymodel".to_string(),
            geo: GeoBounds::new((38.9, -77.0), (40.7, -74.0)),
        });
        let arg = request.to_exec_arg(&SourceConfig::default()).unwrap();
        assert_eq!(arg.object, ObjectRef::new("v:pressure,m:mymodel", 0));
        assert_eq!(arg.region.starts(), vec![395, 412]);
    }

    #[test]
    fn test_local_model_must_be_configured() {
        let request = SemanticRequest::Local(LocalRequest {
            variable: "pressure".to_string(),
            model: "othermodel".to_string(),
            geo: GeoBounds::default(),
        });
        assert!(matches!(
            request.resolve(&SourceConfig::default()),
            Err(DxError::Config(_))
        ));
    }

    #[test]
    fn test_tagged_json() {
        let json = r#"{"source": "local", "variable": "pressure", "model": "mymodel"}"#;
        let request: SemanticRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.source(), SourceKind::Local);
        assert_eq!(request.geo(), &GeoBounds::default());

        let json = r#"{"source": "era5", "variable": "t2m"}"#;
        assert!(serde_json::from_str::<SemanticRequest>(json).is_err());
    }
}
