//! Semantic addressing for the dx array store.
//!
//! Callers describe data in domain terms (a variable, a model, a date range,
//! a geographic box) and this crate turns that into the object names,
//! versions and index boxes the store understands.
//!
//! - [`geo`]: latitude/longitude to 0.25 degree grid indices
//! - [`version`]: date ranges packed into object versions
//! - [`naming`]: `v:..,m:..,s:..` object names
//! - [`source`]: known data sources and their settings
//! - [`request`]: tagged semantic requests and their resolution
//! - [`interface`]: the [`DxInterface`] facade

pub mod geo;
pub mod interface;
pub mod naming;
pub mod request;
pub mod source;
pub mod version;

pub use geo::{discretize, grid_axes, GeoBounds, GeoPoint, GridIndex};
pub use interface::DxInterface;
pub use naming::VariableName;
pub use request::{CatalogRequest, LocalRequest, ResolvedRequest, SemanticRequest};
pub use source::{SourceConfig, SourceKind};
pub use version::DateVersion;
