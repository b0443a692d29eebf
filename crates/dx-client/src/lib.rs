//! Client for the dx versioned array store.
//!
//! Addresses rectangular regions of named, versioned N-dimensional arrays,
//! moves raw array payloads to and from the service, and ships executable
//! units to run next to the data.
//!
//! # Example
//!
//! ```ignore
//! use dx_client::DxClient;
//! use dx_common::{ArrayBox, ObjectRef};
//!
//! let client = DxClient::connect("127.0.0.1:8002")?;
//! let object = ObjectRef::new("v:tas,m:ACCESS-ESM1-5", version).in_namespace("cmip6-planetary");
//! let region = ArrayBox::from_bounds(&[116, 412], &[123, 423])?;
//!
//! match client.get_array(&object, &region).await? {
//!     Some(array) => println!("{:?} {}", array.shape(), array.element_type()),
//!     None => println!("not stored"),
//! }
//! ```

pub mod client;
pub mod config;
mod metrics;
pub mod service;

pub use client::DxClient;
pub use config::ClientConfig;
pub use service::ArrayService;

pub use dx_common::{
    ArrayBox, DxError, DxResult, ElementType, ExecArg, Extent, NDArray, ObjectRef, RegHandle,
};
pub use dx_protocol::{ExecOutput, ExecUnit, Expr};
