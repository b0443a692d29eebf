//! Wire protocol of the dx data-exchange service.
//!
//! This crate owns everything that crosses the network:
//! - [`endpoints`]: routes and query parameters
//! - [`array`]: array metadata headers and payload framing
//! - [`exec`]: remote execution submissions and results
//! - [`register`]: dataset registration bodies
//!
//! It performs no I/O; `dx-client` drives the transport.

pub mod array;
pub mod endpoints;
pub mod exec;
pub mod register;

pub use array::{ArrayMetadata, EncodedArray, DIMS_HEADER, TAG_HEADER};
pub use endpoints::{Endpoint, Method, DEFAULT_API_ROOT};
pub use exec::{
    ArgRequest, BinaryOp, ExecOutput, ExecRequests, ExecUnit, Expr, UnaryOp,
    EXEC_FORMAT_VERSION, FUNCTION_FIELD, REQUESTS_FIELD,
};
pub use register::RegisterFailure;

/// Multipart field carrying the box descriptor of a write.
pub const BOX_FIELD: &str = "box";
/// Multipart field carrying the raw payload of a write.
pub const DATA_FIELD: &str = "data";
