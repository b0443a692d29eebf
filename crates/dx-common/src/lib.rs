//! Common types shared across the dx data-exchange crates.

pub mod array;
pub mod element;
pub mod error;
pub mod object;
pub mod region;

pub use array::NDArray;
pub use element::{Element, ElementType, ELEMENT_TABLE_VERSION};
pub use error::{DxError, DxResult};
pub use object::{ExecArg, ObjectRef, RegHandle};
pub use region::{ArrayBox, Extent};
