//! Shared test utilities for the dx client workspace.
//!
//! This crate provides common testing infrastructure including:
//! - An in-memory data service speaking the dx HTTP protocol
//! - Array generators
//! - Common test fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then start a service in an async test:
//!
//! ```ignore
//! let service = test_utils::MockDataService::start().await;
//! let client = dx_client::DxClient::connect(&service.base_url())?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod mock_service;

pub use generators::*;
pub use mock_service::{MockDataService, MockState, RecordedRequest};
