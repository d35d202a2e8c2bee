//! csvload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the csvload workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the shared error type and result alias
//! - **Logging**: tracing subscriber setup driven by environment variables
//! - **Checksums**: content hashing used to derive stable item identifiers
//!
//! # Example
//!
//! ```no_run
//! use csvload_common::checksum::hash_fields;
//!
//! let id = hash_fields(&["2024-01-02", "2024-01-03", "1234"]);
//! assert_eq!(id.len(), 64);
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CommonError, Result};
