//! # ormkv Testkit
//!
//! Test utilities for ormkv.
//!
//! This crate provides:
//! - Fixture record types (`User`, `Post`) and the schemas built over them
//! - Backend helpers, including a self-cleaning file backend
//! - Property-based test generators using proptest
//! - A model-checking harness for the connection surface
//!
//! ## Usage
//!
//! ```rust
//! use ormkv_testkit::prelude::*;
//!
//! let schema = user_schema();
//! let backend = with_memory_connection(&schema, |conn| {
//!     conn.insert(&User::new(1, "a@x.com")).unwrap();
//! });
//! assert_eq!(backend.len(), ENTRIES_PER_USER);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
