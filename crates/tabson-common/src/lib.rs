//! Common utilities for tabson
//!
//! This crate provides the error type shared by the tabson crates.

pub mod error;

pub use error::{MarshalError, Result};
