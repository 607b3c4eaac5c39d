//! # PlexiGlass Core Library
//!
//! Domain types and error taxonomy for the PlexiGlass dashboard.
//!
//! ## Modules
//!
//! - `domain` - Server descriptors, registry, settings and configuration loading
//! - `error` - Error, ErrorKind, ConnectionFailure and Severity

pub mod domain;
pub mod error;

// Re-export commonly used types
pub use domain::*;
pub use error::{ConnectionFailure, Error, ErrorKind, Result, Severity};
