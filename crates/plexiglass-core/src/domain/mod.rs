//! Domain types read by the PlexiGlass services
//!
//! - `server` - ServerDescriptor and the read-only ServerRegistry
//! - `settings` - Settings tree with defaults and validation
//! - `config` - Configuration document loader

pub mod config;
mod server;
mod settings;

pub use config::{AppConfig, ServerEntry};
pub use server::*;
pub use settings::*;
