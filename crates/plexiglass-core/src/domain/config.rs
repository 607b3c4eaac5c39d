//! Configuration document: server list plus settings tree
//!
//! ```json
//! {
//!   "servers": [
//!     {"name": "home", "url": "http://10.0.0.5:32400", "token": "${PLEX_TOKEN}", "default": true}
//!   ],
//!   "settings": {"performance": {"cache_ttl": 90}}
//! }
//! ```
//!
//! `${VAR}` references inside server entries are replaced from the
//! environment before the entries are parsed.

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::server::{ServerDescriptor, ServerRegistry};
use super::settings::Settings;
use crate::error::{Error, Result};

lazy_static! {
    static ref ENV_VAR_REGEX: Regex = Regex::new(r"\$\{([^}]+)\}").unwrap();
}

const REQUIRED_SERVER_FIELDS: [&str; 3] = ["name", "url", "token"];

/// A single entry of the `servers` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub url: String,
    pub token: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Per-server timeout in seconds, overriding `performance.connection_timeout`
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Parsed and validated configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub servers: Vec<ServerEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl AppConfig {
    /// Load a configuration file, substituting variables from the process environment
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        info!("[Config] Loading configuration from {}", path.display());
        Self::from_json_str(&content)
    }

    /// Parse a configuration document, substituting variables from the process environment
    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_json_str_with_env(content, |name| std::env::var(name).ok())
    }

    /// Parse a configuration document with an explicit variable lookup
    pub fn from_json_str_with_env<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: Value = serde_json::from_str(content)
            .map_err(|e| Error::configuration(format!("Invalid JSON in configuration file: {}", e)))?;

        let Value::Object(mut root) = raw else {
            return Err(Error::configuration(
                "Configuration file must contain a JSON object",
            ));
        };

        let servers = root
            .remove("servers")
            .ok_or_else(|| Error::configuration("Configuration must contain a 'servers' section"))?;

        let servers = match servers {
            Value::Array(list) if !list.is_empty() => list,
            _ => {
                return Err(Error::configuration(
                    "Configuration must contain at least one server in 'servers' list",
                ))
            }
        };

        let mut entries = Vec::with_capacity(servers.len());
        for (idx, server) in servers.into_iter().enumerate() {
            let Value::Object(ref fields) = server else {
                return Err(Error::configuration(format!(
                    "Server entry {} must be an object",
                    idx
                )));
            };

            let missing: Vec<&str> = REQUIRED_SERVER_FIELDS
                .iter()
                .copied()
                .filter(|f| !fields.contains_key(*f))
                .collect();
            if !missing.is_empty() {
                let label = fields
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("entry {}", idx));
                return Err(Error::configuration(format!(
                    "Server '{}' is missing required fields: {}",
                    label,
                    missing.join(", ")
                )));
            }

            let substituted = substitute_env_vars(server, &lookup)?;
            let entry: ServerEntry = serde_json::from_value(substituted).map_err(|e| {
                Error::configuration(format!("Server entry {} is invalid: {}", idx, e))
            })?;
            entries.push(entry);
        }

        let settings = match root.remove("settings") {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| Error::configuration(format!("Invalid settings section: {}", e)))?,
            None => Settings::default(),
        };

        debug!("[Config] Parsed {} server entries", entries.len());

        Ok(Self {
            servers: entries,
            settings,
        })
    }

    /// Build the read-only server registry from the parsed entries
    pub fn registry(&self) -> ServerRegistry {
        let fallback = self.settings.performance.connection_timeout();
        let descriptors = self
            .servers
            .iter()
            .map(|entry| ServerDescriptor {
                name: entry.name.clone(),
                url: entry.url.clone(),
                token: entry.token.clone(),
                timeout: entry.timeout.map(Duration::from_secs).unwrap_or(fallback),
                default: entry.default,
                read_only: entry.read_only,
            })
            .collect();
        ServerRegistry::new(descriptors)
    }
}

/// Recursively replace `${VAR}` references in every string of `value`
pub fn substitute_env_vars<F>(value: Value, lookup: &F) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                out.insert(key, substitute_env_vars(inner, lookup)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .into_iter()
            .map(|item| substitute_env_vars(item, lookup))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::String(s) => {
            let mut result = s.clone();
            for caps in ENV_VAR_REGEX.captures_iter(&s) {
                let var_name = &caps[1];
                let replacement = lookup(var_name).ok_or_else(|| {
                    Error::configuration(format!(
                        "Environment variable '{}' referenced in configuration but not found in environment",
                        var_name
                    ))
                })?;
                result = result.replace(&caps[0], &replacement);
            }
            Ok(Value::String(result))
        }
        other => Ok(other),
    }
}
