//! Configuration file structure
//!
//! A JSON file; every key is optional and falls back to its default.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::names::CollisionPolicy;
use crate::schema::{compile_include_pattern, SchemaBuilderOptions};

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store hosts, tried in order
    #[serde(default = "default_elasticsearch_hosts")]
    pub elasticsearch_hosts: Vec<String>,

    /// Collections whose whole name does not match are not exposed
    #[serde(default = "default_index_include_pattern")]
    pub index_include_pattern: String,

    /// Fields whose original name starts with this prefix are not exposed
    #[serde(default)]
    pub field_ignore_prefix: Option<String>,

    #[serde(default = "default_true")]
    pub enable_aggregations: bool,

    #[serde(default)]
    pub enable_graphiql: bool,

    /// Log every compiled store query
    #[serde(default)]
    pub enable_query_logging: bool,

    /// Log every raw store result
    #[serde(default)]
    pub enable_query_result_logging: bool,

    #[serde(default)]
    pub collision_policy: CollisionPolicy,

    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Per-request timeout against the store, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_elasticsearch_hosts() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}
fn default_index_include_pattern() -> String {
    ".*".to_string()
}
fn default_true() -> bool {
    true
}
fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_request_timeout_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elasticsearch_hosts: default_elasticsearch_hosts(),
            index_include_pattern: default_index_include_pattern(),
            field_ignore_prefix: None,
            enable_aggregations: true,
            enable_graphiql: false,
            enable_query_logging: false,
            enable_query_result_logging: false,
            collision_policy: CollisionPolicy::default(),
            listen_address: default_listen_address(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Reject values that would only fail later, at startup
    pub fn validate(&self) -> CliResult<()> {
        if self.elasticsearch_hosts.is_empty() {
            return Err(CliError::config_error("elasticsearch_hosts must not be empty"));
        }

        if let Some(host) = self.elasticsearch_hosts.iter().find(|h| h.trim().is_empty()) {
            return Err(CliError::config_error(format!(
                "Invalid elasticsearch host: '{}'",
                host
            )));
        }

        compile_include_pattern(&self.index_include_pattern)
            .map_err(|e| CliError::config_error(e.to_string()))?;

        if matches!(self.field_ignore_prefix.as_deref(), Some("")) {
            return Err(CliError::config_error(
                "field_ignore_prefix must not be empty; omit it instead",
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(CliError::config_error("request_timeout_ms must be > 0"));
        }

        self.socket_addr()?;

        Ok(())
    }

    pub fn socket_addr(&self) -> CliResult<SocketAddr> {
        self.listen_address.parse().map_err(|e| {
            CliError::config_error(format!(
                "Invalid listen_address '{}': {}",
                self.listen_address, e
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Schema options derived from this configuration
    pub fn builder_options(&self) -> SchemaBuilderOptions {
        SchemaBuilderOptions {
            enable_aggregations: self.enable_aggregations,
            include_pattern: Some(self.index_include_pattern.clone()),
            ignore_prefix: self.field_ignore_prefix.clone(),
        }
    }
}
