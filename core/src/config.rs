//! Configuration types for SEQQUORUM

use crate::error::QuorumError;
use crate::traits::QuorumResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Multi-node client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URLs of the query nodes
    pub nodes: Vec<String>,

    /// Timeout of a single HTTP request in milliseconds
    pub request_timeout_ms: u64,

    /// Deadline of a whole multi-node call in milliseconds
    pub call_timeout_ms: u64,

    /// Per-call timeout of stream reads and closes in milliseconds
    pub stream_timeout_ms: u64,

    /// Logging level
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nodes: vec![],
            request_timeout_ms: 10_000,
            call_timeout_ms: 30_000,
            stream_timeout_ms: 30_000,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given nodes with default timeouts
    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> QuorumResult<Self> {
        serde_json::from_str(json).map_err(|e| QuorumError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> QuorumResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| QuorumError::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> QuorumResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| QuorumError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Check the configuration can back a multi-node client
    pub fn validate(&self) -> QuorumResult<()> {
        if self.nodes.len() < 2 {
            return Err(QuorumError::Config(format!(
                "at least 2 node urls are required, got {}",
                self.nodes.len()
            )));
        }
        if self.request_timeout_ms == 0 || self.call_timeout_ms == 0 || self.stream_timeout_ms == 0 {
            return Err(QuorumError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_timeout_ms)
    }
}
