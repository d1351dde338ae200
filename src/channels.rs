//! Channel directory
//!
//! The configuration-derived table of known channels and their publish
//! credentials. Loaded once at process start from the host's JSON config
//! (a nested `application -> channel -> { publish }` mapping) and never
//! mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::path::ChannelKey;

/// Error loading the channel configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read channel config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not the expected JSON shape
    #[error("failed to parse channel config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Access rules for a single configured channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChannelAccess {
    /// Publish credential. `None` means publishes must carry no credential;
    /// it does not mean "accept anything".
    #[serde(default)]
    pub publish: Option<String>,
}

/// Table of channels known to the server, keyed by application and channel
///
/// Lookup is case-sensitive exact match on both components.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ChannelDirectory {
    channels: HashMap<String, HashMap<String, ChannelAccess>>,
}

impl ChannelDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the directory from a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse the directory from a JSON string
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Add a channel, for hosts that assemble the table in code
    pub fn insert(&mut self, key: ChannelKey, publish: Option<String>) {
        self.channels
            .entry(key.app)
            .or_default()
            .insert(key.channel, ChannelAccess { publish });
    }

    /// Look up the access rules for a channel
    pub fn lookup(&self, key: &ChannelKey) -> Option<&ChannelAccess> {
        self.channels.get(&key.app)?.get(&key.channel)
    }

    /// Check whether a channel is configured
    pub fn exists(&self, key: &ChannelKey) -> bool {
        self.lookup(key).is_some()
    }

    /// Number of configured channels across all applications
    pub fn len(&self) -> usize {
        self.channels.values().map(HashMap::len).sum()
    }

    /// Check whether the directory has no channels
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
