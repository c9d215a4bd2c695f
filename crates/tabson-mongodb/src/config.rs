//! Process-wide marshalling configuration
//!
//! The configuration is read once per top-level call, so a change made with
//! [`set_config`] applies to calls that start afterwards.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Marshalling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalConfig {
    /// Tables nested deeper than this are dropped from the encoded document.
    ///
    /// `None` (the default) leaves nesting unbounded.
    pub max_depth: Option<usize>,

    /// Whether a sequence of partial documents is merged into one document.
    ///
    /// When disabled, a sequence is encoded like any other table.
    pub ordered_sequences: bool,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            ordered_sequences: true,
        }
    }
}

static GLOBAL_CONFIG: RwLock<MarshalConfig> = RwLock::new(MarshalConfig {
    max_depth: None,
    ordered_sequences: true,
});

/// Gets the current configuration
///
/// A poisoned lock still holds a valid configuration, so it is read through.
pub fn get_config() -> MarshalConfig {
    match GLOBAL_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replaces the current configuration
pub fn set_config(config: MarshalConfig) {
    tracing::debug!(?config, "updating marshal config");
    match GLOBAL_CONFIG.write() {
        Ok(mut global) => *global = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Restores the default configuration
pub fn reset_config() {
    set_config(MarshalConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MarshalConfig::default();
        assert_eq!(config.max_depth, None);
        assert!(config.ordered_sequences);
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config: MarshalConfig = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(config.max_depth, Some(8));
        assert!(config.ordered_sequences);
    }
}
