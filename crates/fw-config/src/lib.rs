//! Funnelwire Tracking Configuration
//!
//! Declarative tenant assignment for tracking backends. Deployments describe
//! which trackers exist and which assortment/checkout tenants each applies
//! to; the application wires concrete tracker instances from these
//! assignments at startup.
//!
//! ```toml
//! [[trackers]]
//! name = "web-analytics"
//! assortment_tenants = ["eu"]
//!
//! [[trackers]]
//! name = "remarketing"
//! checkout_tenants = ["b2b"]
//! enabled = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate tracker name '{name}'")]
    DuplicateTracker { name: String },

    #[error("Tracker at position {position} has a blank name")]
    BlankTrackerName { position: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tenant assignment for a single tracker.
///
/// Empty tenant lists mean the tracker applies to every tenant on that axis,
/// matching the runtime activation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerAssignment {
    pub name: String,
    #[serde(default)]
    pub assortment_tenants: Vec<String>,
    #[serde(default)]
    pub checkout_tenants: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TrackerAssignment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assortment_tenants: Vec::new(),
            checkout_tenants: Vec::new(),
            enabled: true,
        }
    }

    /// Whether this assignment activates under the given tenant pair.
    ///
    /// Mirrors the runtime rule: a tracker is active when it matches on
    /// either axis, and an empty declaration matches every tenant of that
    /// axis. Configuration previews therefore agree with dispatch behavior.
    pub fn applies_to(&self, assortment_tenant: &str, checkout_tenant: &str) -> bool {
        let assortment_match = self.assortment_tenants.is_empty()
            || self
                .assortment_tenants
                .iter()
                .any(|tenant| tenant == assortment_tenant);

        let checkout_match = self.checkout_tenants.is_empty()
            || self
                .checkout_tenants
                .iter()
                .any(|tenant| tenant == checkout_tenant);

        assortment_match || checkout_match
    }
}

/// Top-level tracking configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub trackers: Vec<TrackerAssignment>,
}

impl TrackingConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_toml_str(&raw)?;
        debug!(
            path = %path.display(),
            trackers = config.trackers.len(),
            "Loaded tracking configuration"
        );
        Ok(config)
    }

    /// Rejects blank and duplicate tracker names. Tenant lists are free-form
    /// strings and are not validated here.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for (position, tracker) in self.trackers.iter().enumerate() {
            if tracker.name.trim().is_empty() {
                return Err(ConfigError::BlankTrackerName { position });
            }
            if !seen.insert(tracker.name.as_str()) {
                return Err(ConfigError::DuplicateTracker {
                    name: tracker.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn assignment_for(&self, name: &str) -> Option<&TrackerAssignment> {
        self.trackers.iter().find(|tracker| tracker.name == name)
    }

    /// Assignments that should be instantiated, in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = &TrackerAssignment> {
        self.trackers.iter().filter(|tracker| tracker.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [[trackers]]
        name = "web-analytics"
        assortment_tenants = ["eu"]

        [[trackers]]
        name = "remarketing"
        checkout_tenants = ["b2b"]
        enabled = false
    "#;

    #[test]
    fn test_parse_sample_config() {
        let config = TrackingConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.trackers.len(), 2);

        let analytics = config.assignment_for("web-analytics").unwrap();
        assert_eq!(analytics.assortment_tenants, vec!["eu"]);
        assert!(analytics.checkout_tenants.is_empty());
        assert!(analytics.enabled);

        let remarketing = config.assignment_for("remarketing").unwrap();
        assert!(!remarketing.enabled);

        let enabled: Vec<&str> = config.enabled().map(|t| t.name.as_str()).collect();
        assert_eq!(enabled, vec!["web-analytics"]);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TrackingConfig::from_toml_str("").unwrap();
        assert!(config.trackers.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let raw = r#"
            [[trackers]]
            name = "dup"

            [[trackers]]
            name = "dup"
        "#;

        let err = TrackingConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTracker { name } if name == "dup"));
    }

    #[test]
    fn test_blank_names_rejected() {
        let raw = r#"
            [[trackers]]
            name = "  "
        "#;

        let err = TrackingConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::BlankTrackerName { position: 0 }));
    }

    #[test]
    fn test_applies_to_matches_runtime_or_rule() {
        // Scoped on one axis only: the empty checkout declaration matches
        // universally, so this applies under every pair.
        let single_axis = TrackerAssignment {
            assortment_tenants: vec!["A".to_string()],
            ..TrackerAssignment::new("single")
        };
        assert!(single_axis.applies_to("A", "default"));
        assert!(single_axis.applies_to("other", "default"));

        // Scoped on both axes: one matching axis suffices.
        let both_axes = TrackerAssignment {
            assortment_tenants: vec!["eu".to_string()],
            checkout_tenants: vec!["b2b".to_string()],
            ..TrackerAssignment::new("both")
        };
        assert!(both_axes.applies_to("eu", "retail"));
        assert!(both_axes.applies_to("us", "b2b"));
        assert!(!both_axes.applies_to("us", "retail"));

        // No declarations: universal.
        let universal = TrackerAssignment::new("universal");
        assert!(universal.applies_to("anything", "anything"));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = TrackingConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.trackers.len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = TrackingConfig::from_toml_file("/nonexistent/tracking.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
