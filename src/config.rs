//! Configuration for the memory accounting pipeline.
//!
//! The pipeline needs very little static configuration: how the host
//! presents itself in the completed record set, and which URL marks a
//! surface as the host's internal memory-inspection page.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Default configuration constants
pub const DEFAULT_DISPLAY_NAME: &str = "Memory Details";
pub const DEFAULT_PROCESS_NAME: &str = "memory-details";
pub const DEFAULT_DIAGNOSTICS_URL: &str = "about:memory";

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host display name, reported in the record set and used as the
    /// title of the synthetic host record.
    #[serde(default = "default_display_name", alias = "display-name")]
    pub display_name: String,

    /// Canonical process-image name of the host.
    #[serde(default = "default_process_name", alias = "process-name")]
    pub process_name: String,

    /// URL of the host's internal memory-inspection page. Surfaces whose
    /// pending or last-committed virtual URL equals it (ASCII
    /// case-insensitively) are flagged as diagnostics.
    #[serde(default = "default_diagnostics_url", alias = "diagnostics-url")]
    pub diagnostics_url: String,
}

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}
fn default_process_name() -> String {
    DEFAULT_PROCESS_NAME.to_string()
}
fn default_diagnostics_url() -> String {
    DEFAULT_DIAGNOSTICS_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            process_name: default_process_name(),
            diagnostics_url: default_diagnostics_url(),
        }
    }
}

impl Config {
    /// Parses a configuration from a TOML document. Missing keys fall
    /// back to the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
