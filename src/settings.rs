//! Compilation settings
//!
//! Settings can be built in code or read from a JSON document, e.g.
//!
//! ```json
//! { "limits": { "max_occur_node_limit": 5000 }, "upa_severity": "warning" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::limits::Limits;
use crate::reporter::Severity;

/// Settings for content model compilation and UPA checking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Resource limits
    pub limits: Limits,
    /// Whether Unique Particle Attribution is checked at all
    pub upa_checking: bool,
    /// Severity used when reporting UPA violations
    pub upa_severity: Severity,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            upa_checking: true,
            upa_severity: Severity::Error,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Replace the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
