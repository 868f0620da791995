//! Engine configuration
//!
//! Loaded from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "render_intent": "select",
//!   "default_intent": "default",
//!   "log_level": "INFO",
//!   "check_consistency": false,
//!   "log_stderr": false
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GhostError, GhostResult};
use crate::observability::{Logger, Severity};
use crate::source::RenderIntent;

/// Sync engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GhostNodesConfig {
    /// Style used to draw sibling features while their move is pending (default: "select")
    #[serde(default = "default_render_intent")]
    pub render_intent: String,

    /// Style used once a move is committed (default: "default")
    #[serde(default = "default_intent")]
    pub default_intent: String,

    /// Minimum log severity (default: "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Verify index consistency after every handled event (default: false)
    #[serde(default)]
    pub check_consistency: bool,

    /// Write every log line to stderr instead of stdout (default: false)
    #[serde(default)]
    pub log_stderr: bool,
}

fn default_render_intent() -> String {
    "select".to_string()
}

fn default_intent() -> String {
    RenderIntent::DEFAULT.to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for GhostNodesConfig {
    fn default() -> Self {
        Self {
            render_intent: default_render_intent(),
            default_intent: default_intent(),
            log_level: default_log_level(),
            check_consistency: false,
            log_stderr: false,
        }
    }
}

impl GhostNodesConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> GhostResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GhostError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a configuration string
    pub fn from_json_str(content: &str) -> GhostResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| GhostError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty style names and unknown log levels
    pub fn validate(&self) -> GhostResult<()> {
        if self.render_intent.trim().is_empty() {
            return Err(GhostError::Config("render_intent must not be empty".into()));
        }
        if self.default_intent.trim().is_empty() {
            return Err(GhostError::Config("default_intent must not be empty".into()));
        }
        self.min_severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn min_severity(&self) -> GhostResult<Severity> {
        self.log_level.parse().map_err(GhostError::Config)
    }

    /// Logger honouring `log_level` and `log_stderr`
    pub fn logger(&self) -> GhostResult<Logger> {
        let min = self.min_severity()?;
        Ok(if self.log_stderr {
            Logger::stderr(min)
        } else {
            Logger::new(min)
        })
    }

    pub fn edit_intent(&self) -> RenderIntent {
        RenderIntent::new(&self.render_intent)
    }

    pub fn committed_intent(&self) -> RenderIntent {
        RenderIntent::new(&self.default_intent)
    }
}
