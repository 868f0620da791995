//! Crate-level error types
//!
//! Only the host-facing surface returns errors: loading configuration,
//! scripted edits on layers, and the command line. The sync engine itself
//! never fails; features it cannot index are silently skipped.

use thiserror::Error;

use crate::source::{FeatureId, LayerId};

/// Result type for host-facing operations
pub type GhostResult<T> = Result<T, GhostError>;

/// Host-facing errors
#[derive(Debug, Error)]
pub enum GhostError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No layer with this id
    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    /// No feature with this id in the addressed layer
    #[error("Feature not found: {0}")]
    FeatureNotFound(FeatureId),

    /// Vertex index past the end of the line
    #[error("Vertex {vertex} out of range for feature {feature}")]
    VertexOutOfRange { feature: FeatureId, vertex: usize },

    /// Geometry does not reduce to a single line
    #[error("Feature {0} has no single line geometry")]
    NotALine(FeatureId),

    /// Split tool applied to a layer it does not split
    #[error("Split tool is not bound to {0}")]
    SplitSourceMismatch(LayerId),

    /// Inconsistent scripted scenario
    #[error("Scenario error: {0}")]
    Scenario(String),
}

impl GhostError {
    /// Stable error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            GhostError::Config(_) => "GHOST_CONFIG_ERROR",
            GhostError::Json(_) => "GHOST_JSON_ERROR",
            GhostError::Io(_) => "GHOST_IO_ERROR",
            GhostError::LayerNotFound(_) => "GHOST_LAYER_NOT_FOUND",
            GhostError::FeatureNotFound(_) => "GHOST_FEATURE_NOT_FOUND",
            GhostError::VertexOutOfRange { .. } => "GHOST_VERTEX_OUT_OF_RANGE",
            GhostError::NotALine(_) => "GHOST_NOT_A_LINE",
            GhostError::SplitSourceMismatch(_) => "GHOST_SPLIT_SOURCE_MISMATCH",
            GhostError::Scenario(_) => "GHOST_SCENARIO_ERROR",
        }
    }
}
