//! Index error types
//!
//! Error codes:
//! - GHOST_INDEX_INCONSISTENT (FATAL)
//! - GHOST_INDEX_STALE_NODE (FATAL)
//!
//! The index is derived state; any of these means a programming defect in
//! the code maintaining it, never bad input.

use std::fmt;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// System must halt immediately
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Feature index and node index disagree
    GhostIndexInconsistent,
    /// A node entry with no members is still indexed
    GhostIndexStaleNode,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::GhostIndexInconsistent => "GHOST_INDEX_INCONSISTENT",
            IndexErrorCode::GhostIndexStaleNode => "GHOST_INDEX_STALE_NODE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    /// Returns the invariant violated by this error
    pub fn invariant(&self) -> &'static str {
        match self {
            IndexErrorCode::GhostIndexInconsistent => "bidirectional-consistency",
            IndexErrorCode::GhostIndexStaleNode => "empty-node-cleanup",
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    node: Option<String>,
}

impl IndexError {
    /// Create an inconsistency error
    pub fn inconsistent(node: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::GhostIndexInconsistent,
            message: format!("Node {}: {}", node, reason.into()),
            node: Some(node.to_string()),
        }
    }

    /// Create a stale node error
    pub fn stale_node(node: impl fmt::Display) -> Self {
        Self {
            code: IndexErrorCode::GhostIndexStaleNode,
            message: format!("Node {} has no members", node),
            node: Some(node.to_string()),
        }
    }

    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn invariant(&self) -> &'static str {
        self.code.invariant()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Display form of the offending node key
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        write!(f, " [violates {}]", self.code.invariant())?;
        Ok(())
    }
}

impl std::error::Error for IndexError {}

/// Result type for index checks
pub type IndexResult<T> = Result<T, IndexError>;
