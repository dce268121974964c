//! Error types for sqltree

use crate::node::NodeId;
use thiserror::Error;

/// Result type alias for build operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while building a statement tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A statement that would touch every row of its relation
    #[error("Unsafe mass operation: {statement} without WHERE is forbidden")]
    MassOperation { statement: &'static str },

    /// A field was referenced through an anonymous alias the build never visited
    #[error("Unbound alias #{0}: the aliased relation is not part of the built statement")]
    UnboundAlias(NodeId),

    /// A parameter was rendered without being visited by the build
    #[error("Unbound parameter #{0}: node is not reachable through its parent's children")]
    UnboundParam(NodeId),

    /// A node whose shape does not match its rendering rule
    #[error("Malformed {node}: {reason}")]
    Malformed { node: &'static str, reason: String },

    /// Invalid build options
    #[error("Invalid build options: {0}")]
    InvalidOptions(String),
}

impl BuildError {
    /// Create a malformed node error
    pub fn malformed(node: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            node,
            reason: reason.into(),
        }
    }

    /// Check if this is a mass operation error
    pub fn is_mass_operation(&self) -> bool {
        matches!(self, Self::MassOperation { .. })
    }
}
