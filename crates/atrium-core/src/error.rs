//! Error types for Atrium

use thiserror::Error;

/// The main error type for Atrium operations
#[derive(Debug, Error)]
pub enum AtriumError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node has no geometry to bound: {0}")]
    NoGeometry(String),

    #[error("Duplicate node name: {0}")]
    DuplicateNodeName(String),

    #[error("Physics error: {0}")]
    PhysicsError(String),

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for Atrium operations
pub type Result<T> = std::result::Result<T, AtriumError>;
