//! Error types shared across the crate.
//!
//! The convenience layer introduces no failure modes of its own: whatever
//! a session raises for a bad filter, a missing entity, or a transport
//! fault passes through these kinds unmodified.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Entity {entity} has no '{tag}' tag")]
    MissingTag { entity: String, tag: String },

    #[error("Tag '{tag}' on {entity} is not a reference")]
    NotARef { entity: String, tag: String },

    #[error("Filter error: {0}")]
    Filter(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
