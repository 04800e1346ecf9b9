//! Error types for xtdiff.

use thiserror::Error;

/// Result type alias for xtdiff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, diffing or replaying documents.
#[derive(Error, Debug)]
pub enum Error {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// The input tree violates the structural contract (inconsistent
    /// parent/child links, shared nodes, duplicate attribute keys).
    #[error("invalid input tree: {0}")]
    InvalidInput(String),

    /// An action address did not resolve against the tree it was applied to.
    #[error("unresolvable path: {0}")]
    InvalidPath(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}
