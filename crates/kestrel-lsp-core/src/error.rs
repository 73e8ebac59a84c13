//! Error types raised by the collaborators of the core handlers

use lsp_types::Url;

/// Failure reported by a build engine or project registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// The build observed its cancellation token and stopped
    #[error("build cancelled")]
    Cancelled,
    /// The engine itself failed
    #[error("build engine failure: {0}")]
    Engine(String),
}

/// Failure while gathering the inputs of a signature help request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("request cancelled")]
    Cancelled,
    #[error("document not found: {0}")]
    DocumentNotFound(Url),
    #[error("position {line}:{character} is outside the document")]
    PositionOutOfRange { line: u32, character: u32 },
    /// No syntax tree could be produced for the document
    #[error("syntax tree unavailable for {0}")]
    TreeUnavailable(Url),
    /// The completion engine failed to collect candidates
    #[error("signature candidates unavailable: {0}")]
    Candidates(String),
}
