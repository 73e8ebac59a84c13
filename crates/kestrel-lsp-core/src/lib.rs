//! Core request handling for the Kestrel language server
//!
//! This crate holds the two request algorithms that the server exposes on
//! top of its collaborators, independent of any transport:
//!
//! - **Build**: runs a workspace build through a [`BuildEngine`], clears
//!   stale diagnostics and reduces the resulting markers to a [`BuildStatus`]
//! - **Signatures**: locates the call enclosing the cursor, validates it
//!   against a [`SyntaxTree`] and picks the overload to highlight
//!
//! Everything else (projects, documents, syntax trees, signature candidates)
//! is reached through the traits re-exported below, so tests and the server
//! can plug in their own implementations.
//!
//! # Example
//!
//! ```
//! use kestrel_lsp_core::signature::scan_context;
//!
//! let text: Vec<char> = "max(a, ".chars().collect();
//! let context = scan_context(&text, text.len());
//! assert_eq!(context.call_start, Some(3));
//! assert_eq!(context.parameter_index, 1);
//! ```

pub mod build;
pub mod cancel;
pub mod error;
pub mod marker;
pub mod signature;
pub mod text;

// Re-export main types for convenience
pub use build::{
    BuildEngine, BuildMode, BuildStatus, ClientConnection, ProjectRef, ProjectRegistry,
    WorkspaceBuilder,
};
pub use cancel::CancellationToken;
pub use error::{BuildError, ResolveError};
pub use marker::{DiagnosticMarker, Severity};
pub use signature::{
    CallNode, NodeKind, Preferences, SignatureContext, SignatureHelpResolver, SignatureSelection,
    SignatureSource, SyntaxTree, SyntaxTreeProvider, WaitPolicy,
};
pub use text::{DocumentStore, PositionEncoding, SourceText};
