//! Signature help resolution
//!
//! [`SignatureHelpResolver`] answers a signature help request in four steps:
//! a bounded text scan finds the enclosing call ([`scan_context`]), the
//! syntax tree confirms it ([`validate`]), the completion engine supplies the
//! candidate signatures, and [`select_signature`] picks the overload and
//! parameter to highlight.

mod context;
mod node;
mod overload;

use std::sync::Arc;

use lsp_types::{Position, SignatureHelp, SignatureInformation, Url};

use crate::cancel::CancellationToken;
use crate::error::ResolveError;
use crate::text::{DocumentStore, SourceText};

pub use context::{scan_context, SignatureContext, SEARCH_BOUND};
pub use node::{validate, CallNode, NodeKind, SyntaxTree};
pub use overload::{select_signature, SignatureSelection};

/// How long a tree request may block on parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Parse the document if no up to date tree exists
    Wait,
    /// Only return a tree that is already available
    IfReady,
}

/// Source of syntax trees for open documents
pub trait SyntaxTreeProvider: Send + Sync {
    fn tree(
        &self,
        uri: &Url,
        wait: WaitPolicy,
        token: &CancellationToken,
    ) -> Result<Arc<dyn SyntaxTree>, ResolveError>;
}

/// The completion engine's view of callable signatures
pub trait SignatureSource: Send + Sync {
    /// Signatures callable from the argument list starting at `offset`
    fn signature_candidates(
        &self,
        uri: &Url,
        text: &SourceText,
        offset: usize,
        token: &CancellationToken,
    ) -> Result<Vec<SignatureInformation>, ResolveError>;
}

/// User preferences consulted per request
pub trait Preferences: Send + Sync {
    fn signature_help_enabled(&self) -> bool;
}

/// Empty response: no signatures, nothing active
pub fn empty_help() -> SignatureHelp {
    SignatureHelp {
        signatures: Vec::new(),
        active_signature: None,
        active_parameter: None,
    }
}

pub struct SignatureHelpResolver {
    preferences: Arc<dyn Preferences>,
    documents: Arc<dyn DocumentStore>,
    trees: Arc<dyn SyntaxTreeProvider>,
    signatures: Arc<dyn SignatureSource>,
}

impl SignatureHelpResolver {
    pub fn new(
        preferences: Arc<dyn Preferences>,
        documents: Arc<dyn DocumentStore>,
        trees: Arc<dyn SyntaxTreeProvider>,
        signatures: Arc<dyn SignatureSource>,
    ) -> Self {
        Self {
            preferences,
            documents,
            trees,
            signatures,
        }
    }

    /// Resolve signature help at `position`. Never fails: errors are logged
    /// and answered with an empty result.
    pub fn resolve(&self, uri: &Url, position: Position, token: &CancellationToken) -> SignatureHelp {
        if !self.preferences.signature_help_enabled() {
            return empty_help();
        }

        match self.try_resolve(uri, position, token) {
            Ok(help) => help,
            Err(ResolveError::Cancelled) => empty_help(),
            Err(err) => {
                log::error!("Find signatureHelp failure: {}", err);
                empty_help()
            }
        }
    }

    fn try_resolve(
        &self,
        uri: &Url,
        position: Position,
        token: &CancellationToken,
    ) -> Result<SignatureHelp, ResolveError> {
        let text = self.documents.resolve_document(uri)?;
        let offset = text.offset_at_encoded(
            position.line,
            position.character,
            self.documents.position_encoding(),
        )?;

        let context = scan_context(text.chars(), offset);
        let Some(call_start) = context.call_start else {
            return Ok(empty_help());
        };

        let tree = self.trees.tree(uri, WaitPolicy::Wait, token)?;
        let Some(node) = validate(tree.as_ref(), call_start, context.parameter_index) else {
            return Ok(empty_help());
        };

        if token.is_cancelled() {
            return Ok(empty_help());
        }

        let signatures = self
            .signatures
            .signature_candidates(uri, &text, call_start + 1, token)?;
        if signatures.is_empty() {
            return Ok(empty_help());
        }

        let selection = select_signature(&signatures, &node, context.parameter_index);
        log::debug!(
            "Signature help at {}:{}: {} candidates, selection {:?}",
            position.line,
            position.character,
            signatures.len(),
            selection
        );

        Ok(SignatureHelp {
            signatures,
            active_signature: selection.active_signature,
            active_parameter: selection.active_parameter,
        })
    }
}
