//! Signature candidates for signature help
//!
//! Candidates for a call come from two places, in this order: the signature
//! catalog loaded at startup, then declarations found in open documents
//! (the requesting document first, the others by URI).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use kestrel_lsp_core::{
    CancellationToken, ResolveError, SignatureSource, SourceText, WaitPolicy,
};
use serde::Deserialize;
use tower_lsp::lsp_types::{
    Documentation, MarkupContent, MarkupKind, ParameterInformation, ParameterLabel,
    SignatureInformation, Url,
};

use crate::document::DocumentSet;
use crate::syntax::{callee_name, Declaration, SyntaxTrees};

/// Complete function signature information
#[derive(Clone, Debug, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub signature: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
}

/// Information about a single parameter in a function signature
#[derive(Clone, Debug, Deserialize)]
pub struct ParameterInfo {
    pub label: String,
    #[serde(default)]
    pub documentation: String,
}

impl FunctionSignature {
    fn to_information(&self) -> SignatureInformation {
        let parameters = self
            .parameters
            .iter()
            .map(|p| ParameterInformation {
                label: ParameterLabel::Simple(p.label.clone()),
                documentation: (!p.documentation.is_empty())
                    .then(|| Documentation::String(p.documentation.clone())),
            })
            .collect();

        SignatureInformation {
            label: self.signature.clone(),
            documentation: (!self.documentation.is_empty()).then(|| {
                Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: self.documentation.clone(),
                })
            }),
            parameters: Some(parameters),
            active_parameter: None,
        }
    }
}

fn declaration_information(declaration: &Declaration) -> SignatureInformation {
    SignatureInformation {
        label: declaration.label(),
        documentation: None,
        parameters: Some(
            declaration
                .parameters
                .iter()
                .map(|p| ParameterInformation {
                    label: ParameterLabel::Simple(p.clone()),
                    documentation: None,
                })
                .collect(),
        ),
        active_parameter: None,
    }
}

/// Signatures known without looking at the workspace, grouped by name.
/// Overloads keep their order from the catalog file.
#[derive(Debug, Default)]
pub struct SignatureCatalog {
    signatures: HashMap<String, Vec<FunctionSignature>>,
}

impl SignatureCatalog {
    pub fn new(signatures: Vec<FunctionSignature>) -> Self {
        let mut map: HashMap<String, Vec<FunctionSignature>> = HashMap::new();
        for signature in signatures {
            map.entry(signature.name.clone()).or_default().push(signature);
        }
        Self { signatures: map }
    }

    /// Load a JSON array of signatures
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read signature catalog {}", path.display()))?;
        let signatures: Vec<FunctionSignature> = serde_json::from_str(&content)
            .with_context(|| format!("invalid signature catalog {}", path.display()))?;
        Ok(Self::new(signatures))
    }

    pub fn get(&self, name: &str) -> &[FunctionSignature] {
        self.signatures.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.signatures.values().map(Vec::len).sum()
    }
}

/// The server's completion engine for signature help
pub struct WorkspaceSignatures {
    catalog: SignatureCatalog,
    documents: Arc<DocumentSet>,
    trees: Arc<SyntaxTrees>,
}

impl WorkspaceSignatures {
    pub fn new(catalog: SignatureCatalog, documents: Arc<DocumentSet>, trees: Arc<SyntaxTrees>) -> Self {
        Self {
            catalog,
            documents,
            trees,
        }
    }

    fn declared_in(&self, uri: &Url, name: &str) -> Result<Vec<SignatureInformation>, ResolveError> {
        let tree = self.trees.parsed(uri, WaitPolicy::Wait)?;
        Ok(tree
            .declarations()
            .iter()
            .filter(|declaration| declaration.name == name)
            .map(declaration_information)
            .collect())
    }
}

impl SignatureSource for WorkspaceSignatures {
    fn signature_candidates(
        &self,
        uri: &Url,
        text: &SourceText,
        offset: usize,
        token: &CancellationToken,
    ) -> Result<Vec<SignatureInformation>, ResolveError> {
        let Some(name) = callee_name(text.chars(), offset) else {
            return Ok(Vec::new());
        };

        let mut candidates: Vec<SignatureInformation> = self
            .catalog
            .get(&name)
            .iter()
            .map(FunctionSignature::to_information)
            .collect();
        candidates.extend(self.declared_in(uri, &name)?);

        for other in self.documents.uris() {
            if &other == uri {
                continue;
            }
            if token.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            match self.declared_in(&other, &name) {
                Ok(found) => candidates.extend(found),
                // closed while we were looking
                Err(ResolveError::DocumentNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(candidates)
    }
}
