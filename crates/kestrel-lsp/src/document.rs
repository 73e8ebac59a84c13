use std::sync::Arc;

use dashmap::DashMap;
use kestrel_lsp_core::{DocumentStore, PositionEncoding, ResolveError, SourceText};
use parking_lot::RwLock;
use tower_lsp::lsp_types::Url;

/// Represents an open document in the LSP server
pub struct Document {
    /// The current text content of the document
    text: Arc<SourceText>,
    /// Version reported by the client
    version: i32,
    /// Changed since the last build checked it
    dirty: bool,
}

impl Document {
    pub fn new(text: &str, version: i32) -> Self {
        Self {
            text: Arc::new(SourceText::new(text)),
            version,
            dirty: true,
        }
    }

    pub fn update_text(&mut self, new_text: &str, version: i32) {
        self.text = Arc::new(SourceText::new(new_text));
        self.version = version;
        self.dirty = true;
    }

    pub fn text(&self) -> Arc<SourceText> {
        self.text.clone()
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// All documents opened by the client, keyed by URI
#[derive(Default)]
pub struct DocumentSet {
    documents: DashMap<Url, Document>,
    /// Negotiated during initialize
    encoding: RwLock<PositionEncoding>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position_encoding(&self, encoding: PositionEncoding) {
        *self.encoding.write() = encoding;
    }

    pub fn open(&self, uri: Url, text: &str, version: i32) {
        self.documents.insert(uri, Document::new(text, version));
    }

    /// Replace the text of an open document; unknown documents are opened
    pub fn change(&self, uri: Url, text: &str, version: i32) {
        match self.documents.get_mut(&uri) {
            Some(mut doc) => doc.update_text(text, version),
            None => self.open(uri, text, version),
        }
    }

    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    /// Current text and version of a document
    pub fn snapshot(&self, uri: &Url) -> Option<(Arc<SourceText>, i32)> {
        self.documents
            .get(uri)
            .map(|doc| (doc.text(), doc.version()))
    }

    /// URIs of all open documents in a stable order
    pub fn uris(&self) -> Vec<Url> {
        let mut uris: Vec<Url> = self.documents.iter().map(|entry| entry.key().clone()).collect();
        uris.sort();
        uris
    }

    pub fn dirty_uris(&self) -> Vec<Url> {
        let mut uris: Vec<Url> = self
            .documents
            .iter()
            .filter(|entry| entry.value().is_dirty())
            .map(|entry| entry.key().clone())
            .collect();
        uris.sort();
        uris
    }

    pub fn mark_all_dirty(&self) {
        for mut entry in self.documents.iter_mut() {
            entry.value_mut().dirty = true;
        }
    }

    /// Clear the dirty flag unless the document changed after `version`
    pub fn mark_clean(&self, uri: &Url, version: i32) {
        if let Some(mut doc) = self.documents.get_mut(uri) {
            if doc.version == version {
                doc.dirty = false;
            }
        }
    }
}

impl DocumentStore for DocumentSet {
    fn resolve_document(&self, uri: &Url) -> Result<Arc<SourceText>, ResolveError> {
        self.documents
            .get(uri)
            .map(|doc| doc.text())
            .ok_or_else(|| ResolveError::DocumentNotFound(uri.clone()))
    }

    fn position_encoding(&self) -> PositionEncoding {
        *self.encoding.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///work/{}", name)).unwrap()
    }

    #[test]
    fn test_open_change_close() {
        let docs = DocumentSet::new();
        docs.open(uri("a.kst"), "one", 1);
        docs.change(uri("a.kst"), "two", 2);

        let (text, version) = docs.snapshot(&uri("a.kst")).unwrap();
        assert_eq!(text.chars().iter().collect::<String>(), "two");
        assert_eq!(version, 2);

        docs.close(&uri("a.kst"));
        assert!(!docs.contains(&uri("a.kst")));
        assert_eq!(
            docs.resolve_document(&uri("a.kst")),
            Err(ResolveError::DocumentNotFound(uri("a.kst")))
        );
    }

    #[test]
    fn test_dirty_tracking() {
        let docs = DocumentSet::new();
        docs.open(uri("b.kst"), "b", 1);
        docs.open(uri("a.kst"), "a", 1);
        assert_eq!(docs.dirty_uris(), vec![uri("a.kst"), uri("b.kst")]);

        docs.mark_clean(&uri("a.kst"), 1);
        // stale version does not clear the flag
        docs.mark_clean(&uri("b.kst"), 0);
        assert_eq!(docs.dirty_uris(), vec![uri("b.kst")]);

        docs.mark_all_dirty();
        assert_eq!(docs.dirty_uris().len(), 2);
    }
}
