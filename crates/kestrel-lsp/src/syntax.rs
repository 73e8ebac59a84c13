//! Shallow structural parser
//!
//! Recognises delimiter structure only: call expressions, blocks, other
//! bracketed groups, and `#name(...)` member references inside block
//! comments. It also collects declarations (`name(params) {`) and reports
//! unbalanced delimiters, which the build engine turns into markers.

use std::sync::Arc;

use dashmap::DashMap;
use kestrel_lsp_core::{
    CancellationToken, NodeKind, ResolveError, SourceText, SyntaxTree, SyntaxTreeProvider,
    WaitPolicy,
};
use tower_lsp::lsp_types::Url;

use crate::document::DocumentSet;

/// Identifiers that are followed by a parenthesised group rather than a call
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "while", "for", "switch", "catch", "return", "match", "synchronized",
];

/// Keywords introducing a function declaration
const DECLARATION_KEYWORDS: &[&str] = &["fn", "function", "def"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
}

/// A function declared in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub parameters: Vec<String>,
    pub offset: usize,
}

impl Declaration {
    pub fn label(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Unclosed { delimiter: char, offset: usize },
    Unexpected { delimiter: char, offset: usize },
}

impl Problem {
    pub fn offset(&self) -> usize {
        match self {
            Problem::Unclosed { offset, .. } | Problem::Unexpected { offset, .. } => *offset,
        }
    }

    /// Marker code reported for this problem
    pub fn code(&self) -> i32 {
        match self {
            Problem::Unclosed { .. } => 1,
            Problem::Unexpected { .. } => 2,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Problem::Unclosed { delimiter, .. } => format!("unclosed '{}'", delimiter),
            Problem::Unexpected { delimiter, .. } => format!("unexpected '{}'", delimiter),
        }
    }
}

/// Result of parsing one document
#[derive(Debug, Default)]
pub struct ParsedTree {
    nodes: Vec<Node>,
    declarations: Vec<Declaration>,
    problems: Vec<Problem>,
    len: usize,
}

impl ParsedTree {
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }
}

impl SyntaxTree for ParsedTree {
    fn covering_node(&self, offset: usize, length: usize) -> Option<NodeKind> {
        let end = offset + length.max(1);
        self.nodes
            .iter()
            .filter(|node| node.start <= offset && end <= node.end)
            .min_by_key(|node| node.end - node.start)
            .map(|node| node.kind)
            // the document itself
            .or_else(|| (offset <= self.len).then_some(NodeKind::Other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Call,
    Declaration,
    Block,
    Other,
}

struct Open {
    delimiter: char,
    offset: usize,
    node_start: usize,
    kind: GroupKind,
    /// Offsets of the commas directly inside this group
    commas: Vec<usize>,
    has_content: bool,
    name: Option<String>,
}

fn closer_of(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Identifier ending right before `end`, skipping whitespace
fn identifier_before(chars: &[char], end: usize) -> Option<(usize, String)> {
    let mut ident_end = end;
    while ident_end > 0 && chars[ident_end - 1].is_whitespace() {
        ident_end -= 1;
    }
    let mut ident_start = ident_end;
    while ident_start > 0 && is_identifier_char(chars[ident_start - 1]) {
        ident_start -= 1;
    }
    if ident_start == ident_end {
        return None;
    }
    Some((ident_start, chars[ident_start..ident_end].iter().collect()))
}

/// Name of the function whose argument list opens right before `offset`
pub fn callee_name(chars: &[char], offset: usize) -> Option<String> {
    let paren = offset.checked_sub(1)?;
    if chars.get(paren) != Some(&'(') {
        return None;
    }
    identifier_before(chars, paren).map(|(_, name)| name)
}

struct Parser<'a> {
    chars: &'a [char],
    stack: Vec<Open>,
    tree: ParsedTree,
}

impl<'a> Parser<'a> {
    fn new(chars: &'a [char]) -> Self {
        Self {
            chars,
            stack: Vec::new(),
            tree: ParsedTree {
                len: chars.len(),
                ..Default::default()
            },
        }
    }

    fn run(mut self) -> ParsedTree {
        let chars = self.chars;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '/' if chars.get(i + 1) == Some(&'/') => {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    i = self.block_comment(i + 2);
                    continue;
                }
                '"' | '\'' => {
                    self.mark_content();
                    i = self.string_literal(i + 1, c);
                    continue;
                }
                '(' | '[' | '{' => self.open(i, c),
                ')' | ']' | '}' => self.close(i, c),
                ',' => {
                    if let Some(top) = self.stack.last_mut() {
                        top.commas.push(i);
                    }
                }
                c if !c.is_whitespace() => self.mark_content(),
                _ => {}
            }
            i += 1;
        }

        while let Some(open) = self.stack.pop() {
            self.tree.problems.push(Problem::Unclosed {
                delimiter: open.delimiter,
                offset: open.offset,
            });
            self.finish(open, chars.len(), false);
        }
        self.tree.problems.sort_by_key(Problem::offset);
        self.tree
    }

    fn mark_content(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.has_content = true;
        }
    }

    /// Skip a literal starting after its opening quote; returns the next offset
    fn string_literal(&mut self, mut i: usize, quote: char) -> usize {
        let chars = self.chars;
        while i < chars.len() {
            match chars[i] {
                '\\' => i += 1,
                '\n' => return i,
                c if c == quote => return i + 1,
                _ => {}
            }
            i += 1;
        }
        i
    }

    /// Skip a block comment, recording member references; returns the next offset
    fn block_comment(&mut self, mut i: usize) -> usize {
        let chars = self.chars;
        while i < chars.len() {
            if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                return i + 2;
            }
            if chars[i] == '#' {
                if let Some(next) = self.member_ref(i) {
                    i = next;
                    continue;
                }
            }
            i += 1;
        }
        i
    }

    /// Parse `#name(a, b)` at `hash`; returns the offset after `)`
    fn member_ref(&mut self, hash: usize) -> Option<usize> {
        let chars = self.chars;
        let mut i = hash + 1;
        while i < chars.len() && is_identifier_char(chars[i]) {
            i += 1;
        }
        if i == hash + 1 || chars.get(i) != Some(&'(') {
            return None;
        }

        let mut commas = 0;
        let mut has_content = false;
        let mut j = i + 1;
        while j < chars.len() && chars[j] != ')' {
            if chars[j] == '*' && chars.get(j + 1) == Some(&'/') {
                return None;
            }
            match chars[j] {
                ',' => commas += 1,
                c if !c.is_whitespace() => has_content = true,
                _ => {}
            }
            j += 1;
        }
        if j == chars.len() {
            return None;
        }

        let parameters = if has_content { commas + 1 } else { 0 };
        self.tree.nodes.push(Node {
            kind: NodeKind::MemberRef { parameters },
            start: hash,
            end: j + 1,
        });
        Some(j + 1)
    }

    fn open(&mut self, offset: usize, delimiter: char) {
        self.mark_content();

        let mut node_start = offset;
        let mut name = None;
        let kind = match delimiter {
            '{' => GroupKind::Block,
            '[' => GroupKind::Other,
            _ => match identifier_before(self.chars, offset) {
                Some((_, ident)) if CONTROL_KEYWORDS.contains(&ident.as_str()) => GroupKind::Other,
                Some((start, ident)) => {
                    node_start = start;
                    let declared = identifier_before(self.chars, start)
                        .map_or(false, |(_, keyword)| DECLARATION_KEYWORDS.contains(&keyword.as_str()));
                    name = Some(ident);
                    if declared {
                        GroupKind::Declaration
                    } else {
                        GroupKind::Call
                    }
                }
                None => GroupKind::Other,
            },
        };

        self.stack.push(Open {
            delimiter,
            offset,
            node_start,
            kind,
            commas: Vec::new(),
            has_content: false,
            name,
        });
    }

    fn close(&mut self, offset: usize, delimiter: char) {
        let matching = self
            .stack
            .iter()
            .rposition(|open| closer_of(open.delimiter) == delimiter);
        let Some(index) = matching else {
            self.tree.problems.push(Problem::Unexpected { delimiter, offset });
            return;
        };

        // groups left open inside the matched one end here
        while self.stack.len() > index + 1 {
            if let Some(open) = self.stack.pop() {
                self.tree.problems.push(Problem::Unclosed {
                    delimiter: open.delimiter,
                    offset: open.offset,
                });
                self.finish(open, offset, false);
            }
        }
        if let Some(open) = self.stack.pop() {
            self.finish(open, offset + 1, true);
        }
    }

    fn finish(&mut self, open: Open, end: usize, closed: bool) {
        let arguments = if open.has_content {
            open.commas.len() + 1
        } else {
            0
        };

        let declares = match open.kind {
            GroupKind::Declaration => true,
            GroupKind::Call => closed && self.next_is_brace(end),
            GroupKind::Block | GroupKind::Other => false,
        };

        // a parameter list is not a call site
        let kind = match open.kind {
            GroupKind::Call if !declares => NodeKind::Call {
                arguments: closed.then_some(arguments),
            },
            GroupKind::Block => NodeKind::Block,
            _ => NodeKind::Other,
        };

        if closed && declares {
            if let Some(name) = &open.name {
                let parameters = self.parameters(&open, end - 1);
                self.tree.declarations.push(Declaration {
                    name: name.clone(),
                    parameters,
                    offset: open.node_start,
                });
            }
        }

        self.tree.nodes.push(Node {
            kind,
            start: open.node_start,
            end,
        });
    }

    fn next_is_brace(&self, from: usize) -> bool {
        self.chars[from.min(self.chars.len())..]
            .iter()
            .find(|c| !c.is_whitespace())
            == Some(&'{')
    }

    /// Parameter texts between the parentheses of `open`, closing at `close`
    fn parameters(&self, open: &Open, close: usize) -> Vec<String> {
        if !open.has_content {
            return Vec::new();
        }
        let mut bounds = vec![open.offset];
        bounds.extend(open.commas.iter().copied());
        bounds.push(close);
        bounds
            .windows(2)
            .map(|pair| {
                self.chars[pair[0] + 1..pair[1]]
                    .iter()
                    .collect::<String>()
                    .trim()
                    .to_string()
            })
            .collect()
    }
}

/// Parse a document's delimiter structure
pub fn parse(text: &SourceText) -> ParsedTree {
    Parser::new(text.chars()).run()
}

/// Parsed trees for open documents, cached per document version
pub struct SyntaxTrees {
    documents: Arc<DocumentSet>,
    cache: DashMap<Url, (i32, Arc<ParsedTree>)>,
}

impl SyntaxTrees {
    pub fn new(documents: Arc<DocumentSet>) -> Self {
        Self {
            documents,
            cache: DashMap::new(),
        }
    }

    /// Tree for the current version of `uri`
    pub fn parsed(&self, uri: &Url, wait: WaitPolicy) -> Result<Arc<ParsedTree>, ResolveError> {
        let (text, version) = self
            .documents
            .snapshot(uri)
            .ok_or_else(|| ResolveError::DocumentNotFound(uri.clone()))?;

        if let Some(entry) = self.cache.get(uri) {
            let (cached_version, tree) = entry.value();
            if *cached_version == version {
                return Ok(tree.clone());
            }
        }

        if wait == WaitPolicy::IfReady {
            return Err(ResolveError::TreeUnavailable(uri.clone()));
        }

        let tree = Arc::new(parse(&text));
        self.cache.insert(uri.clone(), (version, tree.clone()));
        Ok(tree)
    }

    pub fn evict(&self, uri: &Url) {
        self.cache.remove(uri);
    }
}

impl SyntaxTreeProvider for SyntaxTrees {
    fn tree(
        &self,
        uri: &Url,
        wait: WaitPolicy,
        token: &CancellationToken,
    ) -> Result<Arc<dyn SyntaxTree>, ResolveError> {
        if token.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let tree: Arc<dyn SyntaxTree> = self.parsed(uri, wait)?;
        Ok(tree)
    }
}
