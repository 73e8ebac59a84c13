//! Character-indexed document text

use std::sync::Arc;

use lsp_types::{PositionEncodingKind, Url};

use crate::error::ResolveError;

/// Unit in which LSP `character` positions are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionEncoding {
    /// The protocol default
    #[default]
    Utf16,
    /// One unit per character
    Utf32,
}

impl PositionEncoding {
    /// Pick UTF-32 when the client offers it, else fall back to UTF-16
    pub fn negotiate(offered: Option<&[PositionEncodingKind]>) -> Self {
        match offered {
            Some(kinds) if kinds.contains(&PositionEncodingKind::UTF32) => Self::Utf32,
            _ => Self::Utf16,
        }
    }

    pub fn kind(self) -> PositionEncodingKind {
        match self {
            Self::Utf16 => PositionEncodingKind::UTF16,
            Self::Utf32 => PositionEncodingKind::UTF32,
        }
    }

    fn units(self, c: char) -> usize {
        match self {
            Self::Utf16 => c.len_utf16(),
            Self::Utf32 => 1,
        }
    }
}

/// Immutable document text addressed by character offsets.
///
/// Flat offsets count characters from the start of the text. LSP positions
/// are converted from the negotiated [`PositionEncoding`]; the plain
/// `offset_at`/`position_at` pair counts characters within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    chars: Vec<char>,
    /// Offset of the first character of every line
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        for (idx, c) in chars.iter().enumerate() {
            if *c == '\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { chars, line_starts }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// First and one-past-last offset of `line`, without its line break
    fn line_bounds(&self, line: u32) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line as usize)?;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map(|next| next - 1)
            .unwrap_or(self.chars.len());
        Some((start, end))
    }

    /// Convert a 0-based line/character position to a flat offset
    pub fn offset_at(&self, line: u32, character: u32) -> Result<usize, ResolveError> {
        self.offset_at_encoded(line, character, PositionEncoding::Utf32)
    }

    /// Convert a position counted in `encoding` units to a flat offset.
    /// A column inside a surrogate pair resolves to the following character.
    pub fn offset_at_encoded(
        &self,
        line: u32,
        character: u32,
        encoding: PositionEncoding,
    ) -> Result<usize, ResolveError> {
        let out_of_range = ResolveError::PositionOutOfRange { line, character };
        let (start, end) = self.line_bounds(line).ok_or(out_of_range.clone())?;

        let target = character as usize;
        let mut units = 0;
        for offset in start..end {
            if units >= target {
                return Ok(offset);
            }
            units += encoding.units(self.chars[offset]);
        }
        if units >= target {
            Ok(end)
        } else {
            Err(out_of_range)
        }
    }

    /// Convert a flat offset to a 0-based (line, character) pair.
    /// Offsets past the end map to the end of the last line.
    pub fn position_at(&self, offset: usize) -> (u32, u32) {
        self.position_at_encoded(offset, PositionEncoding::Utf32)
    }

    pub fn position_at_encoded(&self, offset: usize, encoding: PositionEncoding) -> (u32, u32) {
        let offset = offset.min(self.chars.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column: usize = self.chars[self.line_starts[line]..offset]
            .iter()
            .map(|c| encoding.units(*c))
            .sum();
        (line as u32, column as u32)
    }
}

/// Access to the current text of documents known to the server
pub trait DocumentStore: Send + Sync {
    fn resolve_document(&self, uri: &Url) -> Result<Arc<SourceText>, ResolveError>;

    /// Encoding of the positions clients send for these documents
    fn position_encoding(&self) -> PositionEncoding;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_at() {
        let text = SourceText::new("let a = 1\nmax(a, 2)\n");
        assert_eq!(text.offset_at(0, 0), Ok(0));
        assert_eq!(text.offset_at(1, 4), Ok(14));
        assert_eq!(text.char_at(13), Some('('));
        // end of line is a valid cursor position
        assert_eq!(text.offset_at(0, 9), Ok(9));
        assert_eq!(text.offset_at(2, 0), Ok(20));
    }

    #[test]
    fn test_offset_at_out_of_range() {
        let text = SourceText::new("abc\nde");
        assert_eq!(
            text.offset_at(0, 4),
            Err(ResolveError::PositionOutOfRange {
                line: 0,
                character: 4
            })
        );
        assert!(text.offset_at(5, 0).is_err());
    }

    #[test]
    fn test_position_at() {
        let text = SourceText::new("ab\ncd\n");
        assert_eq!(text.position_at(0), (0, 0));
        assert_eq!(text.position_at(3), (1, 0));
        assert_eq!(text.position_at(4), (1, 1));
        assert_eq!(text.position_at(100), (2, 0));
    }

    #[test]
    fn test_utf16_columns_count_surrogate_pairs() {
        // '😀' is one char but two UTF-16 units
        let text = SourceText::new("😀(a, \nb");
        assert_eq!(text.offset_at_encoded(0, 3, PositionEncoding::Utf16), Ok(2));
        assert_eq!(text.offset_at_encoded(0, 2, PositionEncoding::Utf32), Ok(2));
        assert_eq!(text.offset_at_encoded(0, 6, PositionEncoding::Utf16), Ok(5));
        // inside the pair
        assert_eq!(text.offset_at_encoded(0, 1, PositionEncoding::Utf16), Ok(1));
        assert!(text.offset_at_encoded(0, 7, PositionEncoding::Utf16).is_err());

        assert_eq!(text.position_at_encoded(2, PositionEncoding::Utf16), (0, 3));
        assert_eq!(text.position_at_encoded(2, PositionEncoding::Utf32), (0, 2));
        assert_eq!(text.position_at_encoded(7, PositionEncoding::Utf16), (1, 1));
    }

    #[test]
    fn test_negotiate_encoding() {
        assert_eq!(PositionEncoding::negotiate(None), PositionEncoding::Utf16);
        let offered = [PositionEncodingKind::UTF8, PositionEncodingKind::UTF32];
        assert_eq!(
            PositionEncoding::negotiate(Some(&offered)),
            PositionEncoding::Utf32
        );
        let offered = [PositionEncodingKind::UTF16];
        assert_eq!(
            PositionEncoding::negotiate(Some(&offered)),
            PositionEncoding::Utf16
        );
        assert_eq!(PositionEncoding::Utf32.kind(), PositionEncodingKind::UTF32);
    }

    #[test]
    fn test_multibyte_characters_count_once() {
        let text = SourceText::new("é(ü, ");
        assert_eq!(text.len(), 5);
        assert_eq!(text.char_at(1), Some('('));
        assert_eq!(text.offset_at(0, 5), Ok(5));
    }
}
