//! Backward scan locating the call that encloses the cursor
//!
//! The scan only looks at parentheses and commas. Delimiters inside string
//! literals or comments are counted like any other, which can mislead it;
//! the syntax tree check that follows rejects most of those cases.

/// Number of characters examined before giving up
pub const SEARCH_BOUND: usize = 2000;

/// Where the enclosing call starts and which argument the cursor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureContext {
    /// Offset of the `(` opening the enclosing argument list
    pub call_start: Option<usize>,
    /// 0-based argument index; -1 when the cursor sits right after `(`
    pub parameter_index: i32,
}

impl SignatureContext {
    /// Whether the cursor is immediately after the opening delimiter
    pub fn starts_at(&self, cursor: usize) -> bool {
        self.call_start.map(|start| start + 1) == Some(cursor)
    }
}

/// Scan backwards from `cursor` for the unmatched `(` it is enclosed by.
pub fn scan_context(buffer: &[char], cursor: usize) -> SignatureContext {
    let mut depth = 1;
    let mut parameter_index = -1;
    let mut call_start = None;

    let lower = cursor.saturating_sub(SEARCH_BOUND);
    for offset in (lower..cursor).rev() {
        let Some(c) = buffer.get(offset) else {
            continue;
        };
        match c {
            ')' => depth += 1,
            '(' => depth -= 1,
            ',' if depth == 1 => parameter_index += 1,
            _ => {}
        }
        if depth == 0 {
            call_start = Some(offset);
            break;
        }
    }

    let mut context = SignatureContext {
        call_start,
        parameter_index,
    };
    // Unless the cursor is right at the delimiter, assume an argument is being typed
    if !context.starts_at(cursor) {
        context.parameter_index += 1;
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scan `text` with the cursor at the `|` marker
    fn scan(text: &str) -> SignatureContext {
        let cursor = text.chars().position(|c| c == '|').unwrap();
        let chars: Vec<char> = text.chars().filter(|c| *c != '|').collect();
        scan_context(&chars, cursor)
    }

    #[test]
    fn test_cursor_right_after_paren() {
        let context = scan("foo(|)");
        assert_eq!(context.call_start, Some(3));
        assert_eq!(context.parameter_index, -1);
        assert!(context.starts_at(4));
    }

    #[test]
    fn test_third_argument_slot() {
        let context = scan("foo(a, b, |)");
        assert_eq!(context.call_start, Some(3));
        assert_eq!(context.parameter_index, 2);
    }

    #[test]
    fn test_typing_first_argument() {
        let context = scan("foo(ab|");
        assert_eq!(context.call_start, Some(3));
        assert_eq!(context.parameter_index, 0);
    }

    #[test]
    fn test_nested_call_commas_ignored() {
        let context = scan("outer(a, inner(b, c), |");
        assert_eq!(context.call_start, Some(5));
        assert_eq!(context.parameter_index, 2);
    }

    #[test]
    fn test_cursor_inside_nested_call() {
        let context = scan("outer(a, inner(b, |");
        assert_eq!(context.call_start, Some(14));
        assert_eq!(context.parameter_index, 1);
    }

    #[test]
    fn test_whitespace_after_paren_counts_as_typing() {
        let context = scan("foo( |");
        assert_eq!(context.call_start, Some(3));
        assert_eq!(context.parameter_index, 0);
    }

    #[test]
    fn test_no_enclosing_call() {
        let context = scan("let x = (1 + 2) * 3|");
        assert_eq!(context.call_start, None);
    }

    #[test]
    fn test_commas_in_string_literals_are_counted() {
        let context = scan("foo(\"a,b\", |");
        assert_eq!(context.parameter_index, 2);
    }

    #[test]
    fn test_paren_beyond_search_bound_is_not_found() {
        let mut text = String::from("foo(");
        text.push_str(&"x".repeat(SEARCH_BOUND));
        let chars: Vec<char> = text.chars().collect();
        let context = scan_context(&chars, chars.len());
        assert_eq!(context.call_start, None);
    }

    #[test]
    fn test_paren_at_edge_of_search_bound_is_found() {
        let mut text = String::from("foo(");
        text.push_str(&"x".repeat(SEARCH_BOUND - 1));
        let chars: Vec<char> = text.chars().collect();
        let context = scan_context(&chars, chars.len());
        assert_eq!(context.call_start, Some(3));
    }

    #[test]
    fn test_cursor_past_end_of_buffer() {
        let chars: Vec<char> = "foo(a, ".chars().collect();
        let context = scan_context(&chars, chars.len() + 3);
        assert_eq!(context.call_start, Some(3));
        assert_eq!(context.parameter_index, 1);
    }

    #[test]
    fn test_cursor_at_start() {
        let context = scan_context(&[], 0);
        assert_eq!(context.call_start, None);
    }
}
