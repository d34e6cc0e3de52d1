//! Wildcard matching for ignore/keep pattern lists.
//!
//! Supports:
//! - `*` - matches any run of characters
//! - `?` - matches any single character
//! - `[...]` - character classes with ranges and `!`/`^` negation
//!
//! A path whose first character is `.` is only matched by a pattern whose
//! first character is a literal `.`.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Read an order/ignore/keep spec file: one entry per line, whitespace
/// trimmed, empty lines skipped.
pub fn read_spec_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(Error::InvalidInputFile)?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// An ordered list of wildcard patterns; a path matches the list if it
/// matches any pattern in it.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<String>,
}

impl PatternList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pattern: impl Into<String>) {
        self.patterns.push(pattern.into());
    }

    /// Append every pattern found in a spec file.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let patterns = read_spec_file(path)?;
        debug!(
            "loaded {} patterns from {}",
            patterns.len(),
            path.display()
        );

        self.patterns.extend(patterns);
        Ok(())
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| wildcard_match(p, path))
    }
}

/// Check whether a path matches a single wildcard pattern.
pub fn wildcard_match(pattern: &str, path: &str) -> bool {
    let pattern = pattern.as_bytes();
    let path = path.as_bytes();

    // Leading-period rule: a wildcard never matches a hidden name's dot.
    if path.first() == Some(&b'.') && pattern.first() != Some(&b'.') {
        return false;
    }

    match_bytes(pattern, path)
}

fn match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => (0..=text.len()).any(|skip| match_bytes(&pattern[1..], &text[skip..])),
        Some(b'?') => !text.is_empty() && match_bytes(&pattern[1..], &text[1..]),
        Some(b'[') => match text.first().and_then(|&c| match_class(&pattern[1..], c)) {
            Some((true, consumed)) => match_bytes(&pattern[1 + consumed..], &text[1..]),
            Some((false, _)) => false,
            // No closing bracket, or empty text: treat '[' as a literal.
            None => {
                !text.is_empty() && text[0] == b'[' && match_bytes(&pattern[1..], &text[1..])
            }
        },
        Some(&c) => !text.is_empty() && text[0] == c && match_bytes(&pattern[1..], &text[1..]),
    }
}

/// Match `c` against a character class. `pattern` starts just past the `[`;
/// returns the verdict and the number of pattern bytes consumed including
/// the closing `]`, or `None` when the class is unterminated.
fn match_class(pattern: &[u8], c: u8) -> Option<(bool, usize)> {
    let mut i = 0;
    let negated = matches!(pattern.first(), Some(b'!') | Some(b'^'));
    if negated {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pattern.len() {
        if pattern[i] == b']' && !first {
            return Some((matched != negated, i + 1));
        }
        first = false;

        if i + 2 < pattern.len() && pattern[i + 1] == b'-' && pattern[i + 2] != b']' {
            if pattern[i] <= c && c <= pattern[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if pattern[i] == c {
                matched = true;
            }
            i += 1;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(wildcard_match("data.bin", "data.bin"));
        assert!(!wildcard_match("data.bin", "data.pal"));
    }

    #[test]
    fn test_star() {
        assert!(wildcard_match("*.bin", "data.bin"));
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("a*c", "abc"));
        assert!(wildcard_match("a*c", "ac"));
        assert!(!wildcard_match("*.bin", "data.pal"));
    }

    #[test]
    fn test_star_crosses_separators() {
        // No path-segment semantics; a star spans directory separators.
        assert!(wildcard_match("*.bin", "maps/area0/data.bin"));
        assert!(wildcard_match("maps/*", "maps/area0/data.bin"));
    }

    #[test]
    fn test_question_mark() {
        assert!(wildcard_match("data_?.bin", "data_0.bin"));
        assert!(!wildcard_match("data_?.bin", "data_10.bin"));
        assert!(!wildcard_match("?", ""));
    }

    #[test]
    fn test_character_class() {
        assert!(wildcard_match("data_[0-9].bin", "data_3.bin"));
        assert!(!wildcard_match("data_[0-9].bin", "data_x.bin"));
        assert!(wildcard_match("[abc]*", "banana"));
        assert!(wildcard_match("[!abc]*", "data"));
        assert!(!wildcard_match("[!abc]*", "apple"));
        assert!(wildcard_match("[^abc]*", "data"));
    }

    #[test]
    fn test_class_first_bracket_literal() {
        // ']' as the first member is a literal member, not a terminator.
        assert!(wildcard_match("[]x]", "]"));
        assert!(wildcard_match("[]x]", "x"));
    }

    #[test]
    fn test_unterminated_class_is_literal() {
        assert!(wildcard_match("a[b", "a[b"));
        assert!(!wildcard_match("a[b", "ab"));
    }

    #[test]
    fn test_leading_period() {
        assert!(!wildcard_match("*", ".hidden"));
        assert!(!wildcard_match("*.narcorder", ".narcorder"));
        assert!(!wildcard_match("?narcorder", ".narcorder"));
        assert!(wildcard_match(".narcorder", ".narcorder"));
        assert!(wildcard_match(".*", ".hidden"));
        // The rule only protects the first character.
        assert!(wildcard_match("data*", "data.bin"));
    }

    #[test]
    fn test_pattern_list() {
        let mut list = PatternList::new();
        list.push("*.bin");
        list.push("*.pal");

        assert!(list.matches("data.bin"));
        assert!(list.matches("tiles.pal"));
        assert!(!list.matches("notes.txt"));
        assert!(!PatternList::new().matches("data.bin"));
    }

    #[test]
    fn test_read_spec_file() -> crate::error::Result<()> {
        let dir = tempfile::tempdir().map_err(crate::error::Error::InvalidInputFile)?;
        let path = dir.path().join("ignore.txt");
        std::fs::write(&path, "  *.bak  \n\n*.tmp\n   \n")
            .map_err(crate::error::Error::InvalidInputFile)?;

        assert_eq!(read_spec_file(&path)?, vec!["*.bak", "*.tmp"]);
        assert!(read_spec_file(&dir.path().join("missing.txt")).is_err());

        Ok(())
    }
}
