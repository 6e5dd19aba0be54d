//! Exclusion glob matching
//!
//! `*` matches any run of characters including separators, `?` exactly one
//! character, everything else literally. Matching is case-insensitive and
//! anchored to the whole `/`-separated relative path.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Compiled set of exclusion globs.
#[derive(Debug, Clone, Default)]
pub struct GlobMatcher {
    patterns: Vec<Regex>,
}

impl GlobMatcher {
    /// Compile `patterns`, dropping blank ones.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(AsRef::as_ref)
            .filter(|p| !p.trim().is_empty())
            .filter_map(|p| match compile(p) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    warn!(pattern = p, error = %err, "glob.compile_failed");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when any pattern matches `relative_path`.
    pub fn is_match(&self, relative_path: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(relative_path))
    }
}

/// Single-pattern check. A blank pattern never matches.
pub fn is_match(pattern: &str, input: &str) -> bool {
    if pattern.trim().is_empty() {
        return false;
    }
    compile(pattern).is_ok_and(|regex| regex.is_match(input))
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len() + 8);
    let mut buf = [0u8; 4];
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    source.push('$');

    RegexBuilder::new(&source).case_insensitive(true).dot_matches_new_line(true).build()
}
