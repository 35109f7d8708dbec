//! Exclude-pattern matching.
//!
//! Patterns are shell globs matched against a file's base name only:
//! `*` matches any run of characters, `?` exactly one, and `[seq]` / `[!seq]`
//! character classes work as in fnmatch. A `[` that opens no complete class
//! matches a literal `[`, and the rest of the pattern keeps its wildcards.
//!
//! Matching is case-sensitive on Unix-like hosts and case-insensitive on
//! Windows, following the host's own filename rules (see `CASE_SENSITIVE`).

use glob::{MatchOptions, Pattern};
use tracing::debug;

/// Whether pattern matching distinguishes upper and lower case on this host.
pub const CASE_SENSITIVE: bool = !cfg!(windows);

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: CASE_SENSITIVE,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Split a comma-separated pattern list as typed by the user.
///
/// Entries are trimmed and empty entries dropped; order is kept.
pub fn parse_patterns(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render patterns back into the comma-joined form stored in snapshots.
pub fn join_patterns<S: AsRef<str>>(patterns: &[S]) -> String {
    patterns
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A compiled set of exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct ExcludeMatcher {
    patterns: Vec<Pattern>,
}

impl ExcludeMatcher {
    /// Compile patterns; blank entries are ignored.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .filter_map(compile)
            .collect();
        ExcludeMatcher { patterns }
    }

    /// Compile a raw comma-separated list.
    pub fn parse(input: &str) -> Self {
        Self::new(&parse_patterns(input))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if `name` matches any pattern. An empty set excludes nothing.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }
}

fn compile(pattern: &str) -> Option<Pattern> {
    // `**` means the same as `*` for a single name; glob only accepts it
    // as a whole path component
    let mut collapsed = pattern.to_string();
    while collapsed.contains("**") {
        collapsed = collapsed.replace("**", "*");
    }

    match Pattern::new(&collapsed) {
        Ok(compiled) => Some(compiled),
        Err(e) => {
            debug!(pattern, error = %e, "Invalid glob syntax, escaping unclosed brackets");
            Pattern::new(&escape_unclosed_brackets(&collapsed))
                .or_else(|_| Pattern::new(&Pattern::escape(pattern)))
                .ok()
        }
    }
}

/// Rewrite every `[` that starts no complete class as the literal `[[]`.
///
/// A class may open with `!` and its first member may be `]`, so `[]]` and
/// `[!]]` are complete while `[` and `[!]` are not. Wildcards elsewhere in
/// the pattern keep their meaning.
fn escape_unclosed_brackets(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut escaped = String::with_capacity(pattern.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '[' {
            escaped.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        if chars.get(j) == Some(&'!') {
            j += 1;
        }
        if chars.get(j) == Some(&']') {
            j += 1;
        }
        match chars[j.min(chars.len())..].iter().position(|&c| c == ']') {
            Some(offset) => {
                let end = j + offset;
                escaped.extend(&chars[i..=end]);
                i = end + 1;
            }
            None => {
                escaped.push_str("[[]");
                i += 1;
            }
        }
    }

    escaped
}

/// One-shot form of `ExcludeMatcher::is_excluded`.
pub fn is_excluded<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    ExcludeMatcher::new(patterns).is_excluded(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patterns_trims_and_drops_empty() {
        assert_eq!(
            parse_patterns(" *.tmp, ,*.log ,,thumbs.db "),
            vec!["*.tmp", "*.log", "thumbs.db"]
        );
        assert!(parse_patterns("").is_empty());
        assert!(parse_patterns(" , ,").is_empty());
    }

    #[test]
    fn test_join_patterns() {
        assert_eq!(join_patterns(&["*.tmp", "*.log"]), "*.tmp, *.log");
        assert_eq!(join_patterns::<&str>(&[]), "");
        assert_eq!(parse_patterns(&join_patterns(&["a*", "?b"])), vec!["a*", "?b"]);
    }

    #[test]
    fn test_star_matches_any_run() {
        assert!(is_excluded("a.txt", &["*.txt"]));
        assert!(is_excluded(".txt", &["*.txt"]));
        assert!(!is_excluded("a.txtx", &["*.txt"]));
        assert!(!is_excluded("a.txt.bak", &["*.txt"]));
    }

    #[test]
    fn test_question_mark_matches_exactly_one() {
        assert!(is_excluded("ab.doc", &["??.doc"]));
        assert!(!is_excluded("a.doc", &["??.doc"]));
        assert!(!is_excluded("abc.doc", &["??.doc"]));
        assert!(is_excluded("list1.txt", &["list?.txt"]));
    }

    #[test]
    fn test_character_classes() {
        assert!(is_excluded("file1.log", &["file[0-9].log"]));
        assert!(!is_excluded("filex.log", &["file[0-9].log"]));
        assert!(is_excluded("filex.log", &["file[!0-9].log"]));
    }

    #[test]
    fn test_literal_names_and_hidden_files() {
        assert!(is_excluded("thumbs.db", &["thumbs.db"]));
        assert!(!is_excluded("thumbs.db2", &["thumbs.db"]));
        // Leading dots are not special
        assert!(is_excluded(".DS_Store", &["*Store"]));
    }

    #[test]
    fn test_any_pattern_excludes() {
        let matcher = ExcludeMatcher::parse("*.tmp, *.log");
        assert!(matcher.is_excluded("x.tmp"));
        assert!(matcher.is_excluded("y.log"));
        assert!(!matcher.is_excluded("z.txt"));
    }

    #[test]
    fn test_no_patterns_excludes_nothing() {
        let matcher = ExcludeMatcher::parse("");
        assert!(matcher.is_empty());
        assert!(!matcher.is_excluded("anything"));
        assert!(!is_excluded::<&str>("anything", &[]));
    }

    #[test]
    fn test_repeated_stars() {
        assert!(is_excluded("backup.bak", &["back**.bak"]));
        assert!(is_excluded("x", &["**"]));
    }

    #[test]
    fn test_invalid_glob_matches_literally() {
        assert!(is_excluded("[draft", &["[draft"]));
        assert!(!is_excluded("draft", &["[draft"]));
    }

    #[test]
    fn test_unclosed_bracket_keeps_wildcards() {
        assert!(is_excluded("x[", &["*["]));
        assert!(is_excluded("a[bc", &["?[bc"]));
        assert!(is_excluded("report[v2.txt", &["*[v2.txt"]));
        assert!(!is_excluded("report.txt", &["*[v2.txt"]));
        // A complete class next to a stray bracket still works as a class
        assert!(is_excluded("a1[", &["a[0-9]["]));
        assert!(!is_excluded("ax[", &["a[0-9]["]));
    }

    #[test]
    fn test_escape_unclosed_brackets() {
        assert_eq!(escape_unclosed_brackets("*["), "*[[]");
        assert_eq!(escape_unclosed_brackets("[!]"), "[[]!]");
        assert_eq!(escape_unclosed_brackets("[]]["), "[]][[]");
        assert_eq!(escape_unclosed_brackets("[a-z]*"), "[a-z]*");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(CASE_SENSITIVE);
        assert!(!is_excluded("REPORT.TXT", &["*.txt"]));
        assert!(is_excluded("report.txt", &["*.txt"]));
    }

    #[cfg(windows)]
    #[test]
    fn test_matching_ignores_case() {
        assert!(!CASE_SENSITIVE);
        assert!(is_excluded("REPORT.TXT", &["*.txt"]));
    }
}
