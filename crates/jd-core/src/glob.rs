//! # Name Globs
//!
//! Stream-name patterns use `*` as the only wildcard. Every other character
//! is literal, matching is case-sensitive and anchored to the whole name.

use regex::Regex;

/// Translate a glob into an anchored regular expression.
pub fn glob_to_regex(pattern: &str) -> String {
    let body: Vec<String> = pattern.split('*').map(regex::escape).collect();
    format!("^{}$", body.join(".*"))
}

/// Compiled name pattern.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    /// `*` or empty pattern.
    All,
    Pattern(Regex),
    /// The pattern could not be compiled; matches nothing.
    Never,
}

impl NameMatcher {
    pub fn new(pattern: &str) -> Self {
        if pattern.is_empty() || pattern == "*" {
            return Self::All;
        }
        match Regex::new(&glob_to_regex(pattern)) {
            Ok(re) => Self::Pattern(re),
            Err(_) => Self::Never,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Pattern(re) => re.is_match(name),
            Self::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_to_regex_escapes_literals() {
        assert_eq!(glob_to_regex("a.b"), "^a\\.b$");
        assert_eq!(glob_to_regex("a*b*"), "^a.*b.*$");
    }

    #[test]
    fn test_star_and_empty_match_everything() {
        assert!(NameMatcher::new("*").matches("anything"));
        assert!(NameMatcher::new("").matches(""));
    }

    #[test]
    fn test_prefix_suffix_and_infix() {
        let m = NameMatcher::new("order-*");
        assert!(m.matches("order-processing"));
        assert!(m.matches("order-"));
        assert!(!m.matches("my-order-processing"));

        let m = NameMatcher::new("*-events");
        assert!(m.matches("user-events"));
        assert!(!m.matches("user-events-dlq"));

        let m = NameMatcher::new("a*b*c");
        assert!(m.matches("abc"));
        assert!(m.matches("a--b--c"));
        assert!(!m.matches("a--c--b"));
    }

    #[test]
    fn test_exact_name_is_case_sensitive() {
        let m = NameMatcher::new("Orders");
        assert!(m.matches("Orders"));
        assert!(!m.matches("orders"));
        assert!(!m.matches("Orders2"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let m = NameMatcher::new("orders.v1");
        assert!(m.matches("orders.v1"));
        assert!(!m.matches("ordersXv1"));

        let m = NameMatcher::new("jobs(*)");
        assert!(m.matches("jobs(nightly)"));
        assert!(!m.matches("jobs"));
    }
}
