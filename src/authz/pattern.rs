//! Glob-style path patterns and their precedence.
//!
//! Patterns use `globset` syntax with a literal separator:
//!
//! - `*` matches within one path segment
//! - `?` matches a single character other than `/`
//! - `**` as a whole segment matches zero or more segments
//! - `[abc]` classes and `{a,b}` alternation are accepted
//!
//! A pattern ending in `/**` also matches its bare prefix, so `/admin/**`
//! covers `/admin` as well as `/admin/users`. `/**` and `**` match every path.

use std::cmp::Ordering;

use globset::{GlobBuilder, GlobMatcher};

use super::RegistryError;

/// A compiled resource path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    text: String,
    matcher: GlobMatcher,
    /// Matches the bare prefix of a `/**` suffixed pattern
    prefix: Option<GlobMatcher>,
    catch_all: bool,
    double_wildcards: usize,
    single_wildcards: usize,
}

impl PathPattern {
    /// Compile a pattern. Surrounding whitespace is trimmed and a missing
    /// leading `/` is added.
    pub fn compile(pattern: &str, case_sensitive: bool) -> Result<Self, RegistryError> {
        let text = canonicalize(pattern);
        let catch_all = text == "/**";

        let matcher = build_glob(&text, case_sensitive)?;
        let prefix = match text.strip_suffix("/**") {
            Some(prefix) if !prefix.is_empty() => Some(build_glob(prefix, case_sensitive)?),
            _ => None,
        };

        let (double_wildcards, single_wildcards) = count_wildcards(&text);

        Ok(Self {
            text,
            matcher,
            prefix,
            catch_all,
            double_wildcards,
            single_wildcards,
        })
    }

    /// The canonical pattern text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    /// Match a normalized request path.
    pub fn matches(&self, path: &str) -> bool {
        if self.catch_all {
            return true;
        }
        self.matcher.is_match(path) || self.prefix.as_ref().is_some_and(|p| p.is_match(path))
    }

    /// Precedence order, most specific first.
    ///
    /// The catch-all sorts last. Otherwise fewer `**` wins, then fewer
    /// single-segment wildcards, then the longer pattern, then the
    /// lexicographically smaller one. Two distinct patterns never compare
    /// equal.
    pub fn precedence(&self, other: &Self) -> Ordering {
        self.catch_all
            .cmp(&other.catch_all)
            .then_with(|| self.double_wildcards.cmp(&other.double_wildcards))
            .then_with(|| self.single_wildcards.cmp(&other.single_wildcards))
            .then_with(|| other.text.len().cmp(&self.text.len()))
            .then_with(|| self.text.cmp(&other.text))
    }
}

/// Trimmed pattern text with a leading `/`.
pub(crate) fn canonicalize(pattern: &str) -> String {
    let pattern = pattern.trim();
    if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{pattern}")
    }
}

fn build_glob(pattern: &str, case_sensitive: bool) -> Result<GlobMatcher, RegistryError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(!case_sensitive)
        .backslash_escape(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

/// Count `**` runs and the remaining single-segment wildcards.
fn count_wildcards(pattern: &str) -> (usize, usize) {
    let mut double = 0;
    let mut single = 0;
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' if chars.peek() == Some(&'*') => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                double += 1;
            }
            '*' | '?' | '[' | '{' => single += 1,
            _ => {}
        }
    }
    (double, single)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn compile(pattern: &str) -> PathPattern {
        PathPattern::compile(pattern, true).unwrap()
    }

    #[rstest]
    #[case("/admin/**", "/admin/users", true)]
    #[case("/admin/**", "/admin/users/42", true)]
    #[case("/admin/**", "/admin", true)]
    #[case("/admin/**", "/administrator", false)]
    #[case("/admin/**", "/public/admin", false)]
    #[case("/reports/*", "/reports/q1", true)]
    #[case("/reports/*", "/reports/q1/details", false)]
    #[case("/reports/*", "/reports", false)]
    #[case("/files/?.txt", "/files/a.txt", true)]
    #[case("/files/?.txt", "/files/ab.txt", false)]
    #[case("/api/**/edit", "/api/edit", true)]
    #[case("/api/**/edit", "/api/posts/1/edit", true)]
    #[case("/api/*/edit", "/api/posts/1/edit", false)]
    #[case("/v{1,2}/status", "/v2/status", true)]
    #[case("/v{1,2}/status", "/v3/status", false)]
    #[case("/exact", "/exact", true)]
    #[case("/exact", "/exact/more", false)]
    #[case("/**", "/", true)]
    #[case("/**", "/anything/at/all", true)]
    #[case("**", "/anything", true)]
    fn test_matches(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(compile(pattern).matches(path), expected, "{pattern} vs {path}");
    }

    #[test]
    fn test_canonical_text() {
        assert_eq!(compile("  /admin/** ").as_str(), "/admin/**");
        assert_eq!(compile("admin/**").as_str(), "/admin/**");
        assert!(compile("**").is_catch_all());
        assert!(!compile("/admin/**").is_catch_all());
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = PathPattern::compile("/Admin/**", false).unwrap();
        assert!(pattern.matches("/admin/users"));
        assert!(pattern.matches("/ADMIN"));
        assert!(!compile("/Admin/**").matches("/admin/users"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PathPattern::compile("/broken/[", true).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPattern { pattern, .. } if pattern == "/broken/["));
    }

    #[test]
    fn test_count_wildcards() {
        assert_eq!(count_wildcards("/admin"), (0, 0));
        assert_eq!(count_wildcards("/admin/**"), (1, 0));
        assert_eq!(count_wildcards("/a/*/b/**"), (1, 1));
        assert_eq!(count_wildcards("/a/?/[xy]/{c,d}"), (0, 3));
        assert_eq!(count_wildcards("/a/\\*"), (0, 0));
    }

    #[test]
    fn test_precedence_most_specific_first() {
        let mut patterns: Vec<PathPattern> = [
            "/**",
            "/admin/**",
            "/admin/*/settings",
            "/admin/users/**",
            "/admin/users",
            "/api/**/edit/**",
        ]
        .into_iter()
        .map(compile)
        .collect();

        patterns.sort_by(|a, b| a.precedence(b));
        let ordered: Vec<&str> = patterns.iter().map(|p| p.as_str()).collect();

        assert_eq!(
            ordered,
            vec![
                "/admin/users",
                "/admin/*/settings",
                "/admin/users/**",
                "/admin/**",
                "/api/**/edit/**",
                "/**",
            ]
        );
    }

    #[test]
    fn test_precedence_ties_break_lexicographically() {
        let a = compile("/a/*");
        let b = compile("/b/*");
        assert_eq!(a.precedence(&b), Ordering::Less);
        assert_eq!(b.precedence(&a), Ordering::Greater);
        assert_eq!(a.precedence(&a.clone()), Ordering::Equal);
    }
}
