use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Exact basenames (lowercase) recognized as status/notes documents.
pub const DEFAULT_STATUS_DOC_NAMES: &[&str] = &[
    "status.md",
    "changelog.md",
    "todo.md",
    "notes.md",
    "readme.md",
    "development.md",
    "devlog.md",
    "history.md",
    "claude.md",
    "progress.md",
    "release_notes.md",
    "roadmap.md",
    "lessons_learned.md",
];

/// Glob patterns (lowercase, matched against the basename) for status docs
/// that carry a date or version in their name.
pub const DEFAULT_STATUS_DOC_PATTERNS: &[&str] =
    &["devlog*", "changelog*", "release_notes*", "todo*"];

static DEFAULT_MATCHER: Lazy<StatusDocMatcher> = Lazy::new(|| {
    StatusDocMatcher::new(DEFAULT_STATUS_DOC_NAMES, DEFAULT_STATUS_DOC_PATTERNS)
        .expect("default status-doc patterns are valid globs")
});

/// Matcher for developer-authored status/notes documents.
///
/// Built once at startup and passed into the diff engine as configuration;
/// matching is case-insensitive on the file's basename.
#[derive(Debug, Clone)]
pub struct StatusDocMatcher {
    exact: HashSet<String>,
    globs: GlobSet,
}

impl StatusDocMatcher {
    pub fn new(exact_names: &[&str], patterns: &[&str]) -> Result<Self, globset::Error> {
        let exact = exact_names.iter().map(|n| n.to_lowercase()).collect();
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(&pattern.to_lowercase())?);
        }
        Ok(Self {
            exact,
            globs: builder.build()?,
        })
    }

    /// Whether `path` names a status document, judged by its basename.
    pub fn matches(&self, path: &str) -> bool {
        let Some(name) = Path::new(path).file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let name = name.to_lowercase();
        self.exact.contains(&name) || self.globs.is_match(&name)
    }
}

impl Default for StatusDocMatcher {
    fn default() -> Self {
        DEFAULT_MATCHER.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::StatusDocMatcher;

    #[test]
    fn matches_exact_names_case_insensitively() {
        let matcher = StatusDocMatcher::default();
        assert!(matcher.matches("README.md"));
        assert!(matcher.matches("docs/CHANGELOG.md"));
        assert!(matcher.matches("deep/nested/notes.md"));
        assert!(!matcher.matches("src/main.rs"));
    }

    #[test]
    fn matches_prefix_patterns() {
        let matcher = StatusDocMatcher::default();
        assert!(matcher.matches("devlog_2024_03.md"));
        assert!(matcher.matches("TODO_backend.txt"));
        assert!(matcher.matches("release_notes_v2.md"));
        assert!(!matcher.matches("mytodo.md"));
    }

    #[test]
    fn directory_names_do_not_match() {
        let matcher = StatusDocMatcher::default();
        assert!(!matcher.matches("changelog/module.rs"));
    }
}
