use crate::status_docs::StatusDocMatcher;
use std::collections::HashSet;

/// Extensions (lowercase, no leading dot) treated as binary content.
///
/// Binary files are inventoried by hash only: they participate in
/// added/removed/moved/unchanged classification but never produce
/// line diffs.
pub const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    // Images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg",
    // Executables and libraries
    "exe", "dll", "so", "dylib", "bin",
    // Archives
    "zip", "gz", "tar", "rar", "7z",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx",
    // Compiled artifacts
    "pyc", "pyo", "class", "o", "obj",
    // Databases
    "db", "sqlite", "sqlite3",
    // Media
    "mp3", "mp4", "wav", "avi", "mov",
    // Fonts
    "ttf", "otf", "woff", "woff2",
    // OS / IDE noise
    "ds_store", "suo", "cache", "resources", "pdb", "nupkg", "snk",
];

/// Configuration for inventory building and diffing.
///
/// Constructed once at startup and passed explicitly into the diff engine.
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Extensions excluded from text handling (lowercase, no leading dot).
    pub binary_extensions: HashSet<String>,
    /// Status/notes document matcher applied to the newer snapshot.
    pub status_docs: StatusDocMatcher,
    /// Per-file cap on emitted diff lines (0 = unlimited). The add/remove
    /// count is taken before truncation.
    pub max_diff_lines: usize,
}

impl DiffConfig {
    /// Add extra binary extensions on top of the defaults. Accepts entries
    /// with or without a leading dot, any case.
    pub fn extend_binary_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extensions {
            let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() {
                self.binary_extensions.insert(ext);
            }
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            binary_extensions: DEFAULT_BINARY_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            status_docs: StatusDocMatcher::default(),
            max_diff_lines: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DiffConfig;

    #[test]
    fn extend_normalizes_extensions() {
        let mut config = DiffConfig::default();
        config.extend_binary_extensions([".WASM", "dat", ""]);
        assert!(config.binary_extensions.contains("wasm"));
        assert!(config.binary_extensions.contains("dat"));
        assert!(!config.binary_extensions.contains(""));
    }
}
