use crate::config::DiffConfig;
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Per-snapshot mapping from normalized relative path to file content.
/// Transient: built fresh for each diff and discarded with the
/// extraction workspace.
pub type Inventory = BTreeMap<String, FileEntry>;

/// One inventoried file. `text` is `None` for binary-extension files and
/// for content no encoding in the fallback chain could decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub hash: String,
    pub text: Option<String>,
    pub line_count: usize,
}

impl FileEntry {
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}

/// Walk an extracted snapshot tree and build its inventory.
///
/// Every file is recorded by SHA-256 content hash; files outside the
/// excluded-extension set additionally carry decoded text and line count.
pub fn build_inventory(root: &Path, config: &DiffConfig) -> Result<Inventory> {
    let mut inventory = Inventory::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        let bytes = fs::read(entry.path())?;
        let hash = format!("{:x}", Sha256::digest(&bytes));

        let text = if is_excluded(&rel_path, config) {
            None
        } else {
            decode_text(&bytes)
        };
        let line_count = text.as_deref().map_or(0, |t| t.lines().count());

        inventory.insert(
            rel_path,
            FileEntry {
                hash,
                text,
                line_count,
            },
        );
    }

    log::debug!(
        "inventoried {} files under {}",
        inventory.len(),
        root.display()
    );
    Ok(inventory)
}

fn is_excluded(path: &str, config: &DiffConfig) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| config.binary_extensions.contains(&ext.to_lowercase()))
}

/// Decode file content: UTF-8 first, then Latin-1 for byte sequences free
/// of NUL bytes. Returns `None` when the whole chain fails.
fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_string());
    }
    if bytes.contains(&0) {
        return None;
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}
