use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use strata_diff::DiffConfig;

pub const DEFAULT_CONFIG_FILE: &str = "strata.toml";
const DEFAULT_STATE_DIR: &str = ".strata";

/// On-disk configuration (`strata.toml`). Every key is optional; CLI
/// flags override file values, file values override defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    snapshot_dir: Option<PathBuf>,
    state_dir: Option<PathBuf>,
    binary_extensions: Vec<String>,
    max_diff_lines: Option<usize>,
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub snapshot_dir: Option<PathBuf>,
    pub state_dir: PathBuf,
    pub binary_extensions: Vec<String>,
    pub max_diff_lines: usize,
}

impl AppConfig {
    /// Load configuration. An explicitly passed path must exist and
    /// parse; the implicit `strata.toml` is only read when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => Some(read_file_config(path)?),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                default
                    .is_file()
                    .then(|| read_file_config(default))
                    .transpose()?
            }
        };
        let file = file.unwrap_or_default();

        Ok(Self {
            snapshot_dir: file.snapshot_dir,
            state_dir: file
                .state_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
            binary_extensions: file.binary_extensions,
            max_diff_lines: file.max_diff_lines.unwrap_or(0),
        })
    }

    pub fn diff_config(&self) -> DiffConfig {
        let mut config = DiffConfig::default();
        config.extend_binary_extensions(&self.binary_extensions);
        config.max_diff_lines = self.max_diff_lines;
        config
    }

    pub fn resolve_snapshot_dir(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.snapshot_dir.clone())
            .context("no snapshot directory: pass --dir or set snapshot_dir in strata.toml")
    }

    pub fn resolve_state_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.unwrap_or_else(|| self.state_dir.clone())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.state_dir, PathBuf::from(".strata"));
        assert_eq!(config.max_diff_lines, 0);
        assert!(config.snapshot_dir.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(
            &path,
            r#"
snapshot_dir = "/data/zips"
state_dir = "/data/state"
binary_extensions = [".wasm", "onnx"]
max_diff_lines = 400
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.snapshot_dir.as_deref(), Some(Path::new("/data/zips")));
        assert_eq!(config.state_dir, PathBuf::from("/data/state"));
        assert_eq!(config.max_diff_lines, 400);

        let diff = config.diff_config();
        assert!(diff.binary_extensions.contains("wasm"));
        assert!(diff.binary_extensions.contains("onnx"));
        assert_eq!(diff.max_diff_lines, 400);
    }

    #[test]
    fn flags_override_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(&path, "snapshot_dir = \"/from/file\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        let resolved = config
            .resolve_snapshot_dir(Some(PathBuf::from("/from/flag")))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/from/flag"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/strata.toml"))).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(&path, "no_such_key = true\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn missing_snapshot_dir_resolution_is_an_error() {
        let config = AppConfig::load(None).unwrap();
        assert!(config.resolve_snapshot_dir(None).is_err());
    }
}
