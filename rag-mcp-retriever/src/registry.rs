//! Persistent list of indexed roots used when a search names no directory.
//!
//! The registry lives at `~/.rag_mcp/state.json` as `{"directories": [...]}`. It is kept
//! separate from the per-root indexes: indexing adds an entry, cleaning removes it, and
//! nothing else reconciles the two.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Directory under the home directory holding the registry and the log files.
pub const STATE_DIR_NAME: &str = ".rag_mcp";
pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    directories: Vec<PathBuf>,
}

/// Handle to a registry file. Every operation reads or writes the file directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRegistry {
    path: PathBuf,
}

impl RootRegistry {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The registry in the user's home directory, if a home directory can be determined.
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::at(home.join(STATE_DIR_NAME).join(STATE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered roots in insertion order.
    ///
    /// A missing, unreadable or malformed file reads as an empty registry.
    pub fn load(&self) -> Vec<PathBuf> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read registry {}: {}", self.path.display(), e);
                }
                return Vec::new();
            }
        };

        match serde_json::from_str::<RegistryFile>(&content) {
            Ok(file) => file.directories,
            Err(e) => {
                tracing::warn!(
                    "Registry {} is corrupt, treating it as empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the registry with `directories`.
    pub fn save(&self, directories: &[PathBuf]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = RegistryFile {
            directories: directories.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(std::io::Error::from)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Register `directory`. Adding a root that is already present changes nothing.
    pub fn add(&self, directory: &Path) -> Result<()> {
        let directory = normalize(directory);
        let mut directories = self.load();
        if directories.contains(&directory) {
            return Ok(());
        }
        tracing::info!("Registering {}", directory.display());
        directories.push(directory);
        self.save(&directories)
    }

    /// Unregister `directory`. Removing an unknown root is a no-op.
    pub fn remove(&self, directory: &Path) -> Result<()> {
        let directory = normalize(directory);
        let mut directories = self.load();
        let before = directories.len();
        directories.retain(|d| d != &directory);
        if directories.len() == before {
            return Ok(());
        }
        tracing::info!("Unregistering {}", directory.display());
        self.save(&directories)
    }
}

/// Make `path` absolute against the current directory and collapse `.` and `..`
/// lexically, without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root, matching `/..` == `/`.
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
