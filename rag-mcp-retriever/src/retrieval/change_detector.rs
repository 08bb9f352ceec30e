//! Diffs a directory tree against the modification times recorded in its index.

use rag_mcp_context::is_text_file;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::warn;

/// Two modification times closer than this are considered equal.
pub const MTIME_EPSILON: f64 = 1e-6;

/// What a sync has to do to bring an index in line with its directory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChangeSet {
    /// Every indexable file currently present, with its modification time
    pub current_files: BTreeMap<PathBuf, f64>,
    /// Files that are new or whose modification time changed
    pub to_process: Vec<PathBuf>,
    /// Previously indexed paths that no longer exist (or are no longer indexable)
    pub to_delete: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.to_process.is_empty() && self.to_delete.is_empty()
    }
}

/// Key under which a file's chunks are stored.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Walk `root` and compare what is there with `previous` (file path to recorded mtime).
///
/// Directories whose name starts with `.` are not entered, which keeps the index folder
/// itself out of the walk. Entries that cannot be read are logged and skipped.
pub async fn detect_changes(
    root: &Path,
    previous: &HashMap<String, f64>,
) -> std::io::Result<ChangeSet> {
    let mut current_files = BTreeMap::new();

    // Depth-first traversal with an explicit stack
    let mut dir_stack = vec![root.to_path_buf()];

    while let Some(current_dir) = dir_stack.pop() {
        let mut read_dir = match tokio::fs::read_dir(&current_dir).await {
            Ok(rd) => rd,
            Err(e) => {
                if current_dir == root {
                    return Err(e);
                }
                warn!("Failed to read directory {}: {}", current_dir.display(), e);
                continue;
            }
        };

        loop {
            let entry = match read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to list {}: {}", current_dir.display(), e);
                    break;
                }
            };
            let path = entry.path();

            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to get file type for {}: {}", path.display(), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                if !entry.file_name().to_string_lossy().starts_with('.') {
                    dir_stack.push(path);
                }
                continue;
            }

            // Follows symlinks, so links to regular files are indexed like the files.
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    warn!("Failed to get metadata for {}: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() || !probe_text(path.clone()).await {
                continue;
            }

            let mtime = match metadata.modified().map(|t| t.duration_since(UNIX_EPOCH)) {
                Ok(Ok(since_epoch)) => since_epoch.as_secs_f64(),
                _ => {
                    warn!("No usable modification time for {}", path.display());
                    continue;
                }
            };
            current_files.insert(path, mtime);
        }
    }

    let to_process = current_files
        .iter()
        .filter(|(path, mtime)| match previous.get(&path_key(path)) {
            Some(recorded) => (*mtime - recorded).abs() > MTIME_EPSILON,
            None => true,
        })
        .map(|(path, _)| path.clone())
        .collect();

    let present: std::collections::HashSet<String> =
        current_files.keys().map(|p| path_key(p)).collect();
    let mut to_delete: Vec<String> = previous
        .keys()
        .filter(|key| !present.contains(*key))
        .cloned()
        .collect();
    to_delete.sort();

    Ok(ChangeSet {
        current_files,
        to_process,
        to_delete,
    })
}

/// Classify `path` on the blocking pool; the classifier may read the head of the file.
async fn probe_text(path: PathBuf) -> bool {
    match tokio::task::spawn_blocking(move || is_text_file(&path)).await {
        Ok(is_text) => is_text,
        Err(e) => {
            warn!("Text classification task failed: {}", e);
            false
        }
    }
}
