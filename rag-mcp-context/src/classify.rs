//! Decides whether a filesystem entry is plain text worth indexing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Extensions that are never indexed: media, archives, executables and office documents.
pub const SKIPPED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg", // images
    "mp4", "avi", "mov", "flv", "mkv", // video
    "mp3", "wav", "flac", "aac", // audio
    "zip", "rar", "tar", "gz", "7z", // archives
    "exe", "dll", "sh", "bat", "apk", // executables
    "pdf", "docx", "xlsx", "bin", "pyc",
];

/// Extensions that are always treated as text without probing the content.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "yaml", "xml", "csv", "log", "ini", "conf", "py", "js", "html", "css",
];

/// Number of leading bytes inspected for files with an unknown extension.
pub const PROBE_BYTES: u64 = 1024;

/// Check whether `path` names an indexable text file.
///
/// Hidden files (base name starting with `.`) and [`SKIPPED_EXTENSIONS`] are rejected,
/// [`TEXT_EXTENSIONS`] are accepted outright, and anything else is accepted only if its
/// first [`PROBE_BYTES`] bytes decode as UTF-8. Read failures of any kind, permission
/// errors included, count as "not text".
pub fn is_text_file(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    if name.to_string_lossy().starts_with('.') {
        return false;
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    if let Some(ext) = extension.as_deref() {
        if SKIPPED_EXTENSIONS.contains(&ext) {
            return false;
        }
        if TEXT_EXTENSIONS.contains(&ext) {
            return true;
        }
    }

    probe_utf8(path)
}

fn probe_utf8(path: &Path) -> bool {
    let mut buf = Vec::with_capacity(PROBE_BYTES as usize);
    let read = File::open(path).and_then(|file| file.take(PROBE_BYTES).read_to_end(&mut buf));
    if read.is_err() {
        return false;
    }

    match std::str::from_utf8(&buf) {
        Ok(_) => true,
        // A multi-byte sequence truncated by the probe window is not a decode failure.
        Err(e) => e.error_len().is_none(),
    }
}
