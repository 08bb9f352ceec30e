use crate::response::{
    FILE_NOT_FOUND, FileInfo, NOT_PLAIN_TEXT, PERMISSION_DENIED, ToolResponse,
};
use rag_mcp_context::classify::is_text_file;
use rmcp::schemars;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::{info, warn};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadRawFileRequest {
    #[schemars(description = "Absolute path of the file to read")]
    pub file_path: String,
}

/// Read a whole text file together with its size and modification time.
pub async fn read_raw_file(request: ReadRawFileRequest) -> ToolResponse {
    info!("Reading raw file: {}", request.file_path);
    let path = Path::new(&request.file_path);

    match tokio::fs::try_exists(path).await {
        Ok(true) => {}
        Ok(false) => return ToolResponse::error(FILE_NOT_FOUND),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return ToolResponse::error(PERMISSION_DENIED);
        }
        Err(_) => return ToolResponse::error(FILE_NOT_FOUND),
    }

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) => return read_failure(path, e),
    };

    let probe_path = path.to_path_buf();
    let is_text = metadata.is_file()
        && tokio::task::spawn_blocking(move || is_text_file(&probe_path))
            .await
            .unwrap_or(false);

    if !is_text {
        // Unreadable files look binary to the classifier, so surface the open error instead.
        if metadata.is_file() {
            if let Err(e) = tokio::fs::File::open(path).await {
                return read_failure(path, e);
            }
        }
        return ToolResponse::error(NOT_PLAIN_TEXT);
    }

    let raw_content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => return read_failure(path, e),
    };

    let modify_time = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default();

    ToolResponse::FileContent {
        raw_content,
        file_info: FileInfo {
            file_path: request.file_path,
            file_size: metadata.len(),
            modify_time,
        },
    }
}

fn read_failure(path: &Path, error: std::io::Error) -> ToolResponse {
    warn!("Failed to read {}: {}", path.display(), error);
    if error.kind() == ErrorKind::PermissionDenied {
        ToolResponse::error(PERMISSION_DENIED)
    } else {
        ToolResponse::error(format!("读取失败: {error}"))
    }
}
