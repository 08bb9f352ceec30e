//! The `{code, message, data}` envelope every tool answers with.

use rag_mcp_retriever::retrieval::search::{SearchOutcome, SearchResults};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

pub const SEARCH_OK: &str = "检索成功";
pub const SEARCH_EMPTY: &str = "未检索到与关键词相关的内容";
pub const SEARCH_NO_ROOTS: &str = "No directories indexed or specified.";
pub const READ_OK: &str = "读取成功";
pub const FILE_NOT_FOUND: &str = "文件不存在，请检查路径是否正确";
pub const NOT_PLAIN_TEXT: &str = "无法读取非纯文本文件";
pub const PERMISSION_DENIED: &str = "无文件读取权限，请检查权限设置";

/// Metadata returned next to a file's content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub file_path: String,
    pub file_size: u64,
    /// Seconds since the Unix epoch
    pub modify_time: f64,
}

/// Result of a tool call, serialised as `{"code", "message", "data"}`.
///
/// Failures are responses too: a client always receives this envelope, never a
/// protocol-level error.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    SearchResults(SearchResults),
    NoMatches,
    NoRoots,
    FileContent {
        raw_content: String,
        file_info: FileInfo,
    },
    /// `code = 500` with the given message and no data
    Error(String),
}

impl ToolResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ToolResponse::Error(message.into())
    }

    pub fn code(&self) -> u16 {
        match self {
            ToolResponse::SearchResults(_)
            | ToolResponse::NoMatches
            | ToolResponse::FileContent { .. } => 200,
            ToolResponse::NoRoots | ToolResponse::Error(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ToolResponse::SearchResults(_) => SEARCH_OK,
            ToolResponse::NoMatches => SEARCH_EMPTY,
            ToolResponse::NoRoots => SEARCH_NO_ROOTS,
            ToolResponse::FileContent { .. } => READ_OK,
            ToolResponse::Error(message) => message,
        }
    }

    /// JSON text of the envelope. Non-ASCII characters are written as-is.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"code":500,"message":"serialization failed: {e}","data":null}}"#)
        })
    }
}

impl From<SearchOutcome> for ToolResponse {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::NoRoots => ToolResponse::NoRoots,
            SearchOutcome::NoMatches => ToolResponse::NoMatches,
            SearchOutcome::Found(results) => ToolResponse::SearchResults(results),
        }
    }
}

#[derive(Serialize)]
struct RawContent<'a> {
    raw_content: &'a str,
}

impl Serialize for ToolResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_file_info = matches!(self, ToolResponse::FileContent { .. });
        let mut map = serializer.serialize_map(Some(if has_file_info { 4 } else { 3 }))?;
        map.serialize_entry("code", &self.code())?;
        map.serialize_entry("message", self.message())?;
        match self {
            ToolResponse::SearchResults(results) => map.serialize_entry("data", results)?,
            ToolResponse::FileContent {
                raw_content,
                file_info,
            } => {
                map.serialize_entry("data", &RawContent { raw_content })?;
                map.serialize_entry("file_info", file_info)?;
            }
            ToolResponse::NoMatches | ToolResponse::NoRoots | ToolResponse::Error(_) => {
                map.serialize_entry("data", &Option::<()>::None)?
            }
        }
        map.end()
    }
}
