//! Tool implementations for the RAG MCP server
//!
//! Each tool takes its request type and returns a [`crate::response::ToolResponse`];
//! the server turns that into JSON text for the client.

pub mod read_raw_file;
pub mod search_rag;
