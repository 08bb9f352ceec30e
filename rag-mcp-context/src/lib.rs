//! Text handling shared by the indexer and the query tools: deciding which files are
//! plain text and cutting their content into chunks.

pub mod classify;
pub mod text;

pub use classify::is_text_file;
pub use text::{TextChunk, chunk_text};
