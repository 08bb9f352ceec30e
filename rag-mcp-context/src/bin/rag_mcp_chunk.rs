use clap::Parser;
use rag_mcp_context::{TextChunk, chunk_text, is_text_file};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// A CLI tool to preview how rag-mcp would chunk a text file, as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of chunks to split the content into.
    #[arg(short, long, default_value_t = 5)]
    chunk_count: usize,
}

#[derive(Serialize)]
struct ChunkPreview<'a> {
    path: Option<String>,
    is_text: Option<bool>,
    total_chunks: usize,
    chunks: &'a [TextChunk],
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let file_content = if let Some(input_path) = &args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let chunks = chunk_text(&file_content, args.chunk_count);

    let preview = ChunkPreview {
        path: args.input.as_ref().map(|p| p.display().to_string()),
        is_text: args.input.as_deref().map(is_text_file),
        total_chunks: chunks.len(),
        chunks: &chunks,
    };

    let json_output = serde_json::to_string_pretty(&preview)?;
    println!("{json_output}");

    Ok(())
}
