//! Splits file content into a fixed number of segments that end on natural boundaries.
//!
//! The chunker is driven by a *target count* rather than a maximum size: a file is cut
//! into roughly `chunk_count` pieces of `len / chunk_count` characters each, and every
//! provisional cut is nudged onto the closest line break or word break nearby.
//!
//! # Cut Selection
//!
//! For every provisional cut point `end` the chunker tries, in order:
//!
//! 1. a newline fewer than [`NEWLINE_WINDOW`] characters *after* `end`,
//! 2. a newline fewer than [`NEWLINE_WINDOW`] characters *before* `end`
//!    (but not before the start of the current chunk),
//! 3. a space fewer than [`SPACE_WINDOW`] characters after `end`,
//! 4. `end` itself, even if that splits a word.
//!
//! The cut is placed just after the chosen delimiter so the delimiter stays with the
//! preceding chunk.
//!
//! # Guarantees
//!
//! * Concatenating the chunks in order reproduces the input exactly.
//! * No chunk is empty.
//! * At most `chunk_count` chunks are produced, except when the text is shorter than
//!   `chunk_count` characters, in which case every character becomes its own chunk.
//! * Positions and lengths are counted in characters, so cuts never land inside a
//!   multi-byte UTF-8 sequence.
//!
//! ```
//! use rag_mcp_context::text::chunk_text;
//!
//! let chunks = chunk_text("hello world\n\nfoo bar", 5);
//! let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(texts, vec!["hello world\n", "\n", "foo ", "bar"]);
//! assert_eq!(chunks[3].index, 3);
//! ```

use serde::Serialize;

/// How far (in characters) the chunker looks for a newline around a provisional cut.
pub const NEWLINE_WINDOW: usize = 100;

/// How far (in characters) the chunker looks ahead for a space after a provisional cut.
pub const SPACE_WINDOW: usize = 50;

/// A single segment of a file, tagged with its position in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Position of this chunk within its file (0-indexed).
    pub index: usize,
    /// The text content of this chunk.
    pub text: String,
}

/// Split `text` into at most `chunk_count` boundary-respecting chunks.
///
/// See the module documentation for the cut selection rules. Chunk indices are
/// assigned while the chunks are generated, so two chunks with identical text still
/// carry distinct positions.
pub fn chunk_text(text: &str, chunk_count: usize) -> Vec<TextChunk> {
    if text.is_empty() {
        return Vec::new();
    }
    if chunk_count <= 1 {
        return vec![TextChunk {
            index: 0,
            text: text.to_string(),
        }];
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let target = total / chunk_count;

    if target == 0 {
        return chars
            .iter()
            .enumerate()
            .map(|(index, c)| TextChunk {
                index,
                text: c.to_string(),
            })
            .collect();
    }

    // Byte offset of every character position, plus the end of the string.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect();
    let slice = |from: usize, to: usize| &text[offsets[from]..offsets[to]];

    let mut pieces: Vec<&str> = Vec::with_capacity(chunk_count);
    let mut cursor = 0;

    for _ in 0..chunk_count - 1 {
        if cursor >= total {
            break;
        }

        let end = (cursor + target).min(total);
        if end == total {
            pieces.push(slice(cursor, total));
            cursor = total;
            break;
        }

        let cut = find_cut(&chars, cursor, end);
        pieces.push(slice(cursor, cut));
        cursor = cut;
    }

    if cursor < total {
        pieces.push(slice(cursor, total));
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| TextChunk {
            index,
            text: piece.to_string(),
        })
        .collect()
}

/// Pick the real cut point for a chunk starting at `cursor` with provisional end `end`.
///
/// Requires `cursor < end < chars.len()`; the result is always in `cursor + 1..=chars.len()`.
fn find_cut(chars: &[char], cursor: usize, end: usize) -> usize {
    let next_newline = chars[end..]
        .iter()
        .take(NEWLINE_WINDOW)
        .position(|&c| c == '\n');
    if let Some(offset) = next_newline {
        return end + offset + 1;
    }

    let window_start = end.saturating_sub(NEWLINE_WINDOW - 1).max(cursor);
    let prev_newline = chars[window_start..end].iter().rposition(|&c| c == '\n');
    if let Some(offset) = prev_newline {
        return window_start + offset + 1;
    }

    let next_space = chars[end..]
        .iter()
        .take(SPACE_WINDOW)
        .position(|&c| c == ' ');
    if let Some(offset) = next_space {
        return end + offset + 1;
    }

    end
}
