//! Line-aware fixed-size chunking with bounded overlap.
//!
//! Sizes are measured in characters. Text is cut into line pieces (a line plus
//! its newline; overlong lines are hard-split), and pieces are packed greedily
//! into chunks of at most `max_size` characters. Each chunk after the first
//! starts with the longest tail of the previous chunk that fits in `overlap`.

/// A contiguous slice of a file with its 1-based inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub text: &'a str,
    pub line_from: usize,
    pub line_to: usize,
}

/// Chunker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum chunk length in characters (default: 1000).
    pub max_size: usize,
    /// Maximum characters shared by consecutive chunks (default: 200).
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub fn split<'a>(&self, text: &'a str) -> Vec<Chunk<'a>> {
        split(text, self.max_size, self.overlap)
    }
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
    line: usize,
}

fn line_pieces(text: &str, max_size: usize) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut offset = 0;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let mut start = offset;
        let mut count = 0;
        for (i, _) in line.char_indices() {
            if count == max_size {
                pieces.push(Piece {
                    start,
                    end: offset + i,
                    chars: count,
                    line: line_no,
                });
                start = offset + i;
                count = 0;
            }
            count += 1;
        }
        pieces.push(Piece {
            start,
            end: offset + line.len(),
            chars: count,
            line: line_no,
        });
        offset += line.len();
    }
    pieces
}

/// Split `text` into ordered, overlapping chunks.
///
/// Empty or whitespace-only text yields no chunks. `max_size == 0` is treated
/// as 1 and `overlap` is clamped below `max_size`. Identical input always
/// yields identical output.
#[must_use]
pub fn split(text: &str, max_size: usize, overlap: usize) -> Vec<Chunk<'_>> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let max_size = max_size.max(1);
    let overlap = overlap.min(max_size - 1);

    let pieces = line_pieces(text, max_size);
    let n = pieces.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let mut end = start;
        let mut size = 0;
        while end < n && (end == start || size + pieces[end].chars <= max_size) {
            size += pieces[end].chars;
            end += 1;
        }

        chunks.push(Chunk {
            text: &text[pieces[start].start..pieces[end - 1].end],
            line_from: pieces[start].line,
            line_to: pieces[end - 1].line,
        });

        if end >= n {
            break;
        }

        // Tail carried into the next chunk: within `overlap`, leaves room for
        // the next new piece, and never the entire previous chunk.
        let next = pieces[end].chars;
        let mut carried = 0;
        let mut tail = 0;
        while carried + 1 < end - start {
            let c = pieces[end - 1 - carried].chars;
            if tail + c > overlap || tail + c + next > max_size {
                break;
            }
            tail += c;
            carried += 1;
        }
        start = end - carried;
    }

    chunks
}
