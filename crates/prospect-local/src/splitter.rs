use prospect_core::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;
pub const DEFAULT_OVERLAP: usize = 500;

/// Window parameters for the overlapping splitter. Units are characters,
/// not bytes or tokens.
#[derive(Debug, Clone, Copy)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl SplitterConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidInput("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidInput(
                "overlap must be smaller than chunk_size".to_string(),
            ));
        }
        Ok(Self { chunk_size, overlap })
    }
}

/// Split text into overlapping windows of at most `chunk_size` characters,
/// in source order.
///
/// Window ends prefer a blank-line boundary, then a line boundary, then a
/// hard character cut. Every window after the first starts exactly `overlap`
/// characters before the previous window's end, so adjacent chunks share
/// that much context, and dropping the first `overlap` characters of every
/// chunk after the first reconstructs the input exactly.
pub fn split_text(text: &str, cfg: &SplitterConfig) -> Vec<String> {
    let chunk_size = cfg.chunk_size.max(1);
    let overlap = cfg.overlap.min(chunk_size - 1);

    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return Vec::new();
    }
    if n <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let hard_end = start + chunk_size;
        if hard_end >= n {
            chunks.push(chars[start..n].iter().collect());
            break;
        }
        let end = snap_end(&chars, start, hard_end, chunk_size, overlap);
        chunks.push(chars[start..end].iter().collect());
        // Exact-overlap restart; end > start + overlap is guaranteed by snap_end.
        start = end - overlap;
    }
    chunks
}

/// Pick the end of the window starting at `start`. Boundaries are only
/// considered past the halfway point (and past the overlap), so a stray
/// early newline cannot produce degenerate slivers.
fn snap_end(chars: &[char], start: usize, hard_end: usize, chunk_size: usize, overlap: usize) -> usize {
    let min_end = start + (chunk_size / 2).max(overlap + 1);

    // A blank line ends the window with its separator included, keeping the
    // split character-exact.
    for e in (min_end..=hard_end).rev() {
        if e >= 2 && chars[e - 1] == '\n' && chars[e - 2] == '\n' {
            return e;
        }
    }
    for e in (min_end..=hard_end).rev() {
        if chars[e - 1] == '\n' {
            return e;
        }
    }
    hard_end
}
