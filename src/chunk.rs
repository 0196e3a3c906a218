//! Fixed-size text chunker.
//!
//! Splits text into consecutive windows of `chunk_size` characters. There is
//! no overlap and no boundary awareness: a window may end mid-word or
//! mid-sentence. Concatenating the windows in order reproduces the input
//! exactly.

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Split text into windows of at most `chunk_size` characters.
///
/// Windows are counted in `char`s, so multi-byte text never splits inside a
/// code point. Only the final window may be shorter. Empty input yields no
/// windows.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Windows of `text` that are non-empty after trimming, as owned strings.
///
/// The surviving windows keep their surrounding whitespace; only their
/// selection depends on trimming.
pub fn non_empty_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    chunk_text(text, chunk_size)
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .collect()
}
