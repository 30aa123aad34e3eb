//! Splits a document into overlapping chunks (C7, spec.md §4.7).

const TARGET_CHUNK_SIZE: usize = 2_000;
const OVERLAP: usize = 200;

/// One contiguous slice of a document, with its starting byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub offset: usize,
    pub text: String,
}

/// Splits `text` into chunks of roughly `TARGET_CHUNK_SIZE` characters with
/// `OVERLAP` characters of repeated context between consecutive chunks.
///
/// Break points prefer a newline, then a space, within the trailing overlap
/// window of the target cut; otherwise the cut is hard. A document shorter
/// than the target size yields exactly one chunk at offset 0.
pub fn chunk_document(text: &str) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    if chars.len() <= TARGET_CHUNK_SIZE {
        return vec![Chunk {
            index: 0,
            offset: 0,
            text: text.to_string(),
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while start < chars.len() {
        let target_end = (start + TARGET_CHUNK_SIZE).min(chars.len());
        let end = if target_end == chars.len() {
            target_end
        } else {
            find_break_point(&chars, start, target_end)
        };

        let slice: String = chars[start..end].iter().collect();
        chunks.push(Chunk {
            index,
            offset: start,
            text: slice,
        });

        index += 1;
        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(OVERLAP).max(start + 1);
    }

    chunks
}

/// Searches backward from `target_end` within the overlap window for a
/// newline, then a space, falling back to a hard cut at `target_end`.
fn find_break_point(chars: &[char], start: usize, target_end: usize) -> usize {
    let window_start = target_end.saturating_sub(OVERLAP).max(start);

    for i in (window_start..target_end).rev() {
        if chars[i] == '\n' {
            return i + 1;
        }
    }
    for i in (window_start..target_end).rev() {
        if chars[i] == ' ' {
            return i + 1;
        }
    }
    target_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_document_is_a_single_chunk_at_offset_zero() {
        let chunks = chunk_document("hello world");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        assert!(chunk_document("").is_empty());
    }

    #[test]
    fn long_document_is_split_with_overlap() {
        let text = "a".repeat(5_000);
        let chunks = chunk_document(&text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert!(pair[1].offset < pair[0].offset + pair[0].text.chars().count());
        }
    }

    #[test]
    fn prefers_breaking_at_newline_within_window() {
        let mut text = "x".repeat(TARGET_CHUNK_SIZE - 50);
        text.push('\n');
        text.push_str(&"y".repeat(500));
        let chunks = chunk_document(&text);
        assert!(chunks[0].text.ends_with('\n'));
    }
}
