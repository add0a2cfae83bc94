//! Fixed-size window chunking with overlap

use crate::config::ChunkingConfig;
use crate::error::Result;

/// Splits extracted text blocks into overlapping fixed-size character windows.
///
/// Each window starts `chunk_size - overlap` characters after the previous
/// window's start, so consecutive windows share `overlap` characters of
/// context. The last window of a block may be shorter than `chunk_size`.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker from validated configuration
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        })
    }

    /// Split text blocks into ordered chunk texts.
    ///
    /// Empty input (or blocks with no visible text) yields an empty sequence;
    /// the caller treats that as "no extractable text".
    pub fn split(&self, blocks: &[String]) -> Vec<String> {
        let step = self.chunk_size - self.overlap;
        let mut windows = Vec::new();

        for block in blocks {
            if block.trim().is_empty() {
                continue;
            }

            // Window arithmetic is in characters, not bytes
            let chars: Vec<char> = block.chars().collect();
            let mut start = 0;
            loop {
                let end = (start + self.chunk_size).min(chars.len());
                windows.push(chars[start..end].iter().collect());
                if end == chars.len() {
                    break;
                }
                start += step;
            }
        }

        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
        })
        .unwrap()
    }

    #[test]
    fn short_block_is_a_single_window() {
        let chunks = chunker(1000, 200).split(&["hello world".to_string()]);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        let chunks = chunker(1000, 200).split(&[]);
        assert!(chunks.is_empty());

        let chunks = chunker(1000, 200).split(&["   \n".to_string()]);
        assert!(chunks.is_empty());
    }

    #[test]
    fn windows_of_2500_chars_with_defaults() {
        // 2500 chars, size 1000, overlap 200: windows start at 0, 800, 1600
        let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunker(1000, 200).split(&[text.clone()]);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 1000);
        assert_eq!(chunks[1].chars().count(), 1000);
        assert_eq!(chunks[2].chars().count(), 900);

        // Consecutive windows share exactly 200 characters
        let tail0: String = chunks[0].chars().skip(800).collect();
        let head1: String = chunks[1].chars().take(200).collect();
        assert_eq!(tail0, head1);

        let tail1: String = chunks[1].chars().skip(800).collect();
        let head2: String = chunks[2].chars().take(200).collect();
        assert_eq!(tail1, head2);
    }

    #[test]
    fn window_count_matches_formula() {
        // ceil((L - overlap) / (chunk_size - overlap)) windows for L > chunk_size
        for (len, size, overlap) in [(2500usize, 1000usize, 200usize), (1800, 1000, 200), (5000, 500, 100), (1001, 1000, 0)] {
            let text: String = "x".repeat(len);
            let chunks = chunker(size, overlap).split(&[text]);
            let expected = (len - overlap).div_ceil(size - overlap);
            assert_eq!(chunks.len(), expected, "len={} size={} overlap={}", len, size, overlap);
            assert!(chunks.iter().all(|c| c.chars().count() <= size));
        }
    }

    #[test]
    fn exact_multiple_has_no_trailing_sliver() {
        let text: String = "y".repeat(1000);
        let chunks = chunker(1000, 200).split(&[text]);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn zero_overlap_partitions_the_text() {
        let text: String = "z".repeat(250);
        let chunks = chunker(100, 0).split(&[text]);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].chars().count(), 50);
    }

    #[test]
    fn blocks_are_chunked_independently_in_order() {
        let blocks = vec!["first block".to_string(), "second block".to_string()];
        let chunks = chunker(1000, 200).split(&blocks);
        assert_eq!(chunks, vec!["first block".to_string(), "second block".to_string()]);
    }

    #[test]
    fn multibyte_text_is_windowed_by_characters() {
        let text: String = "é".repeat(150);
        let chunks = chunker(100, 20).split(&[text]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks[1].chars().count(), 70);
    }
}
