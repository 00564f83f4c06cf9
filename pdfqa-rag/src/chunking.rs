//! Page chunking.
//!
//! Pages are cut into overlapping fixed-size character windows. Each window is
//! trimmed and kept only if something remains, and is tagged with the page it
//! came from. Chunk order (page ascending, then window start ascending) is the
//! ordinal order used by the similarity index.

use std::ops::Range;

use crate::document::{Chunk, Page};

/// A strategy for splitting extracted pages into chunks.
pub trait Chunker: Send + Sync {
    /// Split pages into chunks ordered by page, then by position within the page.
    ///
    /// A chunk's `source_page` is the position of its page in `pages`, so it
    /// is always a valid ordinal whatever [`Page::number`] says.
    ///
    /// Returns an empty `Vec` if no page has non-whitespace text.
    fn chunk(&self, pages: &[Page]) -> Vec<Chunk>;
}

/// Splits each page into fixed-size windows by character count with overlap.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::PageChunker;
///
/// let chunker = PageChunker::new(500, 100);
/// let chunks = chunker.chunk(&pages);
/// ```
#[derive(Debug, Clone)]
pub struct PageChunker {
    max_len: usize,
    overlap: usize,
}

impl PageChunker {
    /// Create a new `PageChunker`.
    ///
    /// `max_len` is raised to at least 1 and `overlap` is capped below `max_len`,
    /// so every window advances.
    ///
    /// # Arguments
    ///
    /// * `max_len`: maximum number of characters per window
    /// * `overlap`: number of characters shared by consecutive windows of a page
    pub fn new(max_len: usize, overlap: usize) -> Self {
        let max_len = max_len.max(1);
        Self { max_len, overlap: overlap.min(max_len - 1) }
    }

    /// The effective window length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// The effective overlap.
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for PageChunker {
    fn default() -> Self {
        Self::new(500, 100)
    }
}

impl Chunker for PageChunker {
    fn chunk(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (ordinal, page) in pages.iter().enumerate() {
            // Byte offset of every char boundary, including the end of the text.
            let boundaries: Vec<usize> = page
                .text
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(page.text.len()))
                .collect();
            let char_count = boundaries.len() - 1;

            for window in chunk_windows(char_count, self.max_len, self.overlap) {
                let text = page.text[boundaries[window.start]..boundaries[window.end]].trim();
                if !text.is_empty() {
                    chunks.push(Chunk { text: text.to_string(), source_page: ordinal });
                }
            }
        }

        chunks
    }
}

/// Window bounds, in characters, for a text of `len` characters.
///
/// Windows are `[start, min(start + max_len, len))`; the next window starts
/// `overlap` characters before the previous end. The last window ends at `len`.
/// An empty text has no windows. `max_len` is raised to 1 and `overlap` capped
/// below it, as in [`PageChunker::new`].
pub fn chunk_windows(len: usize, max_len: usize, overlap: usize) -> Vec<Range<usize>> {
    let max_len = max_len.max(1);
    let overlap = overlap.min(max_len - 1);

    let mut windows = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + max_len).min(len);
        windows.push(start..end);
        if end == len {
            break;
        }
        start = end.saturating_sub(overlap);
    }
    windows
}

/// Chunk plain page strings, using each string's position as its page ordinal.
pub fn chunk_texts(texts: &[String], max_len: usize, overlap: usize) -> Vec<Chunk> {
    let pages: Vec<Page> =
        texts.iter().enumerate().map(|(number, text)| Page::new(number, text.clone())).collect();
    PageChunker::new(max_len, overlap).chunk(&pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_page_yields_single_chunk() {
        let chunks = chunk_texts(&["  hello world  ".to_string()], 500, 100);
        assert_eq!(chunks, vec![Chunk { text: "hello world".to_string(), source_page: 0 }]);
    }

    #[test]
    fn windows_overlap_and_end_at_text_length() {
        assert_eq!(chunk_windows(46, 40, 10), vec![0..40, 30..46]);
        assert_eq!(chunk_windows(25, 10, 3), vec![0..10, 7..17, 14..24, 21..25]);
    }

    #[test]
    fn overlap_is_capped_below_window_length() {
        let chunker = PageChunker::new(5, 50);
        assert_eq!(chunker.overlap(), 4);
        assert_eq!(chunk_windows(7, 5, 50), vec![0..5, 1..6, 2..7]);
    }

    #[test]
    fn zero_window_length_still_terminates() {
        assert_eq!(chunk_windows(3, 0, 0), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn blank_windows_are_dropped() {
        let text = format!("{}{}", "a".repeat(5), " ".repeat(20));
        let chunks = chunk_texts(&[text], 5, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "aaaaa");
    }

    #[test]
    fn empty_and_blank_pages_are_tolerated() {
        let pages = vec![String::new(), "   \n ".to_string(), "text".to_string()];
        let chunks = chunk_texts(&pages, 10, 2);
        assert_eq!(chunks, vec![Chunk { text: "text".to_string(), source_page: 2 }]);
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let chunks = chunk_texts(&["héllo wörld ünïcode".to_string()], 6, 2);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 6));
    }

    #[test]
    fn chunks_are_ordered_by_page_then_position() {
        let pages = vec!["aaaa bbbb cccc".to_string(), "dddd eeee".to_string()];
        let chunks = chunk_texts(&pages, 5, 0);
        let pages_seen: Vec<usize> = chunks.iter().map(|c| c.source_page).collect();
        assert_eq!(pages_seen, vec![0, 0, 0, 1, 1]);
        assert_eq!(chunks[0].text, "aaaa");
        assert_eq!(chunks[3].text, "dddd");
    }

    #[test]
    fn chunks_are_tagged_with_page_position() {
        let pages = vec![Page::new(7, "mango"), Page::new(2, "grapes")];
        let chunks = PageChunker::default().chunk(&pages);
        let pages_seen: Vec<usize> = chunks.iter().map(|c| c.source_page).collect();
        assert_eq!(pages_seen, vec![0, 1]);
    }
}
