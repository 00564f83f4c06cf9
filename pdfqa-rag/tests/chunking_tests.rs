//! Property tests for page chunking.

use pdfqa_rag::chunking::{Chunker, PageChunker, chunk_windows};
use pdfqa_rag::document::Page;
use proptest::prelude::*;

/// Window parameters with `overlap < max_len`.
fn arb_window_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|max_len| (Just(max_len), 0..max_len))
}

/// Page text mixing ASCII, whitespace runs and multibyte chars.
fn arb_page_text() -> impl Strategy<Value = String> {
    "[a-zé€ \n\t.]{0,300}"
}

/// **Chunk coverage**
/// *For any* text length and window parameters, the windows cover `[0, len)`:
/// the first starts at 0, the last ends at `len`, each is at most `max_len`
/// long, starts strictly increase and consecutive windows overlap by at most
/// `overlap`.
mod prop_chunk_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn windows_cover_text(len in 0usize..2000, (max_len, overlap) in arb_window_params()) {
            let windows = chunk_windows(len, max_len, overlap);

            if len == 0 {
                prop_assert!(windows.is_empty());
                return Ok(());
            }

            prop_assert_eq!(windows[0].start, 0);
            prop_assert_eq!(windows.last().unwrap().end, len);
            for window in &windows {
                prop_assert!(window.start < window.end);
                prop_assert!(window.end - window.start <= max_len);
            }
            for pair in windows.windows(2) {
                prop_assert!(pair[1].start > pair[0].start);
                // No gap between windows.
                prop_assert!(pair[1].start <= pair[0].end);
                prop_assert!(pair[0].end - pair[1].start <= overlap);
            }
        }
    }
}

/// **Chunk non-emptiness**
/// *For any* pages, every chunk is non-empty, already trimmed, no longer than
/// `max_len` chars and tagged with an existing page, in page order.
mod prop_chunk_non_empty {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn chunks_are_trimmed_and_non_empty(
            texts in proptest::collection::vec(arb_page_text(), 0..5),
            (max_len, overlap) in arb_window_params(),
        ) {
            let pages: Vec<Page> =
                texts.iter().enumerate().map(|(n, t)| Page::new(n, t.clone())).collect();
            let chunks = PageChunker::new(max_len, overlap).chunk(&pages);

            for chunk in &chunks {
                prop_assert!(!chunk.text.is_empty());
                prop_assert_eq!(chunk.text.trim(), chunk.text.as_str());
                prop_assert!(chunk.text.chars().count() <= max_len);
                prop_assert!(chunk.source_page < pages.len());
            }
            for pair in chunks.windows(2) {
                prop_assert!(pair[0].source_page <= pair[1].source_page);
            }

            let all_blank = texts.iter().all(|t| t.trim().is_empty());
            prop_assert_eq!(chunks.is_empty(), all_blank);
        }
    }
}

#[test]
fn mango_page_splits_into_overlapping_chunks() {
    let page = Page::new(0, "Mango is a king of fruits. Grapes can be sour.");
    let chunks = PageChunker::new(40, 10).chunk(&[page]);

    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.source_page == 0));
    assert_eq!(chunks[0].text, "Mango is a king of fruits. Grapes can be");
    assert_eq!(chunks[1].text, "pes can be sour.");
}
