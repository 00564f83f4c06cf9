//! Property tests for top-k retrieval ordering.

mod common;

use common::FixedEmbedder;
use pdfqa_rag::document::Chunk;
use pdfqa_rag::index::DocumentIndex;
use pdfqa_rag::retrieve;
use proptest::prelude::*;

const DIM: usize = 8;

fn arb_vector() -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, DIM)
}

/// **Retriever ordering**
/// *For any* indexed vectors, query and `k >= 1`, retrieval returns
/// `min(k, n)` items with non-increasing scores and 1-based page numbers.
mod prop_retrieval_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_and_bounded(
            vectors in proptest::collection::vec(arb_vector(), 1..30),
            query in arb_vector(),
            k in 1usize..40,
        ) {
            let chunks: Vec<Chunk> = (0..vectors.len())
                .map(|i| Chunk { text: format!("chunk {i}"), source_page: i % 3 })
                .collect();
            let index = DocumentIndex::build(3, chunks, &vectors).unwrap();
            let embedder = FixedEmbedder(query);

            let rt = tokio::runtime::Runtime::new().unwrap();
            let items = rt.block_on(retrieve("anything", &embedder, &index, k)).unwrap();

            prop_assert_eq!(items.len(), k.min(vectors.len()));
            for pair in items.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            for item in &items {
                prop_assert!((1..=3).contains(&item.page));
                prop_assert!(item.score <= 1.0 + 1e-4 && item.score >= -1.0 - 1e-4);
            }
        }
    }
}

#[tokio::test]
async fn pages_are_reported_one_based() {
    let chunks = vec![
        Chunk { text: "first page".into(), source_page: 0 },
        Chunk { text: "fourth page".into(), source_page: 3 },
    ];
    let index = DocumentIndex::build(4, chunks, &[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
    let items = retrieve("q", &FixedEmbedder(vec![0.0, 1.0]), &index, 1).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text, "fourth page");
    assert_eq!(items[0].page, 4);
    assert!((items[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn wrong_embedder_dimension_is_an_error() {
    let chunks = vec![Chunk { text: "x".into(), source_page: 0 }];
    let index = DocumentIndex::build(1, chunks, &[vec![1.0, 0.0]]).unwrap();
    let err = retrieve("q", &FixedEmbedder(vec![1.0, 0.0, 0.0]), &index, 1).await.unwrap_err();
    assert!(matches!(err, pdfqa_rag::QaError::DimensionMismatch { expected: 2, actual: 3 }));
}
