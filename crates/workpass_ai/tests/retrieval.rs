mod common;

use pretty_assertions::assert_eq;
use workpass_ai::index::{IndexBuildInput, Indexer};
use workpass_ai::retrieve::Retriever;
use workpass_ai::retry::RetryPolicy;
use workpass_ai::store::CollectionStore;
use workpass_core::domain::ProcessedChunk;
use workpass_core::error::codes;

use common::{chunk, corpus, KeywordEmbedder, RecordingSleeper};

const COLLECTION: &str = "singapore_work_passes";

fn indexed(chunks: &[ProcessedChunk]) -> CollectionStore {
    let mut store = CollectionStore::open_in_memory().expect("open store");
    Indexer::new(&KeywordEmbedder, RetryPolicy::no_retry(), &RecordingSleeper::default())
        .build(
            &mut store,
            chunks,
            IndexBuildInput {
                collection: COLLECTION.to_string(),
                model: "keyword-test".to_string(),
                batch_size: 16,
                updated_at: "2026-10-17T00:00:00Z".to_string(),
            },
        )
        .expect("build");
    store
}

#[test]
fn returns_exactly_k_in_descending_order() {
    let store = indexed(&corpus());
    let hits = Retriever::new(&store, &KeywordEmbedder, COLLECTION)
        .retrieve("How do I get an Employment Pass?", 3)
        .expect("retrieve");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].metadata.get("title").and_then(|v| v.as_str()), Some("Employment Pass"));
    for pair in hits.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
}

#[test]
fn default_k_returns_exactly_five_from_a_larger_corpus() {
    let mut chunks = corpus();
    for i in 0..5 {
        chunks.push(chunk(
            &format!("Employment Pass renewal step {i}: the fee is due after employment starts."),
            &format!("https://www.mom.gov.sg/passes-and-permits/employment-pass/renew/{i}"),
            &format!("Renewal {i}"),
            "Employment Pass",
            "employment_passes",
        ));
    }
    assert_eq!(chunks.len(), 10);
    let store = indexed(&chunks);
    let hits = Retriever::new(&store, &KeywordEmbedder, COLLECTION)
        .retrieve("What does an Employment Pass renewal fee cost?", 5)
        .expect("retrieve");

    assert_eq!(hits.len(), 5);
    for pair in hits.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
    let mut ids: Vec<&str> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[test]
fn returns_whole_corpus_when_smaller_than_k() {
    let store = indexed(&corpus());
    let hits = Retriever::new(&store, &KeywordEmbedder, COLLECTION)
        .retrieve("fees", 10)
        .expect("retrieve");

    assert_eq!(hits.len(), 5);
    assert_eq!(hits[0].metadata.get("title").and_then(|v| v.as_str()), Some("Fees"));
}

#[test]
fn equal_scores_are_ordered_by_chunk_id() {
    let chunks = vec![
        chunk("alpha page", "https://www.mom.gov.sg/a", "A", "General", "general"),
        chunk("beta page", "https://www.mom.gov.sg/b", "B", "General", "general"),
        chunk("gamma page", "https://www.mom.gov.sg/c", "C", "General", "general"),
    ];
    let store = indexed(&chunks);
    let hits = Retriever::new(&store, &KeywordEmbedder, COLLECTION)
        .retrieve("unrelated question", 3)
        .expect("retrieve");

    let ids: Vec<&str> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn empty_query_is_rejected() {
    let store = indexed(&corpus());
    let err = Retriever::new(&store, &KeywordEmbedder, COLLECTION)
        .retrieve("   ", 5)
        .expect_err("empty query");
    assert_eq!(err.code, codes::AI_RETRIEVAL_FAILED);
}

#[test]
fn unknown_collection_is_not_ready() {
    let store = indexed(&corpus());
    let err = Retriever::new(&store, &KeywordEmbedder, "other_collection")
        .retrieve("employment", 5)
        .expect_err("not ready");
    assert_eq!(err.code, codes::AI_INDEX_NOT_READY);
}
