use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use workpass_core::domain::FlatMetadata;
use workpass_core::error::{codes, AppError};

use crate::embeddings::Embedder;
use crate::store::CollectionStore;

mod similarity;

pub use similarity::{cosine_similarity, l2_norm};

pub const MAX_TOP_K: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    pub chunk_id: String,
    pub chunk_text: String,
    pub metadata: FlatMetadata,
    /// Cosine similarity in `[-1, 1]`; results are sorted by it, descending.
    pub similarity_score: f32,
}

/// Brute-force nearest-neighbour search over one collection.
pub struct Retriever<'a> {
    store: &'a CollectionStore,
    embedder: &'a dyn Embedder,
    collection: &'a str,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a CollectionStore, embedder: &'a dyn Embedder, collection: &'a str) -> Self {
        Self {
            store,
            embedder,
            collection,
        }
    }

    /// Top `k` chunks by descending cosine similarity; equal scores are ordered
    /// by chunk id. `k` is clamped to `1..=MAX_TOP_K`. Fewer than `k` results
    /// come back only when the collection is smaller.
    pub fn retrieve(&self, query: &str, k: u32) -> Result<Vec<RetrievalResult>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new(
                codes::AI_RETRIEVAL_FAILED,
                "Query must not be empty",
            ));
        }
        let k = k.clamp(1, MAX_TOP_K);

        let st = self.store.status(self.collection)?;
        if !st.ready {
            return Err(AppError::new(
                codes::AI_INDEX_NOT_READY,
                "Collection not ready; build the knowledge base before querying",
            )
            .with_details(format!("collection={}", self.collection)));
        }
        let model = st.model.clone().ok_or_else(|| {
            AppError::new(codes::AI_INDEX_NOT_READY, "Collection status missing model")
        })?;
        let dims = st
            .dims
            .ok_or_else(|| AppError::new(codes::AI_INDEX_NOT_READY, "Collection status missing dims"))?;

        let qv = self.embedder.embed_query(&model, q)?;
        if qv.len() as u32 != dims {
            return Err(AppError::new(
                codes::AI_RETRIEVAL_FAILED,
                "Query embedding dims do not match collection dims",
            )
            .with_details(format!("collection_dims={dims}; query_dims={}", qv.len())));
        }
        let qnorm = l2_norm(&qv);
        if qnorm == 0.0 {
            return Err(AppError::new(
                codes::AI_RETRIEVAL_FAILED,
                "Query embedding norm is zero",
            ));
        }

        let entries = self.store.read_entries(self.collection)?;
        let mut scored = Vec::with_capacity(entries.len());
        for entry in entries {
            let vnorm = l2_norm(&entry.embedding);
            // A zero vector has no direction; rank it last rather than drop it. Same for NaN.
            let score = if vnorm == 0.0 {
                -1.0
            } else {
                cosine_similarity(&qv, &entry.embedding, qnorm, vnorm)
            };
            let score = if score.is_nan() { -1.0 } else { score };
            scored.push((score, entry));
        }

        scored.sort_by(|a, b| {
            rank_order((a.0, a.1.chunk_id.as_str()), (b.0, b.1.chunk_id.as_str()))
        });
        scored.truncate(k as usize);

        log::debug!(
            "Retrieved {} chunks from {} for query of {} chars",
            scored.len(),
            self.collection,
            q.len()
        );

        Ok(scored
            .into_iter()
            .map(|(score, entry)| RetrievalResult {
                chunk_id: entry.chunk_id,
                chunk_text: entry.text,
                metadata: entry.metadata,
                similarity_score: score,
            })
            .collect())
    }
}

/// Higher score first, then ascending chunk id.
fn rank_order(a: (f32, &str), b: (f32, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}
