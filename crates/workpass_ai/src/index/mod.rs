use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use workpass_core::domain::ProcessedChunk;
use workpass_core::error::{codes, AppError};
use workpass_core::metadata::flatten_chunk_metadata;

use crate::embeddings::Embedder;
use crate::retry::{RetryPolicy, Sleeper};
use crate::store::{CollectionStatus, CollectionStore, CollectionWrite, IndexedVector};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexBuildInput {
    pub collection: String,
    pub model: String,
    /// Inputs per embedding call; keep it under the provider's request limit.
    pub batch_size: usize,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexReport {
    pub status: CollectionStatus,
    pub embedded: u32,
    pub reused: u32,
    pub duplicates_dropped: u32,
}

/// Turns processed chunks into a persisted collection.
pub struct Indexer<'a> {
    embedder: &'a dyn Embedder,
    retry: RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Indexer<'a> {
    pub fn new(embedder: &'a dyn Embedder, retry: RetryPolicy, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            embedder,
            retry,
            sleeper,
        }
    }

    /// Embeds every chunk and replaces the collection contents.
    ///
    /// Chunks whose id and text hash match an entry already stored under the
    /// same model reuse that embedding. Nothing is written unless every
    /// embedding call succeeded.
    pub fn build(
        &self,
        store: &mut CollectionStore,
        chunks: &[ProcessedChunk],
        input: IndexBuildInput,
    ) -> Result<IndexReport, AppError> {
        if chunks.is_empty() {
            return Err(AppError::new(
                codes::AI_INDEX_BUILD_FAILED,
                "No chunks to index; process scraped pages first",
            ));
        }
        let batch_size = input.batch_size.max(1);

        let mut seen = BTreeSet::new();
        let mut pending: Vec<IndexedVector> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let chunk_id = chunk.chunk_id();
            if !seen.insert(chunk_id.clone()) {
                continue;
            }
            pending.push(IndexedVector {
                chunk_id,
                ordinal: pending.len() as u32,
                text_sha256: chunk.text_sha256(),
                metadata: flatten_chunk_metadata(&chunk.metadata)?,
                text: chunk.text.clone(),
                embedding: Vec::new(),
            });
        }
        let duplicates_dropped = (chunks.len() - pending.len()) as u32;
        if duplicates_dropped > 0 {
            log::info!("Dropped {duplicates_dropped} duplicate chunks before indexing");
        }

        let current = store.status(&input.collection)?;
        let mut reusable: BTreeMap<String, (String, Vec<f32>)> = BTreeMap::new();
        if current.ready && current.model.as_deref() == Some(input.model.as_str()) {
            for e in store.read_entries(&input.collection)? {
                reusable.insert(e.chunk_id, (e.text_sha256, e.embedding));
            }
        }

        let mut reused = 0u32;
        let mut to_embed: Vec<usize> = Vec::new();
        for (i, entry) in pending.iter_mut().enumerate() {
            match reusable.remove(&entry.chunk_id) {
                Some((sha, v)) if sha == entry.text_sha256 => {
                    entry.embedding = v;
                    reused += 1;
                }
                _ => to_embed.push(i),
            }
        }

        let mut dims: Option<usize> = pending
            .iter()
            .find(|e| !e.embedding.is_empty())
            .map(|e| e.embedding.len());

        for (batch_no, batch) in to_embed.chunks(batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|&i| pending[i].text.as_str()).collect();
            let label = format!("Embedding batch {} ({} chunks)", batch_no + 1, texts.len());
            let vectors = self.retry.run(self.sleeper, &label, || {
                self.embedder.embed_batch(&input.model, &texts)
            })?;

            if vectors.len() != batch.len() {
                return Err(AppError::new(
                    codes::AI_INDEX_BUILD_FAILED,
                    "Embedding provider returned the wrong number of vectors",
                )
                .with_details(format!("expected={}; got={}", batch.len(), vectors.len())));
            }

            for (&i, v) in batch.iter().zip(vectors) {
                let expected = *dims.get_or_insert(v.len());
                if v.is_empty() || v.len() != expected {
                    return Err(AppError::new(
                        codes::AI_INDEX_BUILD_FAILED,
                        "Embedding dimension mismatch across chunks",
                    )
                    .with_details(format!(
                        "expected={expected}; got={}; chunk_id={}",
                        v.len(),
                        pending[i].chunk_id
                    )));
                }
                pending[i].embedding = v;
            }
            log::debug!("{label}: done");
        }

        let status = store.replace_collection(
            CollectionWrite {
                name: &input.collection,
                model: &input.model,
                updated_at: &input.updated_at,
            },
            &pending,
        )?;

        log::info!(
            "Indexed {} chunks into collection {} ({} embedded, {} reused)",
            status.chunk_count,
            status.name,
            to_embed.len(),
            reused
        );

        Ok(IndexReport {
            status,
            embedded: to_embed.len() as u32,
            reused,
            duplicates_dropped,
        })
    }
}
