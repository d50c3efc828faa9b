use std::path::Path;

use serde::{Deserialize, Serialize};
use workpass_core::chunking::Chunker;
use workpass_core::config::AppConfig;
use workpass_core::domain::ProcessedChunk;
use workpass_core::error::{codes, AppError};
use workpass_core::ingest::pages::load_pages;
use workpass_core::process::{load_processed, process_pages, save_processed};

use crate::embeddings::Embedder;
use crate::index::{IndexBuildInput, IndexReport, Indexer};
use crate::retry::{RetryPolicy, Sleeper};
use crate::store::CollectionStore;

/// Collaborators shared by every build path.
pub struct BuildContext<'a> {
    pub config: &'a AppConfig,
    pub embedder: &'a dyn Embedder,
    pub sleeper: &'a dyn Sleeper,
    /// RFC3339 timestamp recorded on the collection.
    pub now: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: u32,
    pub skipped_pages: u32,
    pub chunks: u32,
    pub index: IndexReport,
}

/// Scraped pages -> processed artifact -> collection.
pub fn build_from_pages(
    ctx: &BuildContext<'_>,
    pages_path: &Path,
    processed_out: &Path,
) -> Result<BuildReport, AppError> {
    let load = load_pages(pages_path)?;
    if load.pages.is_empty() {
        return Err(AppError::new(
            codes::PAGES_EMPTY,
            "No usable pages found; run the scraper first",
        )
        .with_details(format!(
            "path={}; skipped={}",
            pages_path.display(),
            load.skipped.len()
        )));
    }

    let chunker = Chunker::from_config(&ctx.config.chunking)?;
    let chunks = process_pages(&load.pages, &chunker);
    save_processed(processed_out, &chunks)?;

    let index = index_into_storage(ctx, &chunks)?;
    Ok(BuildReport {
        pages: load.pages.len() as u32,
        skipped_pages: load.skipped.len() as u32,
        chunks: chunks.len() as u32,
        index,
    })
}

/// Processed artifact -> collection.
pub fn build_from_processed(
    ctx: &BuildContext<'_>,
    processed_path: &Path,
) -> Result<BuildReport, AppError> {
    let chunks = load_processed(processed_path)?;
    let index = index_into_storage(ctx, &chunks)?;
    Ok(BuildReport {
        pages: 0,
        skipped_pages: 0,
        chunks: chunks.len() as u32,
        index,
    })
}

fn index_into_storage(
    ctx: &BuildContext<'_>,
    chunks: &[ProcessedChunk],
) -> Result<IndexReport, AppError> {
    let mut store = CollectionStore::open(&ctx.config.store.storage_path)?;
    index_chunks(ctx, &mut store, chunks)
}

/// Indexes `chunks` into the configured collection of `store`.
pub fn index_chunks(
    ctx: &BuildContext<'_>,
    store: &mut CollectionStore,
    chunks: &[ProcessedChunk],
) -> Result<IndexReport, AppError> {
    let indexer = Indexer::new(
        ctx.embedder,
        RetryPolicy::from_config(&ctx.config.retry),
        ctx.sleeper,
    );
    indexer.build(
        store,
        chunks,
        IndexBuildInput {
            collection: ctx.config.store.collection_name.clone(),
            model: ctx.config.provider.embedding_model.clone(),
            batch_size: ctx.config.provider.embed_batch_size,
            updated_at: ctx.now.to_string(),
        },
    )
}
