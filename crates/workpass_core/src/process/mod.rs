use std::fs;
use std::path::Path;

use crate::categorize::categorize;
use crate::chunking::Chunker;
use crate::domain::{ChunkMetadata, Page, ProcessedChunk};
use crate::error::{codes, AppError};
use crate::normalize::clean_text;

/// Cleans, categorizes and chunks one page. Every chunk of a page carries the
/// page-level category and pass type.
pub fn process_page(page: &Page, chunker: &Chunker) -> Vec<ProcessedChunk> {
    let cleaned = clean_text(&page.raw_text);
    let labels = categorize(page);
    let pieces = chunker.split(&cleaned);
    let total = pieces.len() as u32;

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| ProcessedChunk {
            text,
            metadata: ChunkMetadata {
                source: page.url.clone(),
                title: page.title.clone(),
                category: labels.category.clone(),
                pass_type: labels.pass_type.clone(),
                chunk_index: i as u32,
                total_chunks: total,
                headings: page.headings.clone(),
            },
        })
        .collect()
}

pub fn process_pages(pages: &[Page], chunker: &Chunker) -> Vec<ProcessedChunk> {
    let out: Vec<ProcessedChunk> = pages
        .iter()
        .flat_map(|p| process_page(p, chunker))
        .collect();
    log::info!("Processed {} pages into {} chunks", pages.len(), out.len());
    out
}

/// Writes the processed artifact atomically (tmp file, then rename).
pub fn save_processed(path: &Path, chunks: &[ProcessedChunk]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(codes::ARTIFACT_WRITE_FAILED, "Failed to create artifact directory")
                .with_details(format!("path={}; err={}", parent.display(), e))
        })?;
    }
    let json = serde_json::to_string_pretty(chunks).map_err(|e| {
        AppError::new(codes::ARTIFACT_WRITE_FAILED, "Failed to encode processed chunks")
            .with_details(e.to_string())
    })?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json.as_bytes()).map_err(|e| {
        AppError::new(codes::ARTIFACT_WRITE_FAILED, "Failed to write processed chunks")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new(codes::ARTIFACT_WRITE_FAILED, "Failed to finalize processed chunks write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })?;
    log::info!("Saved {} processed chunks to {}", chunks.len(), path.display());
    Ok(())
}

pub fn load_processed(path: &Path) -> Result<Vec<ProcessedChunk>, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new(codes::ARTIFACT_READ_FAILED, "Failed to read processed chunks")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new(codes::ARTIFACT_READ_FAILED, "Failed to decode processed chunks")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}
