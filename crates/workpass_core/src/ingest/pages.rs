use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Page;
use crate::error::{codes, AppError};

/// A record from the scraper dump that could not be used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedPage {
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoad {
    pub pages: Vec<Page>,
    pub skipped: Vec<SkippedPage>,
}

/// Decodes a scraper dump (`[{url, title, content, headings, links}, ...]`).
///
/// A malformed record, or one with no URL or no text, is skipped and logged;
/// only an unreadable file or a document that is not a JSON array fails.
pub fn parse_pages(raw: &str) -> Result<PageLoad, AppError> {
    let records: Vec<Value> = serde_json::from_str(raw).map_err(|e| {
        AppError::new(codes::PAGES_READ_FAILED, "Scraped pages must be a JSON array")
            .with_details(e.to_string())
    })?;

    let mut pages = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for (position, record) in records.into_iter().enumerate() {
        if record.is_null() {
            skipped.push(SkippedPage {
                position,
                reason: "null record (page failed to scrape)".to_string(),
            });
            continue;
        }
        match serde_json::from_value::<Page>(record) {
            Ok(page) if page.url.trim().is_empty() => skipped.push(SkippedPage {
                position,
                reason: "missing url".to_string(),
            }),
            Ok(page) if page.raw_text.trim().is_empty() => skipped.push(SkippedPage {
                position,
                reason: format!("no text content; url={}", page.url),
            }),
            Ok(page) => pages.push(page),
            Err(e) => skipped.push(SkippedPage {
                position,
                reason: e.to_string(),
            }),
        }
    }

    for s in &skipped {
        log::warn!("Skipping scraped page #{}: {}", s.position, s.reason);
    }

    Ok(PageLoad { pages, skipped })
}

pub fn load_pages(path: &Path) -> Result<PageLoad, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::new(codes::PAGES_READ_FAILED, "Failed to read scraped pages")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let load = parse_pages(&raw)?;
    log::info!(
        "Loaded {} pages from {} ({} skipped)",
        load.pages.len(),
        path.display(),
        load.skipped.len()
    );
    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_bad_records_and_keeps_the_rest() {
        let raw = r#"[
            {"url": "https://www.mom.gov.sg/a", "title": "A", "content": "Alpha text"},
            null,
            {"url": "https://www.mom.gov.sg/b", "title": "B"},
            {"url": "", "title": "C", "content": "text"},
            {"url": "https://www.mom.gov.sg/d", "title": "D", "content": "   "},
            {"url": "https://www.mom.gov.sg/e", "title": "E", "content": "Echo", "headings": [], "links": []}
        ]"#;
        let load = parse_pages(raw).expect("parse");
        let urls = load.pages.iter().map(|p| p.url.as_str()).collect::<Vec<_>>();
        assert_eq!(urls, vec!["https://www.mom.gov.sg/a", "https://www.mom.gov.sg/e"]);
        let positions = load.skipped.iter().map(|s| s.position).collect::<Vec<_>>();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[test]
    fn non_array_document_is_an_error() {
        let err = parse_pages(r#"{"url": "x"}"#).expect_err("should fail");
        assert_eq!(err.code, codes::PAGES_READ_FAILED);
    }
}
