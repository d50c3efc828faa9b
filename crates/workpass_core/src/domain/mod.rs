use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One heading captured from a scraped page (`h1`..`h4`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Heading {
    pub level: String,
    pub text: String,
}

impl Heading {
    pub fn new(level: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            text: text.into(),
        }
    }
}

/// A scraped page as written by the scraper dump. Field names on the wire
/// follow that dump (`content`, `links`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub title: String,
    #[serde(rename = "content")]
    pub raw_text: String,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(rename = "links", default)]
    pub outbound_links: BTreeSet<String>,
}

/// Chunk metadata before flattening. `headings` keeps its list shape here and
/// in the processed artifact; the collection only ever sees the flat form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub source: String,
    pub title: String,
    pub category: String,
    pub pass_type: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    #[serde(default)]
    pub headings: Vec<Heading>,
}

/// Element of the processed artifact (`[{text, metadata}]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl ProcessedChunk {
    /// Content-derived id: identical source, position and text always map to
    /// the same id, so rebuilding an unchanged corpus is idempotent.
    pub fn chunk_id(&self) -> String {
        let payload = format!(
            "source={}\nchunk_index={}\ntext={}",
            self.metadata.source, self.metadata.chunk_index, self.text
        );
        hex::encode(Sha256::digest(payload.as_bytes()))
    }

    pub fn text_sha256(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }
}

/// Scalar value accepted by the collection store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

/// Flat metadata record as persisted next to each embedding.
pub type FlatMetadata = BTreeMap<String, MetadataValue>;

/// Ordered `key: value` pairs describing the asker (nationality, current pass,
/// salary range...). Appended to the question text before embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    entries: Vec<(String, String)>,
}

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair; blank values are ignored.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.entries.push((key.into(), value));
        }
        self
    }

    pub fn with_opt(self, key: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// The asker profile collected by the front end, under its fixed keys
    /// `nationality`, `current_pass` and `salary_range`.
    pub fn profile(
        nationality: Option<String>,
        current_pass: Option<String>,
        salary_range: Option<String>,
    ) -> Self {
        Self::new()
            .with_opt("nationality", nationality)
            .with_opt("current_pass", current_pass)
            .with_opt("salary_range", salary_range)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `key: value, key: value`
    pub fn flatten(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Question text with the flattened context appended, or the question
    /// unchanged when there is no context.
    pub fn enrich(&self, question: &str) -> String {
        if self.is_empty() {
            return question.to_string();
        }
        format!("{question} (User context: {})", self.flatten())
    }
}
