//! Persisted vector collections.
//!
//! One SQLite file (`collections.sqlite`) under the storage directory holds any
//! number of named collections. Each entry keeps the chunk text, its embedding
//! and a flat scalar-only metadata record.
//!
//! Nothing here coordinates concurrent writers: rebuilding a collection while
//! another process queries it is unsupported.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use workpass_core::domain::FlatMetadata;
use workpass_core::error::{codes, AppError};

pub const STORE_FILE_NAME: &str = "collections.sqlite";

const SCHEMA: &str = r#"
  CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY NOT NULL,
    model TEXT NOT NULL,
    dims INTEGER NOT NULL,
    chunk_count INTEGER NOT NULL,
    updated_at TEXT NOT NULL
  );
  CREATE TABLE IF NOT EXISTS entries (
    collection TEXT NOT NULL,
    chunk_id TEXT NOT NULL,
    ordinal INTEGER NOT NULL,
    text TEXT NOT NULL,
    text_sha256 TEXT NOT NULL,
    embedding TEXT NOT NULL,
    metadata TEXT NOT NULL,
    PRIMARY KEY (collection, chunk_id)
  );
  CREATE INDEX IF NOT EXISTS entries_by_ordinal ON entries(collection, ordinal);
"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedVector {
    pub chunk_id: String,
    pub ordinal: u32,
    pub text: String,
    pub text_sha256: String,
    pub embedding: Vec<f32>,
    pub metadata: FlatMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionStatus {
    pub name: String,
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub chunk_count: u32,
    pub updated_at: Option<String>,
}

impl CollectionStatus {
    pub fn missing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ready: false,
            model: None,
            dims: None,
            chunk_count: 0,
            updated_at: None,
        }
    }
}

/// Header written alongside a full collection replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionWrite<'a> {
    pub name: &'a str,
    pub model: &'a str,
    pub updated_at: &'a str,
}

pub struct CollectionStore {
    conn: Connection,
    path: Option<PathBuf>,
}

pub fn store_file(storage_dir: &Path) -> PathBuf {
    storage_dir.join(STORE_FILE_NAME)
}

fn query_err(e: rusqlite::Error, what: &str) -> AppError {
    AppError::new(codes::STORE_QUERY_FAILED, what.to_string()).with_details(e.to_string())
}

fn write_err(e: rusqlite::Error, what: &str) -> AppError {
    AppError::new(codes::STORE_WRITE_FAILED, what.to_string()).with_details(e.to_string())
}

impl CollectionStore {
    /// Opens (creating if needed) the store under `storage_dir`.
    pub fn open(storage_dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(storage_dir).map_err(|e| {
            AppError::new(codes::STORE_OPEN_FAILED, "Failed to create storage directory")
                .with_details(format!("path={}; err={}", storage_dir.display(), e))
        })?;
        let path = store_file(storage_dir);
        let conn = Connection::open(&path).map_err(|e| {
            AppError::new(codes::STORE_OPEN_FAILED, "Failed to open collection store")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let store = Self {
            conn,
            path: Some(path),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Opens the store only if its file already exists.
    pub fn open_existing(storage_dir: &Path) -> Result<Option<Self>, AppError> {
        if !store_file(storage_dir).is_file() {
            return Ok(None);
        }
        Self::open(storage_dir).map(Some)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::new(codes::STORE_OPEN_FAILED, "Failed to open in-memory collection store")
                .with_details(e.to_string())
        })?;
        let store = Self { conn, path: None };
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<(), AppError> {
        self.conn.execute_batch(SCHEMA).map_err(|e| {
            AppError::new(codes::STORE_OPEN_FAILED, "Failed to prepare collection schema")
                .with_details(e.to_string())
        })
    }

    pub fn status(&self, name: &str) -> Result<CollectionStatus, AppError> {
        let row = self
            .conn
            .query_row(
                "SELECT model, dims, chunk_count, updated_at FROM collections WHERE name = ?1",
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| query_err(e, "Failed to read collection status"))?;

        Ok(match row {
            Some((model, dims, chunk_count, updated_at)) => CollectionStatus {
                name: name.to_string(),
                ready: chunk_count > 0,
                model: Some(model),
                dims: Some(dims),
                chunk_count,
                updated_at: Some(updated_at),
            },
            None => CollectionStatus::missing(name),
        })
    }

    /// Replaces every entry of a collection in one transaction.
    pub fn replace_collection(
        &mut self,
        header: CollectionWrite<'_>,
        entries: &[IndexedVector],
    ) -> Result<CollectionStatus, AppError> {
        let dims = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dims) {
            return Err(AppError::new(
                codes::STORE_WRITE_FAILED,
                "Embedding dimensions differ within one collection",
            )
            .with_details(format!(
                "expected={dims}; got={}; chunk_id={}",
                bad.embedding.len(),
                bad.chunk_id
            )));
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| write_err(e, "Failed to start collection transaction"))?;

        tx.execute("DELETE FROM entries WHERE collection = ?1", [header.name])
            .map_err(|e| write_err(e, "Failed to clear collection entries"))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO entries(collection, chunk_id, ordinal, text, text_sha256, embedding, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|e| write_err(e, "Failed to prepare entry insert"))?;
            for entry in entries {
                let embedding = encode_json(&entry.embedding, "embedding")?;
                let metadata = encode_json(&entry.metadata, "metadata")?;
                stmt.execute(params![
                    header.name,
                    entry.chunk_id,
                    entry.ordinal,
                    entry.text,
                    entry.text_sha256,
                    embedding,
                    metadata,
                ])
                .map_err(|e| {
                    write_err(e, "Failed to insert collection entry")
                })?;
            }
        }

        tx.execute(
            "INSERT INTO collections(name, model, dims, chunk_count, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(name) DO UPDATE SET
               model = excluded.model,
               dims = excluded.dims,
               chunk_count = excluded.chunk_count,
               updated_at = excluded.updated_at",
            params![
                header.name,
                header.model,
                dims as u32,
                entries.len() as u32,
                header.updated_at
            ],
        )
        .map_err(|e| write_err(e, "Failed to record collection status"))?;

        tx.commit()
            .map_err(|e| write_err(e, "Failed to commit collection"))?;

        self.status(header.name)
    }

    /// All entries of a collection, in build order.
    pub fn read_entries(&self, name: &str) -> Result<Vec<IndexedVector>, AppError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT chunk_id, ordinal, text, text_sha256, embedding, metadata
                 FROM entries WHERE collection = ?1 ORDER BY ordinal ASC, chunk_id ASC",
            )
            .map_err(|e| query_err(e, "Failed to prepare entry query"))?;

        let rows = stmt
            .query_map([name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(|e| query_err(e, "Failed to read collection entries"))?;

        let mut out = Vec::new();
        for r in rows {
            let (chunk_id, ordinal, text, text_sha256, embedding, metadata) =
                r.map_err(|e| query_err(e, "Failed to read collection entry row"))?;
            out.push(IndexedVector {
                embedding: decode_json(&embedding, "embedding", &chunk_id)?,
                metadata: decode_json(&metadata, "metadata", &chunk_id)?,
                chunk_id,
                ordinal,
                text,
                text_sha256,
            });
        }
        Ok(out)
    }

    /// Metadata records only, skipping the embedding payload.
    pub fn read_metadata(&self, name: &str) -> Result<Vec<FlatMetadata>, AppError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT chunk_id, metadata FROM entries WHERE collection = ?1 ORDER BY ordinal ASC",
            )
            .map_err(|e| query_err(e, "Failed to prepare metadata query"))?;
        let rows = stmt
            .query_map([name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| query_err(e, "Failed to read collection metadata"))?;

        let mut out = Vec::new();
        for r in rows {
            let (chunk_id, raw) = r.map_err(|e| query_err(e, "Failed to read metadata row"))?;
            out.push(decode_json(&raw, "metadata", &chunk_id)?);
        }
        Ok(out)
    }
}

fn encode_json<T: Serialize>(value: &T, field: &str) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| {
        AppError::new(codes::STORE_WRITE_FAILED, format!("Failed to encode entry {field}"))
            .with_details(e.to_string())
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    raw: &str,
    field: &str,
    chunk_id: &str,
) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::new(codes::STORE_QUERY_FAILED, format!("Failed to decode entry {field}"))
            .with_details(format!("chunk_id={chunk_id}; err={e}"))
    })
}
