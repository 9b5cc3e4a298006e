//! SQLite-backed persistent chunk store.
//!
//! One database file can hold several named collections; every statement is
//! scoped by the collection column, so a store instance stays bound to its
//! `(collection, location)` pair for its whole lifetime. Embedding vectors
//! are stored inline as little-endian f32 BLOBs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, EmbeddingProvider};
use crate::models::{Chunk, ChunkTag, ScoredChunk};
use crate::store::ChunkStore;

pub struct SqliteStore {
    name: String,
    location: PathBuf,
    provider: Box<dyn EmbeddingProvider>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `location` and bind to `collection`.
    ///
    /// A collection that has never been written to simply counts zero rows;
    /// opening is idempotent.
    pub fn open(
        collection: &str,
        location: &Path,
        provider: Box<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if let Some(parent) = location.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(location)
            .with_context(|| format!("Failed to open index database: {}", location.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chunks (
                id          TEXT PRIMARY KEY,
                collection  TEXT NOT NULL,
                source      TEXT NOT NULL,
                note_name   TEXT NOT NULL,
                n_backlinks INTEGER NOT NULL,
                n_tags      INTEGER NOT NULL,
                start_index INTEGER NOT NULL,
                text        TEXT NOT NULL,
                hash        TEXT NOT NULL,
                embedding   BLOB NOT NULL,
                model       TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chunks_collection_source
             ON chunks (collection, source)",
            [],
        )?;

        Ok(Self {
            name: collection.to_string(),
            location: location.to_path_buf(),
            provider,
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("store mutex poisoned"))
    }
}

impl ChunkStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> &Path {
        &self.location
    }

    fn embedding_model(&self) -> &str {
        self.provider.model_name()
    }

    fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.provider.embed(&texts)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (chunk, vector) in chunks.iter().zip(&vectors) {
            tx.execute(
                "INSERT INTO chunks
                 (id, collection, source, note_name, n_backlinks, n_tags,
                  start_index, text, hash, embedding, model)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    chunk.id,
                    self.name,
                    chunk.tag.source,
                    chunk.tag.note_name,
                    chunk.tag.n_backlinks,
                    chunk.tag.n_tags,
                    chunk.start_index as i64,
                    chunk.text,
                    chunk.hash,
                    vec_to_blob(vector),
                    self.provider.model_name(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(chunks.len())
    }

    fn delete_by_source(&self, source: &str) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM chunks WHERE collection = ?1 AND source = ?2",
            params![self.name, source],
        )?;
        Ok(removed)
    }

    fn sources(&self) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT source FROM chunks WHERE collection = ?1")?;
        let rows = stmt.query_map(params![self.name], |row| row.get::<_, String>(0))?;
        let mut sources = HashSet::new();
        for row in rows {
            sources.insert(row?);
        }
        Ok(sources)
    }

    fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM chunks WHERE collection = ?1",
            params![self.name],
        )?;
        Ok(())
    }

    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_vec = self.provider.embed_query(query)?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT text, source, note_name, n_backlinks, n_tags, embedding
             FROM chunks WHERE collection = ?1",
        )?;
        let rows = stmt.query_map(params![self.name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Vec<u8>>(5)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (text, source, note_name, n_backlinks, n_tags, blob) = row?;
            let vector = blob_to_vec(&blob);
            scored.push(ScoredChunk {
                text,
                score: cosine_similarity(&query_vec, &vector) as f64,
                tag: ChunkTag {
                    source,
                    note_name,
                    n_backlinks,
                    n_tags,
                },
            });
        }
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}
