//! Chunk store abstraction.
//!
//! The [`ChunkStore`] trait defines the narrow surface the synchronizer
//! needs from a persistent chunk collection, enabling pluggable backends
//! (SQLite, in-memory). The index engine treats the store as a black box:
//! it never inspects vectors, only adds, deletes, and projects metadata.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`add`](ChunkStore::add) | Embed and persist a batch of chunks |
//! | [`delete_by_source`](ChunkStore::delete_by_source) | Remove all chunks of one source note |
//! | [`sources`](ChunkStore::sources) | Project the set of source paths present |
//! | [`count`](ChunkStore::count) | Total persisted chunk count (0 when never created) |
//! | [`clear`](ChunkStore::clear) | Drop every chunk in the collection |
//! | [`similarity_search`](ChunkStore::similarity_search) | Top-k cosine retrieval |

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::models::{Chunk, ScoredChunk};

/// Abstract persistent chunk collection.
pub trait ChunkStore: Send + Sync {
    /// Collection name this store is bound to.
    fn name(&self) -> &str;

    /// Storage location of the collection.
    fn location(&self) -> &Path;

    /// Identifier of the embedding model backing the collection.
    fn embedding_model(&self) -> &str;

    /// Embed and persist a batch of chunks; returns the number added.
    fn add(&self, chunks: &[Chunk]) -> Result<usize>;

    /// Remove every chunk whose source metadata equals `source`; returns the
    /// number removed. Removing an absent source is a no-op.
    fn delete_by_source(&self, source: &str) -> Result<usize>;

    /// The set of distinct source paths currently present.
    fn sources(&self) -> Result<HashSet<String>>;

    /// Total chunk count. A collection that was never written to counts 0.
    fn count(&self) -> Result<i64>;

    /// Drop every chunk in the collection.
    fn clear(&self) -> Result<()>;

    /// Top-`k` chunks by cosine similarity to the embedded query.
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>>;
}

struct StoredRow {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// In-memory store for tests and ephemeral indexing.
///
/// Brute-force cosine similarity over all stored vectors.
pub struct MemoryStore {
    name: String,
    location: PathBuf,
    provider: Box<dyn EmbeddingProvider>,
    rows: RwLock<Vec<StoredRow>>,
}

impl MemoryStore {
    pub fn new(name: &str, provider: Box<dyn EmbeddingProvider>) -> Self {
        Self {
            name: name.to_string(),
            location: PathBuf::from(":memory:"),
            provider,
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl ChunkStore for MemoryStore {
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

        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            rows.push(StoredRow {
                chunk: chunk.clone(),
                vector,
            });
        }
        Ok(chunks.len())
    }

    fn delete_by_source(&self, source: &str) -> Result<usize> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let before = rows.len();
        rows.retain(|row| row.chunk.tag.source != source);
        Ok(before - rows.len())
    }

    fn sources(&self) -> Result<HashSet<String>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(rows.iter().map(|row| row.chunk.tag.source.clone()).collect())
    }

    fn count(&self) -> Result<i64> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(rows.len() as i64)
    }

    fn clear(&self) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        rows.clear();
        Ok(())
    }

    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_vec = self.provider.embed_query(query)?;
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| ScoredChunk {
                text: row.chunk.text.clone(),
                score: cosine_similarity(&query_vec, &row.vector) as f64,
                tag: row.chunk.tag.clone(),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}
