//! Index synchronization.
//!
//! [`IndexSynchronizer`] owns a persistent chunk collection and reconciles
//! it against a loaded set of [`NoteRecord`]s. Two modes: a full rebuild
//! that clears and reinserts everything, and an incremental add that only
//! indexes sources the collection has not seen.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::chunk::split_text;
use crate::config::ChunkingConfig;
use crate::error::IndexError;
use crate::models::{Chunk, ChunkTag, IndexStatus, NoteRecord, ScoredChunk};
use crate::store::ChunkStore;

/// Synchronizes one chunk collection with the current note set.
///
/// The store binding — collection name plus storage location — is fixed for
/// the lifetime of the instance.
pub struct IndexSynchronizer {
    store: Box<dyn ChunkStore>,
    chunking: ChunkingConfig,
}

impl IndexSynchronizer {
    pub fn new(store: Box<dyn ChunkStore>, chunking: ChunkingConfig) -> Self {
        Self { store, chunking }
    }

    /// Split one note's clean body into tagged chunks.
    ///
    /// Notes whose trimmed body is shorter than the configured minimum are
    /// skipped entirely, as are degraded records — near-empty content would
    /// only pollute similarity search. Every chunk from one note carries the
    /// same metadata block plus its own start offset into the body.
    pub fn chunk_and_tag(&self, note: &NoteRecord) -> Vec<Chunk> {
        if note.is_degraded() {
            return Vec::new();
        }

        let clean = note.clean_body.trim();
        if clean.chars().count() < self.chunking.min_text_length {
            eprintln!("Skipping short/empty note: {}", note.relative_path);
            return Vec::new();
        }

        let tag = ChunkTag {
            source: note.relative_path.clone(),
            note_name: note.name.clone(),
            n_backlinks: note.n_backlinks,
            n_tags: note.n_tags,
        };

        // Offsets from the splitter are relative to the trimmed body; shift
        // them so they index into the original clean body.
        let lead = note.clean_body.len() - note.clean_body.trim_start().len();

        split_text(clean, self.chunking.chunk_size, self.chunking.chunk_overlap)
            .into_iter()
            .map(|piece| Chunk {
                id: Uuid::new_v4().to_string(),
                text: piece.text.to_string(),
                hash: format!("{:x}", Sha256::digest(piece.text.as_bytes())),
                start_index: lead + piece.start,
                tag: tag.clone(),
            })
            .collect()
    }

    /// Clear the collection unconditionally, then index every note.
    ///
    /// The correctness-preserving but expensive path: afterwards the index
    /// reflects exactly the given note set, with no stale or duplicate
    /// entries, at the cost of re-embedding everything.
    pub fn full_rebuild(&self, notes: &[NoteRecord]) -> Result<usize, IndexError> {
        self.store.clear()?;
        self.index_notes(notes)
    }

    /// Index only the notes whose `relative_path` the collection has never
    /// seen.
    ///
    /// Dedup is by source identity, not content: a note whose body changed
    /// under an unchanged path is NOT re-indexed here — stale chunks persist
    /// until the next full rebuild. The read-sources-then-add sequence is
    /// also not atomic with respect to concurrent writers on the same
    /// collection; this engine assumes a single writer.
    ///
    /// Calling this against a collection that was never built fails with
    /// [`IndexError::NotInitialized`]; callers should treat `count() == 0`
    /// as "no index yet" and run [`full_rebuild`](Self::full_rebuild).
    pub fn incremental_add(&self, notes: &[NoteRecord]) -> Result<usize, IndexError> {
        if self.store.count()? == 0 {
            return Err(IndexError::NotInitialized);
        }

        let existing = self.store.sources()?;
        let fresh: Vec<&NoteRecord> = notes
            .iter()
            .filter(|note| !existing.contains(&note.relative_path))
            .collect();

        let documents: Vec<Chunk> = fresh
            .iter()
            .flat_map(|note| self.chunk_and_tag(note))
            .collect();
        self.persist(fresh.len(), documents)
    }

    /// Remove all chunks whose source equals `relative_path`. Retracting a
    /// source that was never indexed is a no-op.
    pub fn delete_by_source(&self, relative_path: &str) -> Result<usize, IndexError> {
        Ok(self.store.delete_by_source(relative_path)?)
    }

    /// Total chunk count currently persisted; 0 for a collection that has
    /// never been created.
    pub fn count(&self) -> Result<i64, IndexError> {
        Ok(self.store.count()?)
    }

    /// Read-only snapshot of the collection; never mutates it.
    pub fn status(&self) -> Result<IndexStatus, IndexError> {
        Ok(IndexStatus {
            collection: self.store.name().to_string(),
            location: self.store.location().to_path_buf(),
            document_count: self.store.count()?,
            embedding_model: self.store.embedding_model().to_string(),
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
        })
    }

    /// Top-`k` similarity retrieval over the collection.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Ok(self.store.similarity_search(query, k)?)
    }

    fn index_notes(&self, notes: &[NoteRecord]) -> Result<usize, IndexError> {
        let documents: Vec<Chunk> = notes
            .iter()
            .flat_map(|note| self.chunk_and_tag(note))
            .collect();
        self.persist(notes.len(), documents)
    }

    fn persist(&self, note_count: usize, documents: Vec<Chunk>) -> Result<usize, IndexError> {
        if documents.is_empty() {
            println!("No valid text to index.");
            return Ok(0);
        }

        let added = self.store.add(&documents)?;
        println!("Ingestion complete");
        println!("  - Total notes processed: {}", note_count);
        println!("  - Total chunks added:    {}", added);
        println!("  - Collection:            {}", self.store.name());
        println!("  - Persisted to:          {}", self.store.location().display());
        Ok(added)
    }
}
