//! Core data models used throughout Vault Harness.
//!
//! These types represent the vaults, notes, and chunks that flow through the
//! discovery, extraction, and indexing pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One discovered vault root.
///
/// Produced by [`crate::discover::discover_vaults`]; immutable and never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct VaultDescriptor {
    /// Absolute, canonicalized vault root.
    pub path: PathBuf,
    /// Last path component, or `"[root]"` when the path has none.
    pub name: String,
    /// Full recursive count of `.md` files under the root.
    pub markdown_count: usize,
    /// Recursion depth at which the vault was found (scan root = 0).
    pub depth: usize,
}

/// Fast structural facts for one note, keyed by absolute file path.
///
/// Computed once per vault load as a bulk pass over the link graph, then
/// looked up per note.
#[derive(Debug, Clone)]
pub struct NoteMetadataRow {
    pub abs_path: PathBuf,
    pub rel_path: String,
    pub note_exists: bool,
    pub n_backlinks: i64,
    pub n_wikilinks: Option<i64>,
    pub n_tags: Option<i64>,
    pub n_embedded_files: Option<i64>,
    pub modified_time: Option<DateTime<Utc>>,
}

/// The canonical per-note record the rest of the system consumes.
///
/// `relative_path` (vault-relative, forward-slash form) is the durable
/// identifier used for index dedup and deletion. A record whose path could
/// not be resolved carries `"unknown"` plus an [`error`](NoteRecord::error)
/// marker and is never indexed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoteRecord {
    pub relative_path: String,

    // Structural fields, from the metadata table.
    pub note_exists: bool,
    pub n_backlinks: i64,
    pub n_wikilinks: i64,
    pub n_tags: i64,
    pub n_embedded_files: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time_iso: Option<String>,

    // Content fields, from the vault model getters.
    pub name: String,
    pub raw_content: String,
    pub clean_body: String,
    pub frontmatter: BTreeMap<String, serde_json::Value>,
    pub tags: Vec<String>,
    pub backlinks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_links: Option<Vec<String>>,
    /// Message of the first getter failure, if content extraction degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub getters_error: Option<String>,

    // Derived fields, computed from the above with no further I/O.
    pub is_isolated: bool,
    pub approx_word_count: usize,
    pub has_frontmatter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Set when the record could not be extracted at all (e.g. not a file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NoteRecord {
    /// Degraded record for a path that does not resolve to a regular file.
    pub fn not_a_file() -> Self {
        NoteRecord {
            relative_path: "unknown".to_string(),
            error: Some("not_a_file".to_string()),
            ..Default::default()
        }
    }

    /// True when the record must be excluded from indexing.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some() || self.relative_path == "unknown"
    }
}

/// Metadata block shared by every chunk cut from one note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkTag {
    /// Vault-relative path of the source note (forward-slash form).
    pub source: String,
    pub note_name: String,
    pub n_backlinks: i64,
    pub n_tags: i64,
}

/// A bounded-length slice of one note's clean body.
///
/// Chunks from the same note share an identical [`ChunkTag`] and preserve
/// document order; `start_index` is the byte offset of `text` within the
/// original body.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    /// SHA-256 of `text`.
    pub hash: String,
    pub start_index: usize,
    pub tag: ChunkTag,
}

/// A scored chunk returned from the store's similarity interface.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f64,
    pub tag: ChunkTag,
}

/// Read-only snapshot of a synchronizer's collection.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub collection: String,
    pub location: PathBuf,
    pub document_count: i64,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}
