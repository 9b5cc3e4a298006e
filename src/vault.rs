//! Vault model contracts.
//!
//! A vault model owns the expensive whole-vault state: the link graph, the
//! bulk metadata table, and per-note content getters keyed by note stem.
//! [`VaultModel`] is the base contract every collaborator must satisfy;
//! [`VaultModelExt`] carries the optional getters some models cannot
//! provide. Callers probe for the extended surface through
//! [`VaultModel::extended`] — absence is not an error.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::models::NoteMetadataRow;

/// Base contract for a connected vault model.
///
/// Getters are keyed by note stem (file name without extension) and may fail
/// for unknown stems or unreadable content; the extractor converts such
/// failures into a degraded record rather than aborting the batch.
pub trait VaultModel {
    /// Canonicalized vault root.
    fn root(&self) -> &Path;

    /// Bulk structural metadata, keyed by absolute note path.
    ///
    /// Computed once when the model connects; looked up per note.
    fn metadata_table(&self) -> &HashMap<PathBuf, NoteMetadataRow>;

    /// Authoritative ordered index of note file paths (absolute).
    fn file_index(&self) -> &[PathBuf];

    /// Verbatim source text of a note.
    fn source_text(&self, stem: &str) -> Result<String>;

    /// Note body with front matter and markup stripped.
    fn readable_text(&self, stem: &str) -> Result<String>;

    /// Parsed front matter mapping; empty when the note has none.
    fn front_matter(&self, stem: &str) -> Result<BTreeMap<String, serde_json::Value>>;

    /// All tags of a note (front matter and inline, deduplicated, in order).
    fn tags(&self, stem: &str) -> Result<Vec<String>>;

    /// Stems of the notes that link to this one.
    fn backlinks(&self, stem: &str) -> Result<Vec<String>>;

    /// Optional extended getters, when the model supports them.
    fn extended(&self) -> Option<&dyn VaultModelExt> {
        None
    }
}

/// Optional getters a vault model may additionally provide.
pub trait VaultModelExt {
    /// Targets of `![[...]]` embeds in a note.
    fn embedded_files(&self, stem: &str) -> Result<Vec<String>>;

    /// Targets of outgoing markdown-style `[text](target)` links.
    fn outgoing_links(&self, stem: &str) -> Result<Vec<String>>;
}
