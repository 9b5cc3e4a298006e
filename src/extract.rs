//! Per-note record extraction.
//!
//! Merges the fast structural facts from the precomputed metadata table with
//! the rich content getters of the vault model into one [`NoteRecord`].
//! Most failures degrade the record instead of raising: a missing file
//! yields an `"unknown"` error record, a getter failure is captured into
//! `getters_error` with the structural fields intact. Only path resolution
//! failures escape to the caller.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ExtractError;
use crate::models::{NoteMetadataRow, NoteRecord};
use crate::vault::VaultModel;

/// Build the canonical record for one note.
///
/// `metadata_table` is the bulk table computed when the vault connected;
/// notes without a row fall back to zeroed structural fields rather than
/// failing.
pub fn extract_note(
    vault: &dyn VaultModel,
    abs_path: &Path,
    vault_root: &Path,
    metadata_table: &HashMap<std::path::PathBuf, NoteMetadataRow>,
) -> Result<NoteRecord, ExtractError> {
    if !abs_path.is_file() {
        return Ok(NoteRecord::not_a_file());
    }

    let rel_path = abs_path
        .strip_prefix(vault_root)
        .map_err(|_| ExtractError::OutsideVault {
            path: abs_path.to_path_buf(),
            root: vault_root.to_path_buf(),
        })?;
    let relative_path = forward_slash(rel_path);

    let mut record = NoteRecord {
        relative_path,
        ..Default::default()
    };

    // Fast stats. A missing or partial row coerces to zero, not to an error.
    if let Some(row) = metadata_table.get(abs_path) {
        record.note_exists = row.note_exists;
        record.n_backlinks = row.n_backlinks;
        record.n_wikilinks = row.n_wikilinks.unwrap_or(0);
        record.n_tags = row.n_tags.unwrap_or(0);
        record.n_embedded_files = row.n_embedded_files.unwrap_or(0);
        record.modified_time_iso = row.modified_time.map(|ts| ts.to_rfc3339());
    }

    // Rich getters, keyed by stem. The first failure is captured and ends
    // content extraction; everything gathered so far stays on the record.
    let stem = abs_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    record.name = stem.clone();

    if let Err(err) = fill_content(vault, &stem, &mut record) {
        record.getters_error = Some(err.to_string());
    }

    // Derived, from already-extracted fields only.
    record.is_isolated = record.n_backlinks == 0 && record.n_wikilinks == 0;
    record.approx_word_count = record.clean_body.split_whitespace().count();
    record.has_frontmatter = !record.frontmatter.is_empty();
    record.last_modified = record.modified_time_iso.clone();

    Ok(record)
}

fn fill_content(
    vault: &dyn VaultModel,
    stem: &str,
    record: &mut NoteRecord,
) -> anyhow::Result<()> {
    record.raw_content = vault.source_text(stem)?;
    record.clean_body = vault.readable_text(stem)?;
    record.frontmatter = vault.front_matter(stem)?;
    record.tags = vault.tags(stem)?;
    record.backlinks = vault.backlinks(stem)?;

    // Optional capability surface; absence is not an error.
    if let Some(ext) = vault.extended() {
        record.embedded_files = Some(ext.embedded_files(stem)?);
        record.outgoing_links = Some(ext.outgoing_links(stem)?);
    }

    Ok(())
}

fn forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
