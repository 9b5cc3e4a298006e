//! Whole-vault load orchestration.
//!
//! Connects the vault model once, then runs the extractor over every note in
//! the model's file index. Extraction failures that escape the extractor are
//! logged and the note is dropped; the batch always completes.

use std::path::Path;

use crate::error::VaultError;
use crate::extract::extract_note;
use crate::models::NoteRecord;
use crate::vault::VaultModel;
use crate::vault_markdown::MarkdownVault;

/// Load every note of the vault at `vault_path` into records.
///
/// Fails fast when the path is not a directory or not a vault; after that,
/// per-note problems only degrade or drop the individual record.
pub fn load_vault(vault_path: &Path) -> Result<Vec<NoteRecord>, VaultError> {
    if !vault_path.is_dir() {
        return Err(VaultError::NotADirectory(vault_path.to_path_buf()));
    }
    if !vault_path.join(crate::discover::VAULT_MARKER).is_dir() {
        return Err(VaultError::NotAVault(vault_path.to_path_buf()));
    }

    // The expensive whole-vault pass: link graph plus metadata table,
    // exactly once, not once per note.
    let vault = MarkdownVault::connect(vault_path).map_err(|err| {
        VaultError::Io(std::io::Error::other(format!(
            "failed to connect vault {}: {}",
            vault_path.display(),
            err
        )))
    })?;

    let records = load_connected(&vault);
    println!("Processed {} notes successfully", records.len());
    Ok(records)
}

/// Extract records from an already-connected vault model, in file-index
/// order. The outer safety net: an extractor error is logged and skipped.
pub fn load_connected(vault: &dyn VaultModel) -> Vec<NoteRecord> {
    let table = vault.metadata_table();
    let root = vault.root();

    let mut records = Vec::new();
    for abs_path in vault.file_index() {
        match extract_note(vault, abs_path, root, table) {
            Ok(record) => records.push(record),
            Err(err) => {
                eprintln!("Failed to unpack {}: {}", abs_path.display(), err);
                continue;
            }
        }
    }
    records
}
