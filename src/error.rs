//! Failure taxonomy for the ingestion and indexing pipeline.
//!
//! Discovery errors never reach these types — unreadable subtrees are
//! skipped in place. Vault-level precondition failures and index ordering
//! violations are fatal for the call that hit them and surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Vault-level precondition failures raised by [`crate::loader::load_vault`].
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("no .obsidian folder found in {0}")]
    NotAVault(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-note failures that escape the extractor instead of degrading the
/// record. The loader catches these, logs, and drops the note from the batch.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("note path {path} is not under the vault root {root}")]
    OutsideVault { path: PathBuf, root: PathBuf },
}

/// Index-state failures raised by [`crate::index::IndexSynchronizer`].
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index is empty; run a full rebuild before adding notes incrementally")]
    NotInitialized,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
