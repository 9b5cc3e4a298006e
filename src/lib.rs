//! # Vault Harness
//!
//! An Obsidian vault ingestion and incremental semantic indexing engine.
//!
//! Vault Harness discovers Obsidian-style vaults on disk, turns every note
//! into a canonical record (structural link-graph stats merged with cleaned
//! content), chunks the note bodies, and keeps a persistent embedded chunk
//! index in sync — either by full rebuild or by incremental delta-add.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────────┐
//! │ discover  │──▶│ MarkdownVault│──▶│ NoteRecord │──▶│ Synchronizer │
//! │(.obsidian)│   │  link graph  │   │  per note  │   │ chunk+embed  │
//! └───────────┘   └──────────────┘   └────────────┘   └──────┬───────┘
//!                                                            ▼
//!                                                     ┌─────────────┐
//!                                                     │ ChunkStore  │
//!                                                     │ SQLite/mem  │
//!                                                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! vlt discover ~/notes --max-depth 3    # find vaults
//! vlt sync ~/notes/my-vault             # index (full on first run, delta after)
//! vlt sync ~/notes/my-vault --full      # force a clean rebuild
//! vlt search "evergreen notes" --k 7
//! vlt status
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Failure taxonomy |
//! | [`discover`] | Bounded-depth vault discovery |
//! | [`vault`] | Vault model contracts |
//! | [`vault_markdown`] | Default markdown vault model |
//! | [`extract`] | Per-note record extraction |
//! | [`loader`] | Whole-vault load orchestration |
//! | [`chunk`] | Text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Chunk store abstraction |
//! | [`store_sqlite`] | SQLite-backed persistent store |
//! | [`index`] | Index synchronization |

pub mod chunk;
pub mod config;
pub mod discover;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod loader;
pub mod models;
pub mod store;
pub mod store_sqlite;
pub mod vault;
pub mod vault_markdown;
