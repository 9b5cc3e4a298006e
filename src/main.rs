//! # Vault Harness CLI (`vlt`)
//!
//! The `vlt` binary is the primary interface for Vault Harness. It provides
//! commands for vault discovery, index synchronization, retrieval, and
//! index maintenance.
//!
//! ## Usage
//!
//! ```bash
//! vlt --config ./vlt.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vlt discover <root>` | Find Obsidian vaults under a directory |
//! | `vlt sync <vault>` | Load a vault and synchronize the chunk index |
//! | `vlt status` | Show a snapshot of the persistent index |
//! | `vlt search "<query>"` | Similarity search over indexed chunks |
//! | `vlt delete <source>` | Retract one note's chunks from the index |
//!
//! ## Examples
//!
//! ```bash
//! # Find vaults up to three directory levels down
//! vlt discover ~/notes --max-depth 3
//!
//! # First sync builds the index from scratch; later syncs only add new notes
//! vlt sync ~/notes/my-vault
//!
//! # Force a clean rebuild after heavy edits
//! vlt sync ~/notes/my-vault --full
//!
//! # Retrieve the closest chunks for a question
//! vlt search "what are evergreen notes" --k 7
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vault_harness::index::IndexSynchronizer;
use vault_harness::store_sqlite::SqliteStore;
use vault_harness::{config, discover, embedding, loader};

/// Vault Harness CLI — an Obsidian vault ingestion and incremental semantic
/// indexing engine.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; built-in defaults apply when the file does not exist.
#[derive(Parser)]
#[command(
    name = "vlt",
    about = "Vault Harness — Obsidian vault ingestion and incremental semantic indexing",
    version,
    long_about = "Vault Harness discovers Obsidian-style vaults, extracts a canonical record per \
    note (link-graph stats merged with cleaned content), chunks the bodies, and keeps a \
    persistent embedded chunk index in sync via full rebuilds or incremental delta-adds."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./vlt.toml`. Index, chunking, embedding, discovery, and
    /// retrieval settings are read from this file.
    #[arg(long, global = true, default_value = "./vlt.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Find Obsidian vaults under a directory.
    ///
    /// Recursively scans for directories that contain a `.obsidian`
    /// subdirectory, down to the configured depth bound. Unreadable
    /// directories are skipped.
    Discover {
        /// Directory to start scanning from.
        root: PathBuf,

        /// Maximum recursion depth (the scan root is depth 0).
        /// Overrides `[discovery].max_depth` from the config.
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Load a vault and synchronize the chunk index.
    ///
    /// Loads every note, then either rebuilds the index from scratch (first
    /// sync, or `--full`) or incrementally adds notes the index has not
    /// seen. Incremental sync dedups by note path, not content: edited
    /// notes are only picked up by a full rebuild.
    Sync {
        /// Path to the vault root (must contain `.obsidian`).
        vault: PathBuf,

        /// Clear the collection and re-index everything.
        #[arg(long)]
        full: bool,
    },

    /// Show a snapshot of the persistent index.
    Status,

    /// Similarity search over indexed chunks.
    Search {
        /// The search query string.
        query: String,

        /// Number of chunks to return. Overrides `[retrieval].k`.
        #[arg(long)]
        k: Option<usize>,
    },

    /// Retract one note's chunks from the index.
    Delete {
        /// Vault-relative path of the note (e.g. `sub/Note.md`).
        source: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Discover { root, max_depth } => {
            let depth = max_depth.unwrap_or(cfg.discovery.max_depth);
            let vaults = discover::discover_vaults(&root, depth);
            if vaults.is_empty() {
                println!("No vaults found under {}", root.display());
                return Ok(());
            }
            println!("{:<6} {:>6}  {:<24} PATH", "DEPTH", "NOTES", "NAME");
            for vault in &vaults {
                println!(
                    "{:<6} {:>6}  {:<24} {}",
                    vault.depth,
                    vault.markdown_count,
                    vault.name,
                    vault.path.display()
                );
            }
        }
        Commands::Sync { vault, full } => {
            let records = loader::load_vault(&vault)?;
            let sync = open_synchronizer(&cfg)?;

            // An empty count means "no index yet" — take the rebuild path.
            if full || sync.count()? == 0 {
                sync.full_rebuild(&records)?;
            } else {
                sync.incremental_add(&records)?;
            }
        }
        Commands::Status => {
            let sync = open_synchronizer(&cfg)?;
            let status = sync.status()?;
            println!("Vault Harness — Index Status");
            println!("============================");
            println!();
            println!("  Collection:      {}", status.collection);
            println!("  Location:        {}", status.location.display());
            println!("  Documents:       {}", status.document_count);
            println!("  Embedding model: {}", status.embedding_model);
            println!("  Chunk size:      {}", status.chunk_size);
            println!("  Chunk overlap:   {}", status.chunk_overlap);
        }
        Commands::Search { query, k } => {
            let sync = open_synchronizer(&cfg)?;
            let k = k.unwrap_or(cfg.retrieval.k);
            let results = sync.search(&query, k)?;
            if results.is_empty() {
                println!("No results.");
                return Ok(());
            }
            for (rank, result) in results.iter().enumerate() {
                println!(
                    "{:>2}. [{:.3}] {} ({})",
                    rank + 1,
                    result.score,
                    result.tag.note_name,
                    result.tag.source
                );
                let preview: String = result.text.chars().take(160).collect();
                println!("    {}", preview.replace('\n', " "));
            }
        }
        Commands::Delete { source } => {
            let sync = open_synchronizer(&cfg)?;
            let removed = sync.delete_by_source(&source)?;
            println!("Removed {} chunks for {}", removed, source);
        }
    }

    Ok(())
}

fn open_synchronizer(cfg: &config::Config) -> Result<IndexSynchronizer> {
    let provider = embedding::create_provider(&cfg.embedding)?;
    let store = SqliteStore::open(&cfg.index.collection, &cfg.index.path, provider)?;
    Ok(IndexSynchronizer::new(
        Box::new(store),
        cfg.chunking.clone(),
    ))
}
