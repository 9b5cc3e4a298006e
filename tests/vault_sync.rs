//! End-to-end vault load and index synchronization scenarios, driven through
//! the public library API against a synthetic on-disk vault.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use vault_harness::config::ChunkingConfig;
use vault_harness::embedding::EmbeddingProvider;
use vault_harness::error::IndexError;
use vault_harness::index::IndexSynchronizer;
use vault_harness::loader::load_vault;
use vault_harness::store::{ChunkStore, MemoryStore};
use vault_harness::store_sqlite::SqliteStore;

/// Deterministic offline embedder so tests never need a running Ollama.
struct HashEmbedder;

impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        "hashed-test"
    }

    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let digest = Sha256::digest(text.as_bytes());
                digest.iter().take(8).map(|b| *b as f32 / 255.0).collect()
            })
            .collect())
    }
}

fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Three-note fixture: `A.md` links out (200 words), `B.md` is isolated
/// (30 words), `C.md` is isolated and too short to index (10 characters).
///
/// A's outgoing link points at a note that does not exist, so B keeps a
/// backlink count of zero and stays isolated under the derivation rule.
fn build_vault(root: &Path) {
    fs::create_dir_all(root.join(".obsidian")).unwrap();
    let a_body = format!(
        "---\ntitle: Note A\ntags: [reference]\n---\n{} [[Atomic Notes]]",
        words(198)
    );
    fs::write(root.join("A.md"), a_body).unwrap();
    fs::write(root.join("B.md"), words(30)).unwrap();
    fs::write(root.join("C.md"), "ten chars.").unwrap();
}

fn memory_sync() -> IndexSynchronizer {
    IndexSynchronizer::new(
        Box::new(MemoryStore::new("obsidian_notes", Box::new(HashEmbedder))),
        ChunkingConfig::default(),
    )
}

#[test]
fn three_note_vault_loads_and_indexes_with_defaults() {
    let tmp = TempDir::new().unwrap();
    build_vault(tmp.path());

    let records = load_vault(tmp.path()).unwrap();
    assert_eq!(records.len(), 3);

    let a = &records[0];
    let b = &records[1];
    let c = &records[2];
    assert_eq!(a.name, "A");
    assert_eq!(b.name, "B");
    assert_eq!(c.name, "C");

    // A links out; B and C neither link nor are linked to.
    assert!(!a.is_isolated);
    assert!(b.is_isolated);
    assert!(c.is_isolated);

    assert_eq!(a.approx_word_count, 200);
    assert!(a.has_frontmatter);
    assert_eq!(a.n_tags, 1);
    assert!(!b.has_frontmatter);

    let sync = memory_sync();
    sync.full_rebuild(&records).unwrap();

    // Only A and B clear the 50-character minimum; C contributes nothing.
    let status = sync.status().unwrap();
    assert!(status.document_count >= 2);
    let a_chunks = sync.chunk_and_tag(a);
    let b_chunks = sync.chunk_and_tag(b);
    let c_chunks = sync.chunk_and_tag(c);
    assert!(!a_chunks.is_empty());
    assert_eq!(b_chunks.len(), 1);
    assert!(c_chunks.is_empty());
    assert_eq!(
        sync.count().unwrap(),
        (a_chunks.len() + b_chunks.len()) as i64
    );

    // Every chunk of A carries the same tag block.
    for chunk in &a_chunks {
        assert_eq!(chunk.tag.source, "A.md");
        assert_eq!(chunk.tag.note_name, "A");
        assert_eq!(chunk.tag.n_tags, 1);
    }

    // Retracting a note that never made it into the index is a no-op.
    let before = sync.count().unwrap();
    assert_eq!(sync.delete_by_source("C.md").unwrap(), 0);
    assert_eq!(sync.count().unwrap(), before);
}

#[test]
fn rebuild_twice_gives_identical_counts() {
    let tmp = TempDir::new().unwrap();
    build_vault(tmp.path());
    let records = load_vault(tmp.path()).unwrap();

    let sync = memory_sync();
    let first = sync.full_rebuild(&records).unwrap();
    let count_first = sync.count().unwrap();
    let second = sync.full_rebuild(&records).unwrap();

    assert_eq!(first, second);
    assert_eq!(sync.count().unwrap(), count_first);
}

#[test]
fn incremental_add_skips_known_sources_and_misses_edits() {
    let tmp = TempDir::new().unwrap();
    build_vault(tmp.path());

    let sync = memory_sync();
    sync.full_rebuild(&load_vault(tmp.path()).unwrap()).unwrap();
    let base = sync.count().unwrap();

    // A brand-new note is picked up.
    fs::write(tmp.path().join("D.md"), words(40)).unwrap();
    let records = load_vault(tmp.path()).unwrap();
    let added = sync.incremental_add(&records).unwrap();
    assert!(added > 0);
    let with_d = sync.count().unwrap();
    assert!(with_d > base);

    // Running again adds nothing.
    assert_eq!(sync.incremental_add(&records).unwrap(), 0);
    assert_eq!(sync.count().unwrap(), with_d);

    // Dedup is by path identity: an edited body under a known path is NOT
    // re-indexed. Stale chunks persist until the next full rebuild.
    fs::write(tmp.path().join("B.md"), words(120)).unwrap();
    let records = load_vault(tmp.path()).unwrap();
    assert_eq!(sync.incremental_add(&records).unwrap(), 0);
    assert_eq!(sync.count().unwrap(), with_d);
}

#[test]
fn incremental_add_before_first_build_fails_predictably() {
    let tmp = TempDir::new().unwrap();
    build_vault(tmp.path());
    let records = load_vault(tmp.path()).unwrap();

    let sync = memory_sync();
    assert!(matches!(
        sync.incremental_add(&records),
        Err(IndexError::NotInitialized)
    ));
    // An untouched collection still counts zero — the caller's signal to
    // run a full rebuild instead.
    assert_eq!(sync.count().unwrap(), 0);
}

#[test]
fn sqlite_index_persists_across_instances() {
    let tmp = TempDir::new().unwrap();
    build_vault(tmp.path());
    let records = load_vault(tmp.path()).unwrap();
    let db_path = tmp.path().join("index").join("notes.sqlite");

    {
        let store =
            SqliteStore::open("obsidian_notes", &db_path, Box::new(HashEmbedder)).unwrap();
        let sync = IndexSynchronizer::new(Box::new(store), ChunkingConfig::default());
        sync.full_rebuild(&records).unwrap();
        assert!(sync.count().unwrap() > 0);
    }

    // A fresh instance bound to the same (collection, location) pair sees
    // the persisted chunks and the incremental path dedups against them.
    let store = SqliteStore::open("obsidian_notes", &db_path, Box::new(HashEmbedder)).unwrap();
    let persisted = store.count().unwrap();
    assert!(persisted > 0);

    let sync = IndexSynchronizer::new(Box::new(store), ChunkingConfig::default());
    assert_eq!(sync.incremental_add(&records).unwrap(), 0);
    assert_eq!(sync.count().unwrap(), persisted);

    let results = sync.search("word1 word2 word3", 3).unwrap();
    assert!(!results.is_empty());
}
