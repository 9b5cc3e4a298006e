//! Default vault model for markdown vaults on disk.
//!
//! [`MarkdownVault`] scans every `.md` file under a vault root, parses front
//! matter, wikilinks, embeds, and tags, resolves the backlink graph, and
//! precomputes the bulk metadata table the extractor looks notes up in.
//! Connecting is the expensive whole-vault operation; every getter after
//! that is an in-memory lookup.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use walkdir::WalkDir;

use crate::models::NoteMetadataRow;
use crate::vault::{VaultModel, VaultModelExt};

static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());
static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[\[([^\]]+)\]\]").unwrap());
static INLINE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#([a-zA-Z][a-zA-Z0-9_/-]*)").unwrap());
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// Everything the vault knows about one parsed note.
struct NoteData {
    abs_path: PathBuf,
    rel_path: String,
    raw: String,
    clean: String,
    frontmatter: BTreeMap<String, serde_json::Value>,
    tags: Vec<String>,
    wikilinks: Vec<String>,
    embeds: Vec<String>,
    md_links: Vec<String>,
    backlinks: Vec<String>,
    modified: Option<DateTime<Utc>>,
}

/// A connected markdown vault: parsed notes, link graph, metadata table.
pub struct MarkdownVault {
    root: PathBuf,
    notes: BTreeMap<String, NoteData>,
    index: Vec<PathBuf>,
    table: HashMap<PathBuf, NoteMetadataRow>,
}

impl MarkdownVault {
    /// Scan and parse every note under `root`, then resolve the link graph
    /// and build the metadata table.
    ///
    /// Individual notes that cannot be read are skipped with a warning;
    /// only a failure to list the root itself is fatal.
    pub fn connect(root: &Path) -> Result<Self> {
        let root = root.canonicalize()?;
        let exclude = build_globset(&[
            "**/.obsidian/**".to_string(),
            "**/.trash/**".to_string(),
            "**/.git/**".to_string(),
        ])?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("md"))
                != Some(true)
            {
                continue;
            }
            let relative = path.strip_prefix(&root).unwrap_or(path);
            if exclude.is_match(relative) {
                continue;
            }
            paths.push(path.to_path_buf());
        }
        // Sort for deterministic ordering; later duplicates of a stem shadow
        // earlier ones the way a stem-keyed index must.
        paths.sort();

        let mut notes: BTreeMap<String, NoteData> = BTreeMap::new();
        for abs_path in paths {
            let stem = match abs_path.file_stem() {
                Some(stem) => stem.to_string_lossy().to_string(),
                None => continue,
            };
            let raw = match std::fs::read_to_string(&abs_path) {
                Ok(raw) => raw,
                Err(err) => {
                    eprintln!("Skipping unreadable note {}: {}", abs_path.display(), err);
                    continue;
                }
            };
            let rel_path = forward_slash(abs_path.strip_prefix(&root).unwrap_or(&abs_path));
            let modified = std::fs::metadata(&abs_path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);

            notes.insert(stem, parse_note(abs_path, rel_path, raw, modified));
        }

        let mut vault = MarkdownVault {
            root,
            notes,
            index: Vec::new(),
            table: HashMap::new(),
        };
        vault.gather();
        Ok(vault)
    }

    /// Resolve backlinks and populate the file index and metadata table.
    fn gather(&mut self) {
        let mut backlinks: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (stem, note) in &self.notes {
            for target in &note.wikilinks {
                let target_stem = link_stem(target);
                if self.notes.contains_key(&target_stem) {
                    backlinks
                        .entry(target_stem)
                        .or_default()
                        .push(stem.clone());
                }
            }
        }
        for (stem, links) in backlinks {
            if let Some(note) = self.notes.get_mut(&stem) {
                note.backlinks = links;
            }
        }

        self.index = self.notes.values().map(|n| n.abs_path.clone()).collect();
        self.table = self
            .notes
            .values()
            .map(|note| {
                (
                    note.abs_path.clone(),
                    NoteMetadataRow {
                        abs_path: note.abs_path.clone(),
                        rel_path: note.rel_path.clone(),
                        note_exists: true,
                        n_backlinks: note.backlinks.len() as i64,
                        n_wikilinks: Some(note.wikilinks.len() as i64),
                        n_tags: Some(note.tags.len() as i64),
                        n_embedded_files: Some(note.embeds.len() as i64),
                        modified_time: note.modified,
                    },
                )
            })
            .collect();
    }

    fn note(&self, stem: &str) -> Result<&NoteData> {
        self.notes
            .get(stem)
            .ok_or_else(|| anyhow!("note not found in vault index: {}", stem))
    }
}

impl VaultModel for MarkdownVault {
    fn root(&self) -> &Path {
        &self.root
    }

    fn metadata_table(&self) -> &HashMap<PathBuf, NoteMetadataRow> {
        &self.table
    }

    fn file_index(&self) -> &[PathBuf] {
        &self.index
    }

    fn source_text(&self, stem: &str) -> Result<String> {
        Ok(self.note(stem)?.raw.clone())
    }

    fn readable_text(&self, stem: &str) -> Result<String> {
        Ok(self.note(stem)?.clean.clone())
    }

    fn front_matter(&self, stem: &str) -> Result<BTreeMap<String, serde_json::Value>> {
        Ok(self.note(stem)?.frontmatter.clone())
    }

    fn tags(&self, stem: &str) -> Result<Vec<String>> {
        Ok(self.note(stem)?.tags.clone())
    }

    fn backlinks(&self, stem: &str) -> Result<Vec<String>> {
        Ok(self.note(stem)?.backlinks.clone())
    }

    fn extended(&self) -> Option<&dyn VaultModelExt> {
        Some(self)
    }
}

impl VaultModelExt for MarkdownVault {
    fn embedded_files(&self, stem: &str) -> Result<Vec<String>> {
        Ok(self.note(stem)?.embeds.clone())
    }

    fn outgoing_links(&self, stem: &str) -> Result<Vec<String>> {
        Ok(self.note(stem)?.md_links.clone())
    }
}

fn parse_note(
    abs_path: PathBuf,
    rel_path: String,
    raw: String,
    modified: Option<DateTime<Utc>>,
) -> NoteData {
    let (yaml, body) = split_front_matter(&raw);
    let frontmatter = parse_front_matter(&yaml);

    let embeds: Vec<String> = EMBED_RE
        .captures_iter(&body)
        .map(|c| c[1].trim().to_string())
        .collect();
    let wikilinks = extract_wikilinks(&body);
    let md_links: Vec<String> = MD_LINK_RE
        .captures_iter(&body)
        .map(|c| c[2].trim().to_string())
        .collect();
    let inline_tags: Vec<String> = INLINE_TAG_RE
        .captures_iter(&body)
        .map(|c| c[1].to_string())
        .collect();

    // Front matter tags first, inline tags after, deduplicated
    // case-insensitively.
    let mut tags = front_matter_tags(&frontmatter);
    for tag in inline_tags {
        let lower = tag.to_lowercase();
        if !tags.iter().any(|t| t.to_lowercase() == lower) {
            tags.push(tag);
        }
    }

    let clean = readable_text_of(&body);

    NoteData {
        abs_path,
        rel_path,
        raw,
        clean,
        frontmatter,
        tags,
        wikilinks,
        embeds,
        md_links,
        backlinks: Vec::new(),
        modified,
    }
}

/// Wikilink targets, excluding embeds; aliases and heading anchors dropped.
fn extract_wikilinks(body: &str) -> Vec<String> {
    WIKILINK_RE
        .captures_iter(body)
        .filter(|c| {
            let m = c.get(0).unwrap();
            m.start() == 0 || body.as_bytes()[m.start() - 1] != b'!'
        })
        .filter_map(|c| {
            let inner = c[1].to_string();
            let target = inner.split('|').next().unwrap_or("");
            let target = target.split('#').next().unwrap_or("").trim();
            if target.is_empty() {
                None
            } else {
                Some(target.to_string())
            }
        })
        .collect()
}

/// Stem of a wikilink target, which may be a `sub/Note` style path.
fn link_stem(target: &str) -> String {
    target
        .rsplit('/')
        .next()
        .unwrap_or(target)
        .trim()
        .to_string()
}

/// Split content into (front matter yaml, body). Empty yaml if none found.
fn split_front_matter(content: &str) -> (String, String) {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return (String::new(), content.to_string());
    }

    let after_open = &trimmed[3..];
    if let Some(close_idx) = after_open.find("\n---") {
        let yaml = after_open[..close_idx].trim().to_string();
        let body_start = close_idx + 4;
        let body = if body_start < after_open.len() {
            after_open[body_start..].trim_start_matches('\n').to_string()
        } else {
            String::new()
        };
        (yaml, body)
    } else {
        (String::new(), content.to_string())
    }
}

/// Parse front matter into a key/value map. Hand-rolled YAML subset:
/// scalar values, quoted strings, inline `[a, b]` lists, and block lists.
fn parse_front_matter(yaml: &str) -> BTreeMap<String, serde_json::Value> {
    let mut map = BTreeMap::new();
    let lines: Vec<&str> = yaml.lines().collect();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim_end();
        i += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || line.starts_with(' ') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            continue;
        }

        let parsed = if value.is_empty() {
            // Block list: following "- item" lines belong to this key.
            let mut items = Vec::new();
            while i < lines.len() {
                let next = lines[i].trim();
                if let Some(item) = next.strip_prefix("- ") {
                    items.push(serde_json::Value::String(unquote(item)));
                    i += 1;
                } else {
                    break;
                }
            }
            if items.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::Array(items)
            }
        } else if value.starts_with('[') {
            serde_json::Value::Array(
                parse_inline_list(value)
                    .into_iter()
                    .map(serde_json::Value::String)
                    .collect(),
            )
        } else {
            serde_json::Value::String(unquote(value))
        };

        map.insert(key.to_string(), parsed);
    }

    map
}

fn front_matter_tags(frontmatter: &BTreeMap<String, serde_json::Value>) -> Vec<String> {
    match frontmatter.get("tags") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim_start_matches('#').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(serde_json::Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_inline_list(value: &str) -> Vec<String> {
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
        || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
    {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

/// Reduce a note body to plain readable text: embeds removed, wikilinks and
/// markdown links replaced by their display text, heading and emphasis
/// markers stripped, code fence markers dropped.
fn readable_text_of(body: &str) -> String {
    let without_embeds = EMBED_RE.replace_all(body, "");
    let with_link_text = WIKILINK_RE.replace_all(&without_embeds, |c: &regex::Captures| {
        let inner = &c[1];
        match inner.split_once('|') {
            Some((_, alias)) => alias.trim().to_string(),
            None => inner.split('#').next().unwrap_or("").trim().to_string(),
        }
    });
    let with_md_text = MD_LINK_RE.replace_all(&with_link_text, "$1");

    let mut out = String::with_capacity(with_md_text.len());
    for line in with_md_text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            continue;
        }
        let without_heading = trimmed.trim_start_matches('#').trim_start();
        let stripped: String = without_heading
            .chars()
            .filter(|c| *c != '*' && *c != '`')
            .collect();
        out.push_str(stripped.trim_end());
        out.push('\n');
    }

    collapse_blank_runs(out.trim())
}

/// Collapse runs of three or more newlines down to a paragraph break.
fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    out
}

fn forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_vault(files: &[(&str, &str)]) -> (TempDir, MarkdownVault) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".obsidian")).unwrap();
        for (rel, content) in files {
            let path = tmp.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        let vault = MarkdownVault::connect(tmp.path()).unwrap();
        (tmp, vault)
    }

    #[test]
    fn resolves_backlinks_across_notes() {
        let (_tmp, vault) = write_vault(&[
            ("A.md", "Points at [[B]] and [[Missing]]."),
            ("B.md", "No links here."),
        ]);

        assert_eq!(vault.backlinks("B").unwrap(), vec!["A".to_string()]);
        assert!(vault.backlinks("A").unwrap().is_empty());

        let row = &vault.metadata_table()[&vault.file_index()[0]];
        assert_eq!(row.n_wikilinks, Some(2));
    }

    #[test]
    fn merges_front_matter_and_inline_tags() {
        let (_tmp, vault) = write_vault(&[(
            "note.md",
            "---\ntitle: Test\ntags: [alpha, beta]\n---\nBody with #beta and #gamma tags.",
        )]);

        assert_eq!(vault.tags("note").unwrap(), vec!["alpha", "beta", "gamma"]);
        let fm = vault.front_matter("note").unwrap();
        assert_eq!(fm["title"], serde_json::json!("Test"));
    }

    #[test]
    fn block_list_front_matter() {
        let (_tmp, vault) = write_vault(&[(
            "note.md",
            "---\ntags:\n  - alpha\n  - beta\n---\nBody text.",
        )]);

        assert_eq!(vault.tags("note").unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn readable_text_strips_markup() {
        let (_tmp, vault) = write_vault(&[(
            "note.md",
            "---\ntitle: X\n---\n# Heading\n\nSee [[Other|the other note]] and ![[img.png]].\n\nSome **bold** text.",
        )]);

        let clean = vault.readable_text("note").unwrap();
        assert!(clean.contains("Heading"));
        assert!(clean.contains("the other note"));
        assert!(clean.contains("Some bold text."));
        assert!(!clean.contains("[["));
        assert!(!clean.contains("img.png"));
        assert!(!clean.contains("**"));
        assert!(!clean.contains("---"));
    }

    #[test]
    fn embeds_are_not_wikilinks() {
        let (_tmp, vault) = write_vault(&[
            ("A.md", "Embed ![[B]] only."),
            ("B.md", "Target."),
        ]);

        assert!(vault.backlinks("B").unwrap().is_empty());
        assert_eq!(vault.extended().unwrap().embedded_files("A").unwrap(), vec!["B"]);
    }

    #[test]
    fn files_under_marker_directories_are_ignored() {
        let (_tmp, vault) = write_vault(&[
            ("real.md", "Text."),
            (".obsidian/workspace.md", "Not a note."),
            (".trash/old.md", "Deleted."),
        ]);

        assert_eq!(vault.file_index().len(), 1);
        assert!(vault.source_text("real").is_ok());
        assert!(vault.source_text("workspace").is_err());
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let (_tmp, vault) = write_vault(&[("sub/Note.md", "Text.")]);

        let row = vault.metadata_table().values().next().unwrap();
        assert_eq!(row.rel_path, "sub/Note.md");
    }
}
