//! Bounded-depth vault discovery.
//!
//! Walks a directory tree depth-first looking for Obsidian vault roots —
//! directories that directly contain a `.obsidian` subdirectory — and
//! reports a shallow summary of each. Unreadable directories are skipped
//! silently so partial visibility never aborts the scan.

use std::path::Path;

use walkdir::WalkDir;

use crate::models::VaultDescriptor;

/// Directory that marks a vault root.
pub const VAULT_MARKER: &str = ".obsidian";

/// File extension of note files.
pub const NOTE_EXTENSION: &str = "md";

/// Recursively search for vaults under `root`.
///
/// A directory at recursion depth `d` (the scan root is depth 0) is
/// inspected only while `d <= max_depth`; the walk never descends past the
/// bound. `markdown_count` on each descriptor is a full recursive count of
/// the vault's subtree, independent of `max_depth`.
pub fn discover_vaults(root: &Path, max_depth: usize) -> Vec<VaultDescriptor> {
    let mut vaults = Vec::new();
    walk(root, 0, max_depth, &mut vaults);
    vaults
}

fn walk(current: &Path, depth: usize, max_depth: usize, vaults: &mut Vec<VaultDescriptor>) {
    if depth > max_depth {
        return;
    }

    if current.join(VAULT_MARKER).is_dir() {
        let path = current
            .canonicalize()
            .unwrap_or_else(|_| current.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[root]".to_string());
        vaults.push(VaultDescriptor {
            markdown_count: count_markdown_files(current),
            path,
            name,
            depth,
        });
    }

    // Unreadable directories contribute nothing and stop nothing.
    let entries = match std::fs::read_dir(current) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let child = entry.path();
        if child.is_dir() {
            walk(&child, depth + 1, max_depth, vaults);
        }
    }
}

/// Full recursive count of note files under `dir`, ignoring unreadable
/// entries. Never truncated by the discovery depth bound.
pub fn count_markdown_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(NOTE_EXTENSION))
                .unwrap_or(false)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_vault(dir: &Path, notes: usize) {
        fs::create_dir_all(dir.join(VAULT_MARKER)).unwrap();
        for i in 0..notes {
            fs::write(dir.join(format!("note{}.md", i)), "body").unwrap();
        }
    }

    #[test]
    fn finds_vault_at_scan_root() {
        let tmp = TempDir::new().unwrap();
        make_vault(tmp.path(), 2);

        let vaults = discover_vaults(tmp.path(), 3);
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].depth, 0);
        assert_eq!(vaults[0].markdown_count, 2);
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_vaults(tmp.path(), 3).is_empty());
    }

    #[test]
    fn depth_bound_is_respected() {
        let tmp = TempDir::new().unwrap();
        let deep = tmp.path().join("a").join("b").join("c");
        make_vault(&deep, 1);

        // The only vault sits at depth 3; a bound of 0 inspects the root only.
        assert!(discover_vaults(tmp.path(), 0).is_empty());
        assert!(discover_vaults(tmp.path(), 2).is_empty());

        let vaults = discover_vaults(tmp.path(), 3);
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].depth, 3);
        assert!(vaults.iter().all(|v| v.depth <= 3));
    }

    #[test]
    fn nested_vaults_are_all_reported() {
        let tmp = TempDir::new().unwrap();
        make_vault(tmp.path(), 1);
        let inner = tmp.path().join("projects").join("inner");
        make_vault(&inner, 3);

        let mut vaults = discover_vaults(tmp.path(), 4);
        vaults.sort_by_key(|v| v.depth);
        assert_eq!(vaults.len(), 2);
        assert_eq!(vaults[0].depth, 0);
        assert_eq!(vaults[1].depth, 2);
        assert_eq!(vaults[1].name, "inner");
    }

    #[test]
    fn markdown_count_ignores_depth_bound() {
        let tmp = TempDir::new().unwrap();
        make_vault(tmp.path(), 1);
        // Notes far below the discovery bound still count.
        let sub = tmp.path().join("x").join("y").join("z");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("deep.md"), "body").unwrap();
        fs::write(sub.join("skip.txt"), "body").unwrap();

        let vaults = discover_vaults(tmp.path(), 0);
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].markdown_count, 2);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subtree_does_not_change_other_results() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let vault = tmp.path().join("vault");
        make_vault(&vault, 1);

        let locked = tmp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let vaults = discover_vaults(tmp.path(), 3);

        // Restore before asserting so TempDir can clean up.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].name, "vault");
    }
}
