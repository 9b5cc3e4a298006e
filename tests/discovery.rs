//! Discovery properties on synthetic directory trees.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use vault_harness::discover::discover_vaults;

fn make_vault(dir: &Path, notes: usize) {
    fs::create_dir_all(dir.join(".obsidian")).unwrap();
    for i in 0..notes {
        fs::write(dir.join(format!("note{}.md", i)), "body text").unwrap();
    }
}

#[test]
fn no_vault_is_reported_beyond_the_depth_bound() {
    let tmp = TempDir::new().unwrap();
    make_vault(&tmp.path().join("shallow"), 1);
    make_vault(&tmp.path().join("a").join("b").join("c").join("deep"), 1);

    for bound in 0..5 {
        let vaults = discover_vaults(tmp.path(), bound);
        assert!(
            vaults.iter().all(|v| v.depth <= bound),
            "descriptor beyond bound {}",
            bound
        );
    }

    // The deep vault sits at depth 4 and only appears once the bound allows it.
    assert_eq!(discover_vaults(tmp.path(), 3).len(), 1);
    assert_eq!(discover_vaults(tmp.path(), 4).len(), 2);
}

#[test]
fn markdown_count_is_never_truncated_by_the_bound() {
    let tmp = TempDir::new().unwrap();
    let vault = tmp.path().join("vault");
    make_vault(&vault, 2);
    let nested = vault.join("sub").join("deeper").join("deepest");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("far.md"), "body").unwrap();

    for bound in 1..4 {
        let vaults = discover_vaults(tmp.path(), bound);
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].markdown_count, 3, "bound {}", bound);
    }
}

#[cfg(unix)]
#[test]
fn unreadable_subtree_leaves_other_vaults_untouched() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    make_vault(&tmp.path().join("left").join("vault_a"), 1);
    make_vault(&tmp.path().join("right").join("vault_b"), 1);

    let locked = tmp.path().join("middle");
    fs::create_dir_all(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let vaults = discover_vaults(tmp.path(), 3);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let mut names: Vec<&str> = vaults.iter().map(|v| v.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["vault_a", "vault_b"]);
}
