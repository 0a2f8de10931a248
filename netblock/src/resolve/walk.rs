//! Directory walking — directory expansion and fuzzy name search

use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};

/// What to do when a walk hits an unreadable entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkErrorPolicy {
    /// Drop the entry and keep walking.
    #[default]
    Skip,
    /// Stop the walk and report the error.
    Abort,
}

/// How many fuzzy matches to collect from the first root that has any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Stop at the first matching file.
    #[default]
    FirstMatch,
    /// Collect up to N matches within the winning root. `0` behaves as 1.
    TopN(usize),
}

impl MatchPolicy {
    fn budget(self) -> usize {
        match self {
            MatchPolicy::FirstMatch => 1,
            MatchPolicy::TopN(n) => n.max(1),
        }
    }
}

/// Lazily walk every file under `root` depth-first, applying `policy` to
/// entries that cannot be read.
pub fn files(root: &Path, policy: WalkErrorPolicy) -> impl Iterator<Item = Result<DirEntry>> {
    let root_path = root.to_path_buf();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(e) if e.file_type().is_dir() => None,
            Ok(e) => Some(Ok(e)),
            Err(err) => match policy {
                WalkErrorPolicy::Skip => {
                    trace!("Skipping unreadable entry: {err}");
                    None
                }
                WalkErrorPolicy::Abort => Some(Err(Error::Walk {
                    path: err.path().map(Path::to_path_buf).unwrap_or_else(|| root_path.clone()),
                    source: err,
                })),
            },
        })
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Recursively collect every executable and library under `dir`.
pub fn executables_in_dir(dir: &Path, config: &ResolverConfig) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();
    for entry in files(dir, config.walk_errors) {
        let path = entry?.into_path();
        if has_extension(&path, &config.executable_extension)
            || has_extension(&path, &config.library_extension)
        {
            results.push(path);
        }
    }

    if results.is_empty() {
        return Err(Error::NoExecutablesFound(dir.to_path_buf()));
    }
    debug!("Found {} executables under {}", results.len(), dir.display());
    Ok(results)
}

/// Search `roots` in order for executables whose stem contains `needle`
/// (case-insensitive). Returns matches from the first root that has any.
pub fn fuzzy_search(roots: &[PathBuf], needle: &str, config: &ResolverConfig) -> Result<Vec<PathBuf>> {
    let needle = needle.to_lowercase();
    let budget = config.match_policy.budget();

    for root in roots {
        if !root.is_dir() {
            continue;
        }
        trace!("Fuzzy search in {}", root.display());

        let mut found = Vec::new();
        for entry in files(root, config.walk_errors) {
            let path = entry?.into_path();
            if !has_extension(&path, &config.executable_extension) {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if stem.contains(&needle) {
                found.push(path);
                if found.len() >= budget {
                    break;
                }
            }
        }

        if !found.is_empty() {
            debug!("Fuzzy search matched {} file(s) under {}", found.len(), root.display());
            return Ok(found);
        }
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_has_extension_is_case_insensitive() {
        assert!(has_extension(Path::new("/a/Tool.EXE"), "exe"));
        assert!(has_extension(Path::new("/a/lib.Dll"), "dll"));
        assert!(!has_extension(Path::new("/a/readme.txt"), "exe"));
        assert!(!has_extension(Path::new("/a/exe"), "exe"));
    }

    #[test]
    fn test_executables_in_dir_recurses() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.exe");
        let b = touch(dir.path(), "nested/deeper/B.DLL");
        touch(dir.path(), "nested/c.txt");

        let mut found = executables_in_dir(dir.path(), &ResolverConfig::default()).unwrap();
        found.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_executables_in_dir_empty() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "notes.txt");
        let err = executables_in_dir(dir.path(), &ResolverConfig::default()).unwrap_err();
        assert!(matches!(err, Error::NoExecutablesFound(p) if p == dir.path()));
    }

    #[test]
    fn test_fuzzy_search_first_match() {
        let dir = TempDir::new().unwrap();
        let first = touch(dir.path(), "a/MyGame.exe");
        touch(dir.path(), "b/mygame-launcher.exe");

        let found =
            fuzzy_search(&[dir.path().to_path_buf()], "GAME", &ResolverConfig::default()).unwrap();
        assert_eq!(found, vec![first]);
    }

    #[test]
    fn test_fuzzy_search_ignores_non_executables() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "game.dll");
        touch(dir.path(), "game.txt");

        let found =
            fuzzy_search(&[dir.path().to_path_buf()], "game", &ResolverConfig::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_fuzzy_search_stops_at_first_matching_root() {
        let empty = TempDir::new().unwrap();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let hit = touch(first.path(), "editor.exe");
        touch(second.path(), "editor2.exe");

        let roots = vec![
            empty.path().join("missing"),
            empty.path().to_path_buf(),
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ];
        let found = fuzzy_search(&roots, "editor", &ResolverConfig::default()).unwrap();
        assert_eq!(found, vec![hit]);
    }

    #[test]
    fn test_fuzzy_search_top_n() {
        let dir = TempDir::new().unwrap();
        for name in ["tool1.exe", "tool2.exe", "tool3.exe"] {
            touch(dir.path(), name);
        }
        let config = ResolverConfig {
            match_policy: MatchPolicy::TopN(2),
            ..Default::default()
        };

        let found = fuzzy_search(&[dir.path().to_path_buf()], "tool", &config).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_top_n_zero_behaves_as_first_match() {
        assert_eq!(MatchPolicy::TopN(0).budget(), 1);
        assert_eq!(MatchPolicy::FirstMatch.budget(), 1);
    }

    #[test]
    fn test_abort_policy_reports_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let mut walk = files(&missing, WalkErrorPolicy::Abort);
        assert!(matches!(walk.next(), Some(Err(Error::Walk { .. }))));

        let mut walk = files(&missing, WalkErrorPolicy::Skip);
        assert!(walk.next().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_continues_past_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a_locked/hidden.exe");
        let hit = touch(dir.path(), "z_apps/player.exe");
        let locked = dir.path().join("a_locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let roots = [dir.path().to_path_buf()];
        let found = fuzzy_search(&roots, "player", &ResolverConfig::default());

        let abort = ResolverConfig {
            walk_errors: WalkErrorPolicy::Abort,
            ..Default::default()
        };
        let aborted = executables_in_dir(dir.path(), &abort);

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(found.unwrap(), vec![hit.clone()]);
        assert!(matches!(aborted, Err(Error::Walk { .. })));
        assert_eq!(
            executables_in_dir(dir.path(), &ResolverConfig::default()).unwrap().len(),
            2
        );
    }
}
