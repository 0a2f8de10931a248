//! Search root discovery for the fuzzy program search

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ResolverConfig;

/// Source of the directories the fuzzy search walks, consulted once per
/// resolution call.
pub trait RootProvider {
    fn search_roots(&self, config: &ResolverConfig) -> Vec<PathBuf>;
}

/// A fixed root list, used as-is.
impl RootProvider for Vec<PathBuf> {
    fn search_roots(&self, _config: &ResolverConfig) -> Vec<PathBuf> {
        self.clone()
    }
}

/// Derives roots from the live environment: PATH, install directories on
/// every volume, the per-user programs directory, and configured extras.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRoots;

impl RootProvider for SystemRoots {
    fn search_roots(&self, config: &ResolverConfig) -> Vec<PathBuf> {
        let mut roots = SearchRoots::default();

        if let Some(path_var) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path_var) {
                if !dir.as_os_str().is_empty() {
                    roots.push(dir);
                }
            }
        }

        for volume in volumes() {
            scan_volume(&volume, config, &mut roots);
        }

        if let Some(local) = dirs::data_local_dir() {
            let user_programs = local.join("Programs");
            if user_programs.is_dir() {
                roots.push(user_programs);
            }
        }

        for extra in &config.extra_roots {
            roots.push(extra.clone());
        }

        debug!("Collected {} search roots", roots.0.len());
        roots.0
    }
}

/// Ordered root list that ignores case-insensitive duplicates.
#[derive(Debug, Default)]
pub(crate) struct SearchRoots(Vec<PathBuf>);

impl SearchRoots {
    pub(crate) fn push(&mut self, path: PathBuf) {
        let key = path.to_string_lossy().to_lowercase();
        if !self
            .0
            .iter()
            .any(|r| r.to_string_lossy().to_lowercase() == key)
        {
            self.0.push(path);
        }
    }
}

/// Add a volume's conventional install directories and any top-level
/// directory whose name contains one of the configured keywords.
pub(crate) fn scan_volume(volume: &Path, config: &ResolverConfig, roots: &mut SearchRoots) {
    for name in &config.install_dir_names {
        let path = volume.join(name);
        if path.is_dir() {
            roots.push(path);
        }
    }

    let Ok(entries) = std::fs::read_dir(volume) else {
        return;
    };
    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if config.root_keywords.iter().any(|k| name.contains(k.as_str())) {
            roots.push(entry.path());
        }
    }
}

/// Every mounted drive root, `C:\` through `Z:\`.
#[cfg(windows)]
fn volumes() -> Vec<PathBuf> {
    ('C'..='Z')
        .map(|letter| PathBuf::from(format!("{letter}:\\")))
        .filter(|p| p.exists())
        .collect()
}

#[cfg(not(windows))]
fn volumes() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}
