//! Program resolution — turns a user-supplied program reference into
//! absolute executable paths.
//!
//! Resolution is strictly ordered and stops at the first step that succeeds:
//! 1. path-like input (contains a separator or ends in the executable
//!    extension) is used literally; directories expand to every executable
//!    and library inside them
//! 2. exact lookup of the name on PATH
//! 3. fuzzy search of the search roots for an executable whose stem contains
//!    the input

pub mod lookup;
pub mod roots;
pub mod walk;

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ResolverConfig;
use crate::error::{Error, Result};

pub use lookup::{CommandLookup, SystemLookup};
pub use roots::{RootProvider, SystemRoots};
pub use walk::{MatchPolicy, WalkErrorPolicy};

pub struct Resolver {
    config: ResolverConfig,
    lookup: Box<dyn CommandLookup>,
    roots: Box<dyn RootProvider>,
}

impl Resolver {
    /// Resolver backed by the live system. A configured `search_roots` list
    /// replaces the system scan.
    pub fn new(config: ResolverConfig) -> Self {
        let roots: Box<dyn RootProvider> = match &config.search_roots {
            Some(fixed) => Box::new(fixed.clone()),
            None => Box::new(SystemRoots),
        };
        Self {
            config,
            lookup: Box::new(SystemLookup),
            roots,
        }
    }

    pub fn with_lookup(mut self, lookup: impl CommandLookup + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn with_roots(mut self, roots: impl RootProvider + 'static) -> Self {
        self.roots = Box::new(roots);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `reference` into one or more absolute paths.
    pub fn resolve(&self, reference: &str) -> Result<Vec<PathBuf>> {
        let input = reference.trim();
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }
        debug!("Resolving program '{input}'");

        if self.is_path_like(input) {
            let path = std::path::absolute(input)?;
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => {
                    return walk::executables_in_dir(&path, &self.config);
                }
                Ok(_) => return Ok(vec![path]),
                Err(e) => debug!("{} is not usable as a path: {e}", path.display()),
            }
        }

        if let Some(path) = self.exact_lookup(input) {
            debug!("Found '{input}' on PATH: {}", path.display());
            return Ok(vec![path]);
        }

        let roots = self.roots.search_roots(&self.config);
        let found = walk::fuzzy_search(&roots, input, &self.config)?;
        if found.is_empty() {
            return Err(Error::NotFound(input.to_string()));
        }
        Ok(found)
    }

    fn is_path_like(&self, input: &str) -> bool {
        input.contains('/') || input.contains('\\') || self.ends_with_executable_extension(input)
    }

    fn ends_with_executable_extension(&self, input: &str) -> bool {
        walk::has_extension(Path::new(input), &self.config.executable_extension)
    }

    fn exact_lookup(&self, name: &str) -> Option<PathBuf> {
        let mut candidates = vec![name.to_string()];
        if !self.ends_with_executable_extension(name) {
            candidates.push(format!("{name}.{}", self.config.executable_extension));
        }

        candidates
            .iter()
            .flat_map(|candidate| self.lookup.lookup(candidate))
            .find(|path| std::fs::metadata(path).is_ok_and(|m| !m.is_dir()))
    }
}
