//! netblock configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::resolve::{MatchPolicy, WalkErrorPolicy};

const CONFIG_ENV: &str = "NETBLOCK_CONFIG";
const CONFIG_FILE: &str = "config.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetblockConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub firewall: FirewallConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Extension (without the dot) of directly runnable programs.
    #[serde(default = "default_executable_extension")]
    pub executable_extension: String,
    /// Extension of loadable libraries, collected during directory expansion.
    #[serde(default = "default_library_extension")]
    pub library_extension: String,
    /// Directory names probed directly under every volume root.
    #[serde(default = "default_install_dir_names")]
    pub install_dir_names: Vec<String>,
    /// Top-level directories whose lowercased name contains one of these
    /// become search roots.
    #[serde(default = "default_root_keywords")]
    pub root_keywords: Vec<String>,
    /// Appended to the system-derived search roots.
    #[serde(default)]
    pub extra_roots: Vec<PathBuf>,
    /// When set, replaces the system scan entirely.
    #[serde(default)]
    pub search_roots: Option<Vec<PathBuf>>,
    #[serde(default)]
    pub match_policy: MatchPolicy,
    #[serde(default)]
    pub walk_errors: WalkErrorPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            executable_extension: default_executable_extension(),
            library_extension: default_library_extension(),
            install_dir_names: default_install_dir_names(),
            root_keywords: default_root_keywords(),
            extra_roots: Vec::new(),
            search_roots: None,
            match_policy: MatchPolicy::default(),
            walk_errors: WalkErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirewallConfig {
    #[serde(default = "default_rule_prefix")]
    pub rule_prefix: String,
    #[serde(default = "default_netsh_binary")]
    pub netsh_binary: String,
    /// Treat backend failures during unblock as errors instead of warnings.
    #[serde(default)]
    pub strict_unblock: bool,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            rule_prefix: default_rule_prefix(),
            netsh_binary: default_netsh_binary(),
            strict_unblock: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_executable_extension() -> String { "exe".into() }
fn default_library_extension() -> String { "dll".into() }
fn default_install_dir_names() -> Vec<String> {
    [
        "Program Files",
        "Program Files (x86)",
        "ProgramData",
        "Games",
        "Software",
        "Apps",
        "Programs",
        "Program",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_root_keywords() -> Vec<String> {
    ["program", "game", "app", "soft"].into_iter().map(String::from).collect()
}
fn default_rule_prefix() -> String { "BlockProgram".into() }
fn default_netsh_binary() -> String { "netsh".into() }
fn default_log_level() -> String { "warn".into() }

/// Default config location: `<config_dir>/netblock/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("netblock").join(CONFIG_FILE))
}

/// Load configuration from an explicit path, `$NETBLOCK_CONFIG`, or the
/// per-user default location, falling back to defaults when none exists.
pub fn load_config(explicit: Option<&Path>) -> Result<NetblockConfig> {
    load_config_from(explicit, std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

/// Only an explicit path has to exist; an env-named or default file that is
/// missing yields defaults.
fn load_config_from(explicit: Option<&Path>, from_env: Option<PathBuf>) -> Result<NetblockConfig> {
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => from_env.or_else(default_config_path),
    };

    let Some(config_path) = config_path else {
        tracing::warn!("No config directory available, using defaults");
        return Ok(NetblockConfig::default());
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        let config: NetblockConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;
        Ok(config)
    } else if explicit.is_some() {
        anyhow::bail!("Config file not found: {}", config_path.display())
    } else {
        tracing::debug!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        Ok(NetblockConfig::default())
    }
}
