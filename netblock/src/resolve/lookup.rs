//! Exact command lookup on PATH via the OS lookup utility

use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Resolves a bare command name the way the shell would.
pub trait CommandLookup {
    /// Candidate locations for `name`, best first. Empty when unknown.
    fn lookup(&self, name: &str) -> Vec<PathBuf>;
}

/// Runs `where` on Windows and `which` elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLookup;

impl SystemLookup {
    const PROGRAM: &'static str = if cfg!(windows) { "where" } else { "which" };
}

impl CommandLookup for SystemLookup {
    fn lookup(&self, name: &str) -> Vec<PathBuf> {
        let output = match Command::new(Self::PROGRAM).arg(name).output() {
            Ok(o) => o,
            Err(e) => {
                debug!("Failed to run {} for '{name}': {e}", Self::PROGRAM);
                return Vec::new();
            }
        };

        if !output.status.success() {
            debug!("{} found nothing for '{name}'", Self::PROGRAM);
            return Vec::new();
        }

        parse_lookup_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_lookup_output(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup_output() {
        let out = "C:\\Windows\\System32\\notepad.exe\r\nC:\\Windows\\notepad.exe\r\n\r\n";
        let parsed = parse_lookup_output(out);
        assert_eq!(
            parsed,
            vec![
                PathBuf::from("C:\\Windows\\System32\\notepad.exe"),
                PathBuf::from("C:\\Windows\\notepad.exe"),
            ]
        );
        assert!(parse_lookup_output("  \n").is_empty());
    }

    #[test]
    fn test_system_lookup_unknown_command() {
        let found = SystemLookup.lookup("netblock-definitely-not-a-real-command-7f3a");
        assert!(found.is_empty());
    }
}
