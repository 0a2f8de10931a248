//! Rule identity — deterministic rule names derived from a program path

use serde::Serialize;
use md5::{Digest, Md5};
use std::fmt;
use std::path::{Path, PathBuf};

/// Appended to the base identity to name the inbound rule.
pub const INBOUND_SUFFIX: &str = "_In";

/// Hex characters of the path hash kept in the rule name.
const HASH_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<prefix>_<stem>_<hash8>`, where the hash is the MD5 of the lowercased path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleIdentity(String);

impl RuleIdentity {
    pub fn for_path(prefix: &str, path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let lowered = path.to_string_lossy().to_lowercase();
        let digest = format!("{:x}", Md5::digest(lowered.as_bytes()));
        Self(format!("{prefix}_{stem}_{}", &digest[..HASH_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn outbound(&self, program: &Path) -> DirectionalRule {
        DirectionalRule {
            name: self.0.clone(),
            direction: Direction::Out,
            program: program.to_path_buf(),
        }
    }

    pub fn inbound(&self, program: &Path) -> DirectionalRule {
        DirectionalRule {
            name: format!("{}{INBOUND_SUFFIX}", self.0),
            direction: Direction::In,
            program: program.to_path_buf(),
        }
    }
}

impl fmt::Display for RuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One half of a program's rule pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionalRule {
    pub name: String,
    pub direction: Direction,
    pub program: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_deterministic() {
        let path = Path::new("C:\\Games\\Shooter\\shooter.exe");
        assert_eq!(
            RuleIdentity::for_path("BlockProgram", path),
            RuleIdentity::for_path("BlockProgram", path)
        );
    }

    #[test]
    fn test_identity_format() {
        let id = RuleIdentity::for_path("BlockProgram", Path::new("/opt/tools/updater.exe"));
        let name = id.as_str();
        assert!(name.starts_with("BlockProgram_updater_"));
        let hash = name.rsplit('_').next().unwrap();
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_identity_ignores_path_case() {
        let lower = RuleIdentity::for_path("P", Path::new("/apps/tool.exe"));
        let upper = RuleIdentity::for_path("P", Path::new("/APPS/tool.exe"));
        assert_eq!(lower, upper);

        let mixed = RuleIdentity::for_path("P", Path::new("/Apps/Tool.exe"));
        // Same hash, stem keeps its own case
        assert_eq!(mixed.as_str().rsplit('_').next(), lower.as_str().rsplit('_').next());
        assert!(mixed.as_str().starts_with("P_Tool_"));
    }

    #[test]
    fn test_identity_hash_matches_md5_of_lowercased_path() {
        // md5("c:\\games\\racer\\racer.exe") = ec54ed9eacd2ab5764b912ecd12487e1
        let mixed = Path::new("C:\\Games\\Racer\\racer.exe");
        let lower = Path::new("c:\\games\\racer\\racer.exe");
        for path in [mixed, lower] {
            let id = RuleIdentity::for_path("BlockProgram", path);
            assert!(id.as_str().ends_with("_ec54ed9e"));
        }
    }

    #[test]
    fn test_identity_distinguishes_paths() {
        let a = RuleIdentity::for_path("BlockProgram", Path::new("/a/app.exe"));
        let b = RuleIdentity::for_path("BlockProgram", Path::new("/b/app.exe"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_directional_rules() {
        let program = Path::new("/opt/app.exe");
        let id = RuleIdentity::for_path("BlockProgram", program);

        let out = id.outbound(program);
        assert_eq!(out.name, id.as_str());
        assert_eq!(out.direction, Direction::Out);

        let inbound = id.inbound(program);
        assert_eq!(inbound.name, format!("{id}_In"));
        assert_eq!(inbound.direction, Direction::In);
        assert_eq!(inbound.program, program);
    }
}
