//! Error taxonomy shared by the resolver and the rule manager.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The program reference was blank after trimming.
    #[error("program name is empty")]
    EmptyInput,

    /// A directory was given but contains no executables or libraries.
    #[error("no executables found in directory: {}", .0.display())]
    NoExecutablesFound(PathBuf),

    /// Neither PATH lookup nor the fuzzy search produced a match.
    #[error("no program found matching '{0}'")]
    NotFound(String),

    /// The firewall backend could not be invoked or returned an error reply.
    #[error("firewall backend error: {0}")]
    Backend(String),

    /// The requested operation mode is not one of allow/block/status.
    #[error("invalid mode: {0} (expected 1=allow, 2=block, 3=status)")]
    InvalidMode(u8),

    /// A directory walk failed under the `abort` walk error policy.
    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
