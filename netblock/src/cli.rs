use clap::Parser;
use std::path::PathBuf;

use netblock::Error;

/// Block or allow network access for programs via Windows Firewall rules.
///
/// Each program may be a full path, a directory (every .exe and .dll inside
/// is processed), a command on PATH, or part of an installed program's name.
#[derive(Parser, Debug)]
#[command(name = "netblock", version, about)]
pub struct CliArgs {
    /// Program path, directory, or (partial) name; repeatable
    #[arg(short = 'p', long = "program", required = true)]
    pub programs: Vec<String>,

    /// 1 = allow access, 2 = block access, 3 = show status
    #[arg(short, long)]
    pub mode: u8,

    /// Path to config file (default: $NETBLOCK_CONFIG, then
    /// <config dir>/netblock/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Allow,
    Block,
    Status,
}

impl TryFrom<u8> for Mode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Mode::Allow),
            2 => Ok(Mode::Block),
            3 => Ok(Mode::Status),
            other => Err(Error::InvalidMode(other)),
        }
    }
}
