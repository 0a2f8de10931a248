//! Rule backends — the collaborator that actually touches the firewall

use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use super::identity::{Direction, DirectionalRule};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleAction {
    Add,
    Delete,
    Show,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleAction::Add => "add",
            RuleAction::Delete => "delete",
            RuleAction::Show => "show",
        }
    }
}

/// One request against the firewall's rule store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOperation {
    pub action: RuleAction,
    pub rule_name: String,
    pub direction: Direction,
    pub program: Option<PathBuf>,
    pub block: bool,
    pub enabled: Option<bool>,
}

impl RuleOperation {
    /// Add an enabled blocking rule bound to the rule's program.
    pub fn add_block(rule: &DirectionalRule) -> Self {
        Self {
            action: RuleAction::Add,
            rule_name: rule.name.clone(),
            direction: rule.direction,
            program: Some(rule.program.clone()),
            block: true,
            enabled: Some(true),
        }
    }

    pub fn delete(rule: &DirectionalRule) -> Self {
        Self {
            action: RuleAction::Delete,
            rule_name: rule.name.clone(),
            direction: rule.direction,
            program: Some(rule.program.clone()),
            block: false,
            enabled: None,
        }
    }

    /// Query by name and direction only.
    pub fn show(rule: &DirectionalRule) -> Self {
        Self {
            action: RuleAction::Show,
            rule_name: rule.name.clone(),
            direction: rule.direction,
            program: None,
            block: false,
            enabled: None,
        }
    }
}

/// Undecoded backend answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub success: bool,
    pub output: Vec<u8>,
}

pub trait RuleBackend {
    /// Run `op`. An `Err` means the backend could not be invoked at all;
    /// a rejected request is an `Ok` reply with `success == false`.
    fn run(&self, op: &RuleOperation) -> Result<RawReply>;
}

/// Windows Defender Firewall through `netsh advfirewall firewall`.
#[derive(Debug, Clone)]
pub struct NetshBackend {
    binary: String,
}

impl Default for NetshBackend {
    fn default() -> Self {
        Self::new("netsh")
    }
}

impl NetshBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for `op`. Values are passed unquoted; the
    /// process spawner quotes arguments containing spaces.
    pub fn args(op: &RuleOperation) -> Vec<String> {
        let mut args = vec![
            "advfirewall".to_string(),
            "firewall".to_string(),
            op.action.as_str().to_string(),
            "rule".to_string(),
            format!("name={}", op.rule_name),
            format!("dir={}", op.direction),
        ];
        if let Some(program) = &op.program {
            args.push(format!("program={}", program.display()));
        }
        if op.block {
            args.push("action=block".to_string());
        }
        if let Some(enabled) = op.enabled {
            args.push(format!("enable={}", if enabled { "yes" } else { "no" }));
        }
        // Program paths only appear in verbose listings
        if op.action == RuleAction::Show {
            args.push("verbose".to_string());
        }
        args
    }
}

impl RuleBackend for NetshBackend {
    fn run(&self, op: &RuleOperation) -> Result<RawReply> {
        let args = Self::args(op);
        debug!("Running {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| Error::Backend(format!("failed to execute {}: {e}", self.binary)))?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        Ok(RawReply {
            success: output.status.success(),
            output: combined,
        })
    }
}
