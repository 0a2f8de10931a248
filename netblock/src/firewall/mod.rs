//! Firewall rule management for one program at a time.
//!
//! Every program gets a pair of blocking rules, outbound and inbound, whose
//! names are re-derived from its path on each call (see [`RuleIdentity`]).
//! Nothing is cached here; the backend's rule store is the only state.

pub mod backend;
pub mod identity;
pub mod memory;
pub mod output;

use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub use backend::{NetshBackend, RawReply, RuleAction, RuleBackend, RuleOperation};
pub use identity::{Direction, DirectionalRule, RuleIdentity, INBOUND_SUFFIX};
pub use memory::MemoryBackend;
pub use output::{ConsoleNormalizer, NormalizedReply, OutputNormalizer};

pub const DEFAULT_RULE_PREFIX: &str = "BlockProgram";

/// Network access state of one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessState {
    /// Both directions blocked.
    Blocked,
    /// No block rules.
    Allowed,
    /// Exactly one direction blocked.
    Partial,
}

impl AccessState {
    pub fn from_presence(outbound: bool, inbound: bool) -> Self {
        match (outbound, inbound) {
            (true, true) => AccessState::Blocked,
            (false, false) => AccessState::Allowed,
            _ => AccessState::Partial,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessState::Blocked => "BLOCKED",
            AccessState::Allowed => "ALLOWED",
            AccessState::Partial => "PARTIAL",
        }
    }
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of deleting one directional rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
    BackendFailure(String),
}

impl DeleteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DeleteOutcome::BackendFailure(_))
    }
}

/// Outcome of both deletes attempted by [`RuleManager::unblock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnblockReport {
    pub outbound: DeleteOutcome,
    pub inbound: DeleteOutcome,
}

impl UnblockReport {
    pub fn has_failures(&self) -> bool {
        self.outbound.is_failure() || self.inbound.is_failure()
    }

    /// Surface the first backend failure as an error.
    pub fn into_result(self) -> Result<()> {
        for (direction, outcome) in [(Direction::Out, self.outbound), (Direction::In, self.inbound)] {
            if let DeleteOutcome::BackendFailure(detail) = outcome {
                return Err(Error::Backend(format!(
                    "failed to delete {direction}bound rule: {detail}"
                )));
            }
        }
        Ok(())
    }
}

pub struct RuleManager<B, N = ConsoleNormalizer> {
    backend: B,
    normalizer: N,
    prefix: String,
}

impl<B: RuleBackend> RuleManager<B> {
    pub fn new(backend: B) -> Self {
        Self::with_normalizer(backend, ConsoleNormalizer)
    }
}

impl<B: RuleBackend, N: OutputNormalizer> RuleManager<B, N> {
    pub fn with_normalizer(backend: B, normalizer: N) -> Self {
        Self {
            backend,
            normalizer,
            prefix: DEFAULT_RULE_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn identity(&self, program: &Path) -> RuleIdentity {
        RuleIdentity::for_path(&self.prefix, program)
    }

    /// Add outbound then inbound block rules. Stops at the first rejection,
    /// which can leave the program half blocked.
    pub fn block(&self, program: &Path) -> Result<()> {
        let id = self.identity(program);
        debug!("Blocking {} as {id}", program.display());

        for rule in [id.outbound(program), id.inbound(program)] {
            let reply = self.request(&RuleOperation::add_block(&rule))?;
            if !reply.success {
                return Err(Error::Backend(format!(
                    "failed to add {}bound rule {}: {}",
                    rule.direction,
                    rule.name,
                    reply.text()
                )));
            }
        }
        Ok(())
    }

    /// Delete both rules. Both deletes are always attempted; a missing rule
    /// counts as [`DeleteOutcome::AlreadyAbsent`].
    pub fn unblock(&self, program: &Path) -> UnblockReport {
        let id = self.identity(program);
        debug!("Unblocking {} ({id})", program.display());

        UnblockReport {
            outbound: self.delete(&id.outbound(program)),
            inbound: self.delete(&id.inbound(program)),
        }
    }

    pub fn status(&self, program: &Path) -> Result<AccessState> {
        let id = self.identity(program);
        let outbound = self.rule_exists(&id.outbound(program))?;
        let inbound = self.rule_exists(&id.inbound(program))?;
        debug!("{}: outbound={outbound} inbound={inbound}", program.display());
        Ok(AccessState::from_presence(outbound, inbound))
    }

    fn request(&self, op: &RuleOperation) -> Result<NormalizedReply> {
        let raw = self.backend.run(op)?;
        Ok(self.normalizer.normalize(&raw))
    }

    fn delete(&self, rule: &DirectionalRule) -> DeleteOutcome {
        let outcome = match self.request(&RuleOperation::delete(rule)) {
            Ok(reply) => classify_delete(&reply),
            Err(e) => DeleteOutcome::BackendFailure(e.to_string()),
        };
        if let DeleteOutcome::BackendFailure(detail) = &outcome {
            warn!("Deleting rule {} failed: {detail}", rule.name);
        }
        outcome
    }

    fn rule_exists(&self, rule: &DirectionalRule) -> Result<bool> {
        let reply = self.request(&RuleOperation::show(rule))?;
        classify_show(&reply, &rule.program).map_err(|detail| {
            Error::Backend(format!("failed to query rule {}: {detail}", rule.name))
        })
    }
}

fn classify_delete(reply: &NormalizedReply) -> DeleteOutcome {
    if reply.success {
        DeleteOutcome::Deleted
    } else if reply.no_rule_matches() {
        DeleteOutcome::AlreadyAbsent
    } else {
        DeleteOutcome::BackendFailure(reply.text().to_string())
    }
}

/// Whether a show reply confirms a rule bound to `program`. A "no rules
/// match" reply is absence, not an error, whatever the success flag says.
fn classify_show(reply: &NormalizedReply, program: &Path) -> std::result::Result<bool, String> {
    if reply.no_rule_matches() {
        return Ok(false);
    }
    if !reply.success {
        return Err(reply.text().to_string());
    }
    Ok(reply.mentions(program))
}
