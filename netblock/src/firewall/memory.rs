//! In-process rule store that answers like netsh

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::backend::{RawReply, RuleAction, RuleBackend, RuleOperation};
use super::identity::Direction;
use crate::error::Result;

const NO_MATCH: &str = "\r\nNo rules match the specified criteria.\r\n";

#[derive(Debug, Default)]
struct State {
    // netsh allows several rules with one name; each copy keeps its program
    rules: BTreeMap<(String, &'static str), Vec<PathBuf>>,
    failing: HashSet<(RuleAction, &'static str)>,
    calls: Vec<RuleOperation>,
}

/// Rule backend keeping rules in memory. Safe to share across threads.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `action` in `direction` fail with an access-denied reply.
    pub fn fail_on(&self, action: RuleAction, direction: Direction) {
        self.lock().failing.insert((action, direction.as_str()));
    }

    /// Store a rule directly, bypassing the request path.
    pub fn insert(&self, name: &str, direction: Direction, program: impl Into<PathBuf>) {
        self.lock()
            .rules
            .entry((name.to_string(), direction.as_str()))
            .or_default()
            .push(program.into());
    }

    pub fn contains(&self, name: &str, direction: Direction) -> bool {
        self.lock()
            .rules
            .contains_key(&(name.to_string(), direction.as_str()))
    }

    /// Total number of stored rules, counting same-named copies.
    pub fn rule_count(&self) -> usize {
        self.lock().rules.values().map(Vec::len).sum()
    }

    /// Every operation received so far, in order.
    pub fn calls(&self) -> Vec<RuleOperation> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn reply(success: bool, text: &str) -> RawReply {
    RawReply {
        success,
        output: text.as_bytes().to_vec(),
    }
}

fn show_block(op: &RuleOperation, program: &Path) -> String {
    format!(
        "\r\nRule Name:                            {}\r\n\
         ----------------------------------------------------------------------\r\n\
         Enabled:                              Yes\r\n\
         Direction:                            {}\r\n\
         Action:                               Block\r\n\
         Program:                              {}\r\n",
        op.rule_name,
        if op.direction == Direction::In { "In" } else { "Out" },
        program.display()
    )
}

impl RuleBackend for MemoryBackend {
    fn run(&self, op: &RuleOperation) -> Result<RawReply> {
        let mut state = self.lock();
        state.calls.push(op.clone());

        let dir = op.direction.as_str();
        if state.failing.contains(&(op.action, dir)) {
            return Ok(reply(false, "The requested operation requires elevation (Run as administrator).\r\n"));
        }

        let key = (op.rule_name.clone(), dir);
        let answer = match op.action {
            RuleAction::Add => {
                let program = op.program.clone().unwrap_or_default();
                state.rules.entry(key).or_default().push(program);
                reply(true, "Ok.\r\n")
            }
            // Delete by name removes every copy
            RuleAction::Delete => match state.rules.remove(&key) {
                Some(copies) => reply(
                    true,
                    &format!("\r\nDeleted {} rule(s).\r\nOk.\r\n", copies.len()),
                ),
                None => reply(false, NO_MATCH),
            },
            RuleAction::Show => match state.rules.get(&key) {
                Some(copies) => {
                    let mut text: String = copies
                        .iter()
                        .map(|program| show_block(op, program))
                        .collect();
                    text.push_str("Ok.\r\n");
                    reply(true, &text)
                }
                None => reply(false, NO_MATCH),
            },
        };
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firewall::identity::DirectionalRule;

    fn rule(direction: Direction) -> DirectionalRule {
        DirectionalRule {
            name: "BlockProgram_app_00000000".to_string(),
            direction,
            program: PathBuf::from("/opt/app.exe"),
        }
    }

    #[test]
    fn test_add_show_delete() {
        let backend = MemoryBackend::new();
        let out = rule(Direction::Out);

        assert!(!backend.run(&RuleOperation::show(&out)).unwrap().success);
        assert!(backend.run(&RuleOperation::add_block(&out)).unwrap().success);
        assert!(backend.contains(&out.name, Direction::Out));
        assert!(!backend.contains(&out.name, Direction::In));

        let shown = backend.run(&RuleOperation::show(&out)).unwrap();
        assert!(shown.success);
        assert!(String::from_utf8_lossy(&shown.output).contains("/opt/app.exe"));

        assert!(backend.run(&RuleOperation::delete(&out)).unwrap().success);
        assert!(!backend.run(&RuleOperation::delete(&out)).unwrap().success);
        assert_eq!(backend.rule_count(), 0);
        assert_eq!(backend.calls().len(), 5);
    }

    #[test]
    fn test_fail_on() {
        let backend = MemoryBackend::new();
        backend.fail_on(RuleAction::Add, Direction::In);

        assert!(backend.run(&RuleOperation::add_block(&rule(Direction::Out))).unwrap().success);
        assert!(!backend.run(&RuleOperation::add_block(&rule(Direction::In))).unwrap().success);
        assert_eq!(backend.rule_count(), 1);
    }

    #[test]
    fn test_same_name_rules_accumulate() {
        let backend = MemoryBackend::new();
        let out = rule(Direction::Out);

        backend.run(&RuleOperation::add_block(&out)).unwrap();
        backend.run(&RuleOperation::add_block(&out)).unwrap();
        assert_eq!(backend.rule_count(), 2);

        let shown = String::from_utf8(backend.run(&RuleOperation::show(&out)).unwrap().output).unwrap();
        assert_eq!(shown.matches("Program:").count(), 2);

        let deleted = backend.run(&RuleOperation::delete(&out)).unwrap();
        assert!(deleted.success);
        assert!(String::from_utf8_lossy(&deleted.output).contains("Deleted 2 rule(s)"));
        assert_eq!(backend.rule_count(), 0);
        assert!(!backend.contains(&out.name, Direction::Out));
    }
}
