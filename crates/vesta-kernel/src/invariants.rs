//! Runtime-checkable process table invariants
//!
//! Used by tests after every interesting sequence of operations.
//!
//! # Invariants
//!
//! 1. **Key Consistency**: every table key equals the pid of its entry
//! 2. **ID Monotonicity**: no pid exceeds the last allocated pid
//! 3. **Parent Validity**: every parent reference names a table entry
//! 4. **Kind Consistency**: windowed entries answer to the same pid

use crate::handler::ProcessHandler;
use crate::process::Process;
use crate::types::ProcessKind;

/// An invariant violation with details
#[derive(Clone, Debug)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: &'static str,
    /// Description of what went wrong
    pub description: String,
}

/// Check all process table invariants.
///
/// Returns a list of violations (empty if all invariants hold).
pub fn check_all_invariants(handler: &ProcessHandler) -> Vec<InvariantViolation> {
    let last = handler.last_pid();
    let mut violations = Vec::new();

    handler.table().with(|table| {
        for (key, entry) in table {
            let info = entry.info();

            if info.pid != *key {
                violations.push(InvariantViolation {
                    invariant: "key_consistency",
                    description: format!("entry under {} claims pid {}", key, info.pid),
                });
            }

            if info.pid > last {
                violations.push(InvariantViolation {
                    invariant: "id_monotonicity",
                    description: format!("pid {} exceeds last allocated {}", info.pid, last),
                });
            }

            if let Some(parent) = info.parent {
                if !table.contains_key(&parent) {
                    violations.push(InvariantViolation {
                        invariant: "parent_validity",
                        description: format!("pid {} has unknown parent {}", info.pid, parent),
                    });
                }
            }

            if let ProcessKind::Windowed(window) = &entry.kind {
                if window.info().pid != info.pid {
                    violations.push(InvariantViolation {
                        invariant: "kind_consistency",
                        description: format!(
                            "windowed capability of {} answers as {}",
                            info.pid,
                            window.info().pid
                        ),
                    });
                }
            }
        }
    });

    violations
}
