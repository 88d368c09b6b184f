use std::fmt;

use crate::ast::Term;
use crate::budget::ExBudget;
use crate::machine::{FailureKind, MachineError};

/// The outcome of one evaluation. Both variants carry what was spent and
/// the trace log, since partial work is still billed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalResult {
    Success {
        term: Term,
        budget: ExBudget,
        logs: Vec<String>,
    },
    Failure {
        kind: FailureKind,
        error: MachineError,
        budget: ExBudget,
        logs: Vec<String>,
    },
}

impl EvalResult {
    pub fn is_success(&self) -> bool {
        matches!(self, EvalResult::Success { .. })
    }

    pub fn term(&self) -> Option<&Term> {
        match self {
            EvalResult::Success { term, .. } => Some(term),
            EvalResult::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            EvalResult::Success { .. } => None,
            EvalResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn budget(&self) -> ExBudget {
        match self {
            EvalResult::Success { budget, .. } | EvalResult::Failure { budget, .. } => *budget,
        }
    }

    pub fn logs(&self) -> &[String] {
        match self {
            EvalResult::Success { logs, .. } | EvalResult::Failure { logs, .. } => logs,
        }
    }
}

impl fmt::Display for EvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalResult::Success { term, budget, .. } => write!(f, "{term} [{budget}]"),
            EvalResult::Failure {
                kind,
                error,
                budget,
                ..
            } => write!(f, "failure ({kind}): {error} [{budget}]"),
        }
    }
}
