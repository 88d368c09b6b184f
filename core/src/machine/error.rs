use std::fmt;

use thiserror::Error;

use crate::{budget::ExBudget, builtins::DefaultFunction, machine::Value};

/// Why an evaluation stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("evaluation reached an error term")]
    ExplicitError,

    #[error("budget exhausted: spent {spent} of {limit}, next charge is {cost}")]
    BudgetExhausted {
        limit: ExBudget,
        spent: ExBudget,
        cost: ExBudget,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("{fun} failed: {reason}")]
    BuiltinRuntimeError { fun: DefaultFunction, reason: String },

    #[error("malformed program: {0}")]
    MalformedProgram(String),
}

/// The failure categories visible to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ExplicitError,
    BudgetExhausted,
    TypeMismatch,
    BuiltinRuntimeError,
    MalformedProgram,
}

impl MachineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MachineError::ExplicitError => FailureKind::ExplicitError,
            MachineError::BudgetExhausted { .. } => FailureKind::BudgetExhausted,
            MachineError::TypeMismatch { .. } => FailureKind::TypeMismatch,
            MachineError::BuiltinRuntimeError { .. } => FailureKind::BuiltinRuntimeError,
            MachineError::MalformedProgram(_) => FailureKind::MalformedProgram,
        }
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, found: &Value) -> Self {
        MachineError::TypeMismatch {
            expected: expected.into(),
            found: found.describe(),
        }
    }

    pub(crate) fn builtin(fun: DefaultFunction, reason: impl Into<String>) -> Self {
        MachineError::BuiltinRuntimeError {
            fun,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ExplicitError => "explicit error",
            FailureKind::BudgetExhausted => "budget exhausted",
            FailureKind::TypeMismatch => "type mismatch",
            FailureKind::BuiltinRuntimeError => "builtin runtime error",
            FailureKind::MalformedProgram => "malformed program",
        };
        f.write_str(name)
    }
}
