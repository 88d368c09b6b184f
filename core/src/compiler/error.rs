//! Compilation errors.

use thiserror::Error;

use crate::machine::MachineError;

/// Limits of the instruction encoding. Only programs with billions of
/// nodes can reach them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("too many instructions (limit: ~4 billion)")]
    TooManyInstructions,
    #[error("too many snippets (limit: ~4 billion)")]
    TooManySnippets,
    #[error("too many operands (limit: ~4 billion)")]
    TooManyOperands,
}

impl From<CompileError> for MachineError {
    fn from(error: CompileError) -> Self {
        MachineError::MalformedProgram(error.to_string())
    }
}
