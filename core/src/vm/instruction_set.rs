//! Instructions of the frame-stack virtual machine.
//!
//! # Layout
//!
//! A program compiles into *units*: straight runs of instructions, one per
//! term that cannot be evaluated in place. A unit is the term's head
//! instruction, one `ForceUnwrap` per `force` peeled off the term, then a
//! `Return`:
//!
//! ```text
//! (force (force [f x]))   =>   Apply { fun, arg }
//!                              ForceUnwrap
//!                              ForceUnwrap
//!                              Return
//! ```
//!
//! Leaf terms (variables, constants, builtins, lambdas, delays, `error`)
//! are never units. They become *snippets*, evaluated in place wherever an
//! operand refers to them.
//!
//! # Control
//!
//! There is no native recursion: evaluating a unit operand pushes a frame
//! that stores the address to resume at, then jumps. `Return` pops the
//! frame and continues at the stored address. Address 0 always holds a
//! lone `Return`, used when a frame's continuation is simply to return
//! again.

use std::fmt;

/// Instruction address.
pub type Addr = u32;

/// Index into the snippet table.
pub type SnippetId = u32;

/// Address of the shared `Return` instruction.
pub const RETURN_ADDR: Addr = 0;

/// Where an operand's value comes from.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Evaluate a leaf in place.
    Snippet(SnippetId),
    /// Run the unit starting at this address.
    Unit(Addr),
}

/// A contiguous run of the operand pool.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct OperandRange {
    pub start: u32,
    pub len: u32,
}

impl OperandRange {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Evaluate a snippet into the accumulator.
    ExecSnippet(SnippetId),

    /// Evaluate `fun`, then `arg`, then apply.
    /// Frames: `AwaitFun` while the function runs, `AwaitArg` while the
    /// argument runs.
    Apply { fun: Operand, arg: Operand },

    /// Force the accumulator.
    ForceUnwrap,

    /// Evaluate `fields` left to right into a constructor value.
    Construct { tag: u64, fields: OperandRange },

    /// Evaluate `scrutinee`, select a branch by constructor tag, and apply
    /// it to the constructor's fields.
    Case {
        scrutinee: Operand,
        branches: OperandRange,
    },

    /// Pop a frame and resume it with the accumulator.
    Return,
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Snippet(id) => write!(f, "s{id}"),
            Operand::Unit(addr) => write!(f, "@{addr}"),
        }
    }
}

impl fmt::Debug for OperandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ops[{}..{}]", self.start, self.start + self.len)
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::ExecSnippet(id) => write!(f, "ExecSnippet s{id}"),
            Instruction::Apply { fun, arg } => write!(f, "Apply {fun:?} {arg:?}"),
            Instruction::ForceUnwrap => write!(f, "ForceUnwrap"),
            Instruction::Construct { tag, fields } => write!(f, "Construct {tag} {fields:?}"),
            Instruction::Case {
                scrutinee,
                branches,
            } => write!(f, "Case {scrutinee:?} {branches:?}"),
            Instruction::Return => write!(f, "Return"),
        }
    }
}
