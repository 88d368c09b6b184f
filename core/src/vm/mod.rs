//! Frame-stack virtual machine for compiled terms.
//!
//! [`JitMachine`] compiles a term with [`JitCompiler`] and runs it on a
//! [`Vm`]. The frame strategy only changes where continuation frames live;
//! every strategy charges exactly what the CEK machine charges.

mod code;
mod frames;
mod instruction_set;
mod runtime;
mod stack;

use std::{fmt, rc::Rc, str::FromStr};

pub use code::{Code, Snippet};
pub use frames::{BoxedFrames, Frame, FrameStack, HybridFrames, INLINE_FRAMES, SlotFrames};
pub use instruction_set::{Addr, Instruction, Operand, OperandRange, RETURN_ADDR, SnippetId};
pub use runtime::Vm;

pub(crate) use stack::Stack;

use tracing::debug;

use crate::{
    ast::Term,
    budget::BudgetSpender,
    compiler::JitCompiler,
    machine::{Machine, MachineContext, MachineError, Value},
};

/// Where the VM keeps continuation frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStrategy {
    /// By value in a reusable per-thread buffer.
    #[default]
    Slots,
    /// One heap node per frame.
    Boxed,
    /// Inline storage when the program's static shape is shallow, slots
    /// otherwise.
    Hybrid,
}

impl FrameStrategy {
    pub const ALL: [FrameStrategy; 3] = [
        FrameStrategy::Slots,
        FrameStrategy::Boxed,
        FrameStrategy::Hybrid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FrameStrategy::Slots => "slots",
            FrameStrategy::Boxed => "boxed",
            FrameStrategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for FrameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FrameStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FrameStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| format!("unknown frame strategy `{s}` (expected slots, boxed or hybrid)"))
    }
}

/// Compiles, then runs on the VM.
#[derive(Debug, Clone, Copy, Default)]
pub struct JitMachine {
    pub strategy: FrameStrategy,
}

impl JitMachine {
    pub fn new(strategy: FrameStrategy) -> Self {
        JitMachine { strategy }
    }

    /// Runs already compiled code.
    pub fn execute<S: BudgetSpender>(
        &self,
        code: &Code,
        ctx: &mut MachineContext<'_, S>,
    ) -> Result<Value, MachineError> {
        match self.strategy {
            FrameStrategy::Slots => drive(Vm::new(code, SlotFrames::acquire()), ctx),
            FrameStrategy::Boxed => drive(Vm::new(code, BoxedFrames::new()), ctx),
            FrameStrategy::Hybrid => drive(Vm::new(code, HybridFrames::for_code(code)), ctx),
        }
    }
}

fn drive<F: FrameStack, S: BudgetSpender>(
    mut vm: Vm<'_, F>,
    ctx: &mut MachineContext<'_, S>,
) -> Result<Value, MachineError> {
    let result = vm.run(ctx);
    debug!(steps = vm.steps(), ok = result.is_ok(), "VM halted");
    result
}

impl Machine for JitMachine {
    fn name(&self) -> &'static str {
        self.strategy.name()
    }

    fn run<S: BudgetSpender>(
        &self,
        term: &Rc<Term>,
        ctx: &mut MachineContext<'_, S>,
    ) -> Result<Value, MachineError> {
        let code = JitCompiler::compile(term)?;
        self.execute(&code, ctx)
    }
}
