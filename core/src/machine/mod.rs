//! Runtime values, environments, and the reference CEK machine.
//!
//! Both the CEK machine and the JIT virtual machine charge costs through
//! [`MachineContext`], which also implements application and forcing.

mod cek;
mod context;
mod discharge;
mod env;
mod error;
mod value;

use std::rc::Rc;

pub use cek::CekMachine;
pub use context::{Applied, MachineContext};
pub use discharge::discharge;
pub use env::Env;
pub use error::{FailureKind, MachineError};
pub use value::{Fields, Value};

use crate::{ast::Term, budget::BudgetSpender};

/// An evaluation backend.
pub trait Machine {
    fn name(&self) -> &'static str;

    /// Evaluates a closed term. The startup charge is the caller's
    /// responsibility.
    fn run<S: BudgetSpender>(
        &self,
        term: &Rc<Term>,
        ctx: &mut MachineContext<'_, S>,
    ) -> Result<Value, MachineError>;
}

#[cfg(test)]
mod cek_test;

#[cfg(test)]
mod discharge_test;
