//! Configuration options for the evaluator.

use std::{fmt, str::FromStr};

use crate::budget::BudgetPolicy;
use crate::vm::FrameStrategy;

/// Which machine runs the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// The reference CEK machine.
    #[default]
    Cek,
    /// The JIT compiler and frame-stack VM with the given frame strategy.
    Jit(FrameStrategy),
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::Cek,
        Backend::Jit(FrameStrategy::Slots),
        Backend::Jit(FrameStrategy::Boxed),
        Backend::Jit(FrameStrategy::Hybrid),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Cek => "cek",
            Backend::Jit(strategy) => strategy.name(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.name() == s)
            .ok_or_else(|| format!("unknown backend `{s}` (expected cek, slots, boxed or hybrid)"))
    }
}

/// Configuration options for an evaluation.
///
/// # Example
///
/// ```
/// use uplc_core::api::{Backend, EvaluationOptions};
/// use uplc_core::budget::{BudgetPolicy, ExBudget};
/// use uplc_core::vm::FrameStrategy;
///
/// let options = EvaluationOptions {
///     backend: Backend::Jit(FrameStrategy::Hybrid),
///     policy: BudgetPolicy::Restricting(ExBudget::new(14_000_000, 10_000_000_000)),
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvaluationOptions {
    /// Machine to run on.
    ///
    /// Default: the CEK machine
    pub backend: Backend,

    /// How costs are accounted.
    ///
    /// Default: restricted to the per-transaction maximum
    pub policy: BudgetPolicy,
}
