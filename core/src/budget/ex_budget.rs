use std::{
    fmt,
    ops::{Add, AddAssign, Sub},
};

use serde::{Deserialize, Serialize};

/// A pair of resource quantities: memory units and CPU steps.
///
/// Arithmetic saturates, so budgets never wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExBudget {
    pub mem: i64,
    pub cpu: i64,
}

impl ExBudget {
    pub const ZERO: ExBudget = ExBudget { mem: 0, cpu: 0 };

    /// Per-transaction limits of the Cardano mainnet.
    pub const MAX_TX: ExBudget = ExBudget {
        mem: 14_000_000,
        cpu: 10_000_000_000,
    };

    pub const fn new(mem: i64, cpu: i64) -> Self {
        Self { mem, cpu }
    }

    /// True if spending `cost` from `self` would leave either component
    /// below zero.
    pub fn would_go_negative(&self, cost: ExBudget) -> bool {
        let left = *self - cost;
        left.mem < 0 || left.cpu < 0
    }

    /// True when either component is above the same component of `limit`.
    pub fn exceeds(&self, limit: ExBudget) -> bool {
        self.mem > limit.mem || self.cpu > limit.cpu
    }

    pub fn scale(&self, factor: i64) -> ExBudget {
        ExBudget {
            mem: self.mem.saturating_mul(factor),
            cpu: self.cpu.saturating_mul(factor),
        }
    }
}

impl Add for ExBudget {
    type Output = ExBudget;

    fn add(self, rhs: ExBudget) -> ExBudget {
        ExBudget {
            mem: self.mem.saturating_add(rhs.mem),
            cpu: self.cpu.saturating_add(rhs.cpu),
        }
    }
}

impl AddAssign for ExBudget {
    fn add_assign(&mut self, rhs: ExBudget) {
        *self = *self + rhs;
    }
}

impl Sub for ExBudget {
    type Output = ExBudget;

    fn sub(self, rhs: ExBudget) -> ExBudget {
        ExBudget {
            mem: self.mem.saturating_sub(rhs.mem),
            cpu: self.cpu.saturating_sub(rhs.cpu),
        }
    }
}

impl fmt::Display for ExBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({{cpu: {} | mem: {}}})", self.cpu, self.mem)
    }
}
