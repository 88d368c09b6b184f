use crate::{budget::ExBudget, machine::MachineError};

/// Receives every cost the machine incurs, in the order it incurs them.
pub trait BudgetSpender {
    /// Records `cost`. A restricting spender refuses costs past its limit
    /// and leaves its running total untouched when it does.
    fn spend(&mut self, cost: ExBudget) -> Result<(), MachineError>;

    /// Total accepted so far.
    fn spent(&self) -> ExBudget;

    /// Whether costs need computing at all. Builtin costs depend on argument
    /// sizes, which a spender that ignores them can skip.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Enforces a limit: the first charge that would take either component past
/// the limit fails with `BudgetExhausted`.
#[derive(Debug, Clone)]
pub struct RestrictingSpender {
    limit: ExBudget,
    spent: ExBudget,
}

impl RestrictingSpender {
    pub fn new(limit: ExBudget) -> Self {
        Self {
            limit,
            spent: ExBudget::ZERO,
        }
    }

    pub fn remaining(&self) -> ExBudget {
        self.limit - self.spent
    }
}

impl BudgetSpender for RestrictingSpender {
    fn spend(&mut self, cost: ExBudget) -> Result<(), MachineError> {
        if self.remaining().would_go_negative(cost) {
            return Err(MachineError::BudgetExhausted {
                limit: self.limit,
                spent: self.spent,
                cost,
            });
        }
        self.spent += cost;
        Ok(())
    }

    fn spent(&self) -> ExBudget {
        self.spent
    }
}

/// Accumulates every charge and never fails.
#[derive(Debug, Clone, Default)]
pub struct CountingSpender {
    spent: ExBudget,
}

impl CountingSpender {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BudgetSpender for CountingSpender {
    fn spend(&mut self, cost: ExBudget) -> Result<(), MachineError> {
        self.spent += cost;
        Ok(())
    }

    fn spent(&self) -> ExBudget {
        self.spent
    }
}

/// Ignores costs entirely; `spent` stays zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpender;

impl BudgetSpender for NoopSpender {
    fn spend(&mut self, _cost: ExBudget) -> Result<(), MachineError> {
        Ok(())
    }

    fn spent(&self) -> ExBudget {
        ExBudget::ZERO
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Selects the spender an evaluation runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetPolicy {
    /// Fail with `BudgetExhausted` once the limit would be exceeded.
    Restricting(ExBudget),
    /// Count everything, never fail on budget.
    Counting,
    /// Do not account at all.
    Unbudgeted,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        BudgetPolicy::Restricting(ExBudget::MAX_TX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::FailureKind;

    #[test]
    fn test_restricting_spender_fails_without_spending() {
        let mut spender = RestrictingSpender::new(ExBudget::new(10, 10));
        spender.spend(ExBudget::new(6, 6)).unwrap();
        let error = spender.spend(ExBudget::new(5, 1)).unwrap_err();
        assert_eq!(error.kind(), FailureKind::BudgetExhausted);
        assert_eq!(spender.spent(), ExBudget::new(6, 6));
        spender.spend(ExBudget::new(4, 4)).unwrap();
        assert_eq!(spender.spent(), ExBudget::new(10, 10));
        assert_eq!(spender.remaining(), ExBudget::ZERO);
    }

    #[test]
    fn test_each_component_is_checked() {
        let mut spender = RestrictingSpender::new(ExBudget::new(100, 1));
        assert!(spender.spend(ExBudget::new(0, 2)).is_err());
        assert_eq!(spender.spent(), ExBudget::ZERO);
    }

    #[test]
    fn test_counting_spender_never_fails() {
        let mut spender = CountingSpender::new();
        spender.spend(ExBudget::MAX_TX).unwrap();
        spender.spend(ExBudget::MAX_TX).unwrap();
        assert_eq!(spender.spent(), ExBudget::MAX_TX.scale(2));
    }

    #[test]
    fn test_noop_spender_ignores_costs() {
        let mut spender = NoopSpender;
        spender.spend(ExBudget::new(1, 1)).unwrap();
        assert_eq!(spender.spent(), ExBudget::ZERO);
        assert!(!spender.is_enabled());
    }
}
