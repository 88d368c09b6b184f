//! Execution budgets and the spenders that enforce them.

mod ex_budget;
mod spender;

pub use ex_budget::ExBudget;
pub use spender::{BudgetPolicy, BudgetSpender, CountingSpender, NoopSpender, RestrictingSpender};
