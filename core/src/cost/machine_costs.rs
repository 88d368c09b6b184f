use serde::{Deserialize, Serialize};

use crate::budget::ExBudget;

/// The kinds of machine step that carry a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Var,
    Constant,
    Lambda,
    Delay,
    Force,
    Apply,
    Builtin,
    Constr,
    Case,
}

/// Costs of the machine itself, independent of builtins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineCosts {
    /// Charged once, before the first step.
    pub startup: ExBudget,
    pub var: ExBudget,
    pub constant: ExBudget,
    pub lambda: ExBudget,
    pub delay: ExBudget,
    pub force: ExBudget,
    pub apply: ExBudget,
    pub builtin: ExBudget,
    pub constr: ExBudget,
    pub case: ExBudget,
}

impl MachineCosts {
    pub fn step(&self, kind: StepKind) -> ExBudget {
        match kind {
            StepKind::Var => self.var,
            StepKind::Constant => self.constant,
            StepKind::Lambda => self.lambda,
            StepKind::Delay => self.delay,
            StepKind::Force => self.force,
            StepKind::Apply => self.apply,
            StepKind::Builtin => self.builtin,
            StepKind::Constr => self.constr,
            StepKind::Case => self.case,
        }
    }

    pub(crate) fn entries(&self) -> [(&'static str, ExBudget); 10] {
        [
            ("startup", self.startup),
            ("var", self.var),
            ("constant", self.constant),
            ("lambda", self.lambda),
            ("delay", self.delay),
            ("force", self.force),
            ("apply", self.apply),
            ("builtin", self.builtin),
            ("constr", self.constr),
            ("case", self.case),
        ]
    }
}
