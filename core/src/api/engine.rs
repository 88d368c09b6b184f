//! The evaluator façade: one entry point from a program to an [`EvalResult`].

use std::rc::Rc;

use tracing::debug;

use super::{Backend, EvalResult, EvaluationOptions, Error};
use crate::ast::{Program, Term};
use crate::budget::{BudgetPolicy, BudgetSpender, CountingSpender, NoopSpender, RestrictingSpender};
use crate::cost::{CostModelTable, LanguageVersion, MachineParams, ProtocolVersion};
use crate::machine::{CekMachine, Machine, MachineContext, discharge};
use crate::parser;
use crate::vm::JitMachine;

/// Evaluates `program` under `params` with a fresh spender for `policy`.
///
/// Evaluation failures are reported in the result, never as a panic or an
/// `Err`: a failing script is a normal, billable outcome.
pub fn evaluate(
    program: &Program,
    params: &MachineParams,
    policy: BudgetPolicy,
    backend: Backend,
) -> EvalResult {
    match policy {
        BudgetPolicy::Restricting(limit) => {
            on_backend(&program.term, params, RestrictingSpender::new(limit), backend)
        }
        BudgetPolicy::Counting => on_backend(&program.term, params, CountingSpender::new(), backend),
        BudgetPolicy::Unbudgeted => on_backend(&program.term, params, NoopSpender, backend),
    }
}

fn on_backend<S: BudgetSpender>(
    term: &Rc<Term>,
    params: &MachineParams,
    spender: S,
    backend: Backend,
) -> EvalResult {
    match backend {
        Backend::Cek => run_machine(&CekMachine, term, params, spender),
        Backend::Jit(strategy) => run_machine(&JitMachine::new(strategy), term, params, spender),
    }
}

fn run_machine<M: Machine, S: BudgetSpender>(
    machine: &M,
    term: &Rc<Term>,
    params: &MachineParams,
    spender: S,
) -> EvalResult {
    let mut ctx = MachineContext::new(params, spender);
    let result = ctx
        .startup()
        .and_then(|()| machine.run(term, &mut ctx))
        .map(|value| discharge(&value));
    let (budget, logs) = ctx.finish();

    match result {
        Ok(term) => {
            debug!(backend = machine.name(), %budget, "Evaluation succeeded");
            EvalResult::Success { term, budget, logs }
        }
        Err(error) => {
            debug!(backend = machine.name(), %budget, %error, "Evaluation failed");
            EvalResult::Failure {
                kind: error.kind(),
                error,
                budget,
                logs,
            }
        }
    }
}

/// Holds the parameters and options shared by many evaluations.
///
/// # Example
///
/// ```
/// use uplc_core::api::{EvaluationOptions, Evaluator};
///
/// let evaluator = Evaluator::embedded(EvaluationOptions::default()).unwrap();
/// let result = evaluator
///     .evaluate_text("(program 1.0.0 [(builtin addInteger) (con integer 5) (con integer 10)])")
///     .unwrap();
/// assert_eq!(result.term().unwrap().to_string(), "(con integer 15)");
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator {
    params: MachineParams,
    options: EvaluationOptions,
}

impl Evaluator {
    pub fn new(params: MachineParams, options: EvaluationOptions) -> Self {
        Self { params, options }
    }

    /// Uses the latest embedded Plutus V3 parameters.
    pub fn embedded(options: EvaluationOptions) -> Result<Self, Error> {
        let params = MachineParams::embedded(LanguageVersion::PlutusV3)?;
        Ok(Self::new(params, options))
    }

    /// Uses the parameters `table` has in force at `protocol`.
    pub fn from_table(
        table: &CostModelTable,
        protocol: ProtocolVersion,
        language: LanguageVersion,
        options: EvaluationOptions,
    ) -> Result<Self, Error> {
        let params = table.lookup(protocol, language)?.clone();
        Ok(Self::new(params, options))
    }

    pub fn params(&self) -> &MachineParams {
        &self.params
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn evaluate(&self, program: &Program) -> EvalResult {
        evaluate(
            program,
            &self.params,
            self.options.policy,
            self.options.backend,
        )
    }

    /// Parses the textual form, then evaluates.
    pub fn evaluate_text(&self, source: &str) -> Result<EvalResult, Error> {
        let program = parser::parse_program(source)?;
        Ok(self.evaluate(&program))
    }

    /// Decodes the flat form, then evaluates.
    pub fn evaluate_flat(&self, bytes: &[u8]) -> Result<EvalResult, Error> {
        let program = Program::from_flat(bytes)?;
        Ok(self.evaluate(&program))
    }
}
