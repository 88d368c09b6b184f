//! Unit tests for the CEK machine.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::{
    ast::Term,
    budget::{BudgetSpender, CountingSpender, ExBudget, NoopSpender, RestrictingSpender},
    builtins::DefaultFunction,
    cost::{LanguageVersion, MachineParams},
    test_utils::init_test_logging,
};

fn params() -> MachineParams {
    MachineParams::embedded(LanguageVersion::PlutusV3).unwrap()
}

struct Outcome {
    result: Result<Term, MachineError>,
    spent: ExBudget,
    logs: Vec<String>,
}

fn run_with<S: BudgetSpender>(params: &MachineParams, spender: S, term: Term) -> Outcome {
    let mut ctx = MachineContext::new(params, spender);
    let result = ctx
        .startup()
        .and_then(|()| CekMachine.run(&Rc::new(term), &mut ctx))
        .map(|value| discharge(&value));
    let (spent, logs) = ctx.finish();
    Outcome {
        result,
        spent,
        logs,
    }
}

fn run(term: Term) -> Outcome {
    run_with(&params(), CountingSpender::new(), term)
}

fn failure_kind(outcome: &Outcome) -> Option<FailureKind> {
    outcome.result.as_ref().err().map(MachineError::kind)
}

#[test]
fn test_add_integer_costs() {
    init_test_logging();
    let outcome = run(Term::builtin(DefaultFunction::AddInteger)
        .apply(Term::integer(5))
        .apply(Term::integer(10)));
    assert_eq!(outcome.result, Ok(Term::integer(15)));
    assert_eq!(outcome.spent, ExBudget::new(402, 149308));
}

#[test]
fn test_force_delay() {
    let outcome = run(Term::force(Term::delay(Term::integer(42))));
    assert_eq!(outcome.result, Ok(Term::integer(42)));
    assert_eq!(outcome.spent, ExBudget::new(400, 48100));
}

#[test]
fn test_apply_identity() {
    let outcome = run(Term::lambda(Term::var(1)).apply(Term::integer(1)));
    assert_eq!(outcome.result, Ok(Term::integer(1)));
    assert_eq!(outcome.spent, ExBudget::new(500, 64100));
}

#[test]
fn test_error_term_charges_nothing() {
    let outcome = run(Term::Error);
    assert_eq!(failure_kind(&outcome), Some(FailureKind::ExplicitError));
    assert_eq!(outcome.spent, ExBudget::new(100, 100));
}

#[test]
fn test_if_then_else() {
    let outcome = run(Term::builtin(DefaultFunction::IfThenElse)
        .forced()
        .apply(Term::bool(true))
        .apply(Term::integer(1))
        .apply(Term::integer(2)));
    assert_eq!(outcome.result, Ok(Term::integer(1)));
    assert_eq!(outcome.spent, ExBudget::new(601, 156149));
}

#[test]
fn test_builtin_argument_before_force_is_a_type_mismatch() {
    let outcome = run(Term::builtin(DefaultFunction::IfThenElse)
        .apply(Term::bool(true))
        .apply(Term::integer(1))
        .apply(Term::integer(2)));
    assert_eq!(failure_kind(&outcome), Some(FailureKind::TypeMismatch));
}

#[test]
fn test_extra_force_is_a_type_mismatch() {
    let outcome = run(Term::builtin(DefaultFunction::IfThenElse).forced().forced());
    assert_eq!(failure_kind(&outcome), Some(FailureKind::TypeMismatch));
    let outcome = run(Term::builtin(DefaultFunction::AddInteger).forced());
    assert_eq!(failure_kind(&outcome), Some(FailureKind::TypeMismatch));
}

#[test]
fn test_forcing_a_constant_is_a_type_mismatch() {
    let outcome = run(Term::force(Term::integer(3)));
    assert_eq!(failure_kind(&outcome), Some(FailureKind::TypeMismatch));
}

#[test]
fn test_applying_a_constant_is_a_type_mismatch() {
    let outcome = run(Term::integer(3).apply(Term::integer(4)));
    assert_eq!(failure_kind(&outcome), Some(FailureKind::TypeMismatch));
}

#[test]
fn test_free_variables_are_malformed() {
    assert_eq!(
        failure_kind(&run(Term::var(1))),
        Some(FailureKind::MalformedProgram)
    );
    assert_eq!(
        failure_kind(&run(Term::lambda(Term::var(0)).apply(Term::unit()))),
        Some(FailureKind::MalformedProgram)
    );
}

#[test]
fn test_case_selects_branch_and_applies_fields() {
    let outcome = run(Term::case(
        Term::constr(1, vec![Term::integer(5)]),
        vec![Term::Error, Term::lambda(Term::var(1))],
    ));
    assert_eq!(outcome.result, Ok(Term::integer(5)));
    assert_eq!(outcome.spent, ExBudget::new(700, 96100));
}

#[test]
fn test_case_applies_fields_in_order() {
    let subtract = Term::lambda(Term::lambda(
        Term::builtin(DefaultFunction::SubtractInteger)
            .apply(Term::var(2))
            .apply(Term::var(1)),
    ));
    let outcome = run(Term::case(
        Term::constr(0, vec![Term::integer(10), Term::integer(3)]),
        vec![subtract],
    ));
    assert_eq!(outcome.result, Ok(Term::integer(7)));
}

#[test]
fn test_case_without_matching_branch() {
    let outcome = run(Term::case(Term::constr(2, vec![]), vec![Term::unit()]));
    assert_eq!(failure_kind(&outcome), Some(FailureKind::TypeMismatch));
    let outcome = run(Term::case(Term::integer(0), vec![Term::unit()]));
    assert_eq!(failure_kind(&outcome), Some(FailureKind::TypeMismatch));
}

#[test]
fn test_constr_evaluates_fields() {
    let outcome = run(Term::constr(
        3,
        vec![
            Term::lambda(Term::var(1)).apply(Term::integer(1)),
            Term::integer(2),
        ],
    ));
    assert_eq!(
        outcome.result,
        Ok(Term::constr(3, vec![Term::integer(1), Term::integer(2)]))
    );
}

#[test]
fn test_trace_collects_logs() {
    let outcome = run(Term::builtin(DefaultFunction::Trace)
        .forced()
        .apply(Term::string("hello"))
        .apply(Term::unit()));
    assert_eq!(outcome.result, Ok(Term::unit()));
    assert_eq!(outcome.logs, vec!["hello".to_string()]);
}

#[test]
fn test_logs_survive_failure() {
    let traced = Term::builtin(DefaultFunction::Trace)
        .forced()
        .apply(Term::string("before"))
        .apply(Term::delay(Term::Error));
    let outcome = run(Term::force(traced));
    assert_eq!(failure_kind(&outcome), Some(FailureKind::ExplicitError));
    assert_eq!(outcome.logs, vec!["before".to_string()]);
}

#[test]
fn test_division_by_zero() {
    let outcome = run(Term::builtin(DefaultFunction::DivideInteger)
        .apply(Term::integer(1))
        .apply(Term::integer(0)));
    assert_eq!(failure_kind(&outcome), Some(FailureKind::BuiltinRuntimeError));
}

#[test]
fn test_builtin_missing_from_cost_model() {
    let mut params = params();
    params.builtin_costs.remove(DefaultFunction::Sha2_256);
    let outcome = run_with(
        &params,
        CountingSpender::new(),
        Term::builtin(DefaultFunction::Sha2_256).apply(Term::byte_string(vec![])),
    );
    assert_eq!(failure_kind(&outcome), Some(FailureKind::MalformedProgram));
}

#[test]
fn test_restricting_budget_exhaustion() {
    let term = Term::builtin(DefaultFunction::AddInteger)
        .apply(Term::integer(5))
        .apply(Term::integer(10));
    let limit = ExBudget::new(402, 149307);
    let outcome = run_with(&params(), RestrictingSpender::new(limit), term);
    assert_eq!(failure_kind(&outcome), Some(FailureKind::BudgetExhausted));
    assert!(!outcome.spent.exceeds(limit));
    assert_eq!(outcome.spent, ExBudget::new(400, 48100));
}

#[test]
fn test_noop_spender_reports_zero() {
    let outcome = run_with(
        &params(),
        NoopSpender,
        Term::lambda(Term::var(1)).apply(Term::integer(1)),
    );
    assert_eq!(outcome.result, Ok(Term::integer(1)));
    assert_eq!(outcome.spent, ExBudget::ZERO);
}

#[test]
fn test_deeply_nested_arguments() {
    let mut term = Term::integer(0);
    for _ in 0..100_000 {
        term = Term::lambda(Term::var(1)).apply(term);
    }
    let outcome = run_with(&params(), NoopSpender, term);
    assert_eq!(outcome.result, Ok(Term::integer(0)));
}

#[test]
fn test_partial_builtin_result() {
    let outcome = run(Term::builtin(DefaultFunction::AddInteger).apply(Term::integer(1)));
    assert_eq!(
        outcome.result,
        Ok(Term::builtin(DefaultFunction::AddInteger).apply(Term::integer(1)))
    );
}
