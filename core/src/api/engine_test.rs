use pretty_assertions::assert_eq;

use super::*;
use crate::ast::Term;
use crate::budget::{BudgetPolicy, ExBudget};
use crate::cost::{LanguageVersion, MachineParams};
use crate::machine::FailureKind;
use crate::parser::parse_program;
use crate::test_utils::init_test_logging;
use crate::vm::FrameStrategy;

fn params() -> MachineParams {
    MachineParams::embedded(LanguageVersion::PlutusV3).unwrap()
}

fn eval_on(source: &str, policy: BudgetPolicy, backend: Backend) -> EvalResult {
    let program = parse_program(source).unwrap();
    evaluate(&program, &params(), policy, backend)
}

fn eval(source: &str) -> EvalResult {
    eval_on(source, BudgetPolicy::Counting, Backend::Cek)
}

#[test]
fn test_add_integer() {
    init_test_logging();
    let result = eval("(program 1.0.0 [(builtin addInteger) (con integer 5) (con integer 10)])");
    assert_eq!(result.term(), Some(&Term::integer(15)));
    assert_eq!(result.budget(), ExBudget::new(402, 149308));
}

#[test]
fn test_lambda_around_builtin() {
    let result = eval(
        "(program 1.0.0 [(lam x [(builtin addInteger) x (con integer 1)]) (con integer 5)])",
    );
    assert_eq!(result.term(), Some(&Term::integer(6)));
}

#[test]
fn test_force_delay_costs() {
    let result = eval("(program 1.0.0 (force (delay (con integer 42))))");
    assert_eq!(result.term(), Some(&Term::integer(42)));
    assert_eq!(result.budget(), ExBudget::new(400, 48100));
}

#[test]
fn test_error_term() {
    let result = eval("(program 1.0.0 (error))");
    assert_eq!(result.failure_kind(), Some(FailureKind::ExplicitError));
    assert_eq!(result.budget(), ExBudget::new(100, 100));
}

#[test]
fn test_zero_budget_is_exhausted_before_any_value() {
    let result = eval_on(
        "(program 1.0.0 (con integer 1))",
        BudgetPolicy::Restricting(ExBudget::ZERO),
        Backend::Cek,
    );
    assert_eq!(result.failure_kind(), Some(FailureKind::BudgetExhausted));
    assert_eq!(result.budget(), ExBudget::ZERO);
}

#[test]
fn test_case_applies_branch_to_fields() {
    let source = "(program 1.1.0
        (case (constr 1 (con integer 10) (con integer 20))
          (error)
          (lam a (lam b [(builtin subtractInteger) a b]))))";
    for backend in Backend::ALL {
        let result = eval_on(source, BudgetPolicy::Counting, backend);
        assert_eq!(result.term(), Some(&Term::integer(-10)), "backend {backend}");
    }
}

#[test]
fn test_failure_keeps_logs() {
    let source = "(program 1.0.0
        [(lam x (error)) [(force (builtin trace)) (con string \"hi\") (con unit ())]])";
    for backend in Backend::ALL {
        let result = eval_on(source, BudgetPolicy::Counting, backend);
        assert_eq!(result.failure_kind(), Some(FailureKind::ExplicitError));
        assert_eq!(result.logs(), ["hi".to_string()]);
    }
}

#[test]
fn test_unbudgeted_reports_zero() {
    let result = eval_on(
        "(program 1.0.0 [(builtin addInteger) (con integer 1) (con integer 2)])",
        BudgetPolicy::Unbudgeted,
        Backend::Jit(FrameStrategy::Slots),
    );
    assert_eq!(result.term(), Some(&Term::integer(3)));
    assert_eq!(result.budget(), ExBudget::ZERO);
}

#[test]
fn test_restricting_matches_counting_when_within_limit() {
    let source = "(program 1.0.0 [(lam x [(builtin multiplyInteger) x x]) (con integer 12)])";
    let counted = eval_on(source, BudgetPolicy::Counting, Backend::Cek);
    let restricted = eval_on(source, BudgetPolicy::default(), Backend::Cek);
    assert_eq!(counted, restricted);

    // One unit short of the exact cost fails, and never reports more than
    // the limit.
    let exact = counted.budget();
    let short = ExBudget::new(exact.mem, exact.cpu - 1);
    let result = eval_on(source, BudgetPolicy::Restricting(short), Backend::Cek);
    assert_eq!(result.failure_kind(), Some(FailureKind::BudgetExhausted));
    assert!(!result.budget().exceeds(short));
}

#[test]
fn test_backends_agree() {
    let source = "(program 1.0.0
        [(lam f [f (con integer 3)])
         (lam n [(force (builtin ifThenElse))
                   [(builtin lessThanInteger) n (con integer 5)]
                   (delay (con string \"small\"))
                   (delay (con string \"large\"))])])";
    let reference = eval_on(source, BudgetPolicy::Counting, Backend::Cek);
    for backend in Backend::ALL {
        assert_eq!(eval_on(source, BudgetPolicy::Counting, backend), reference, "{backend}");
    }
}

#[test]
fn test_evaluator_accepts_text_and_flat() {
    let evaluator = Evaluator::embedded(EvaluationOptions {
        backend: Backend::Jit(FrameStrategy::Hybrid),
        policy: BudgetPolicy::Counting,
    })
    .unwrap();

    let source = "(program 1.0.0 [(builtin appendString) (con string \"a\") (con string \"b\")])";
    let from_text = evaluator.evaluate_text(source).unwrap();
    assert_eq!(from_text.term(), Some(&Term::string("ab")));

    let flat = parse_program(source).unwrap().to_flat();
    let from_flat = evaluator.evaluate_flat(&flat).unwrap();
    assert_eq!(from_flat, from_text);
}

#[test]
fn test_boundary_errors() {
    let evaluator = Evaluator::embedded(EvaluationOptions::default()).unwrap();

    let error = evaluator.evaluate_text("(program 1.0.0 (lam x y))").unwrap_err();
    let diagnostics = error.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some("P003"));

    let error = evaluator.evaluate_flat(&[]).unwrap_err();
    assert!(matches!(error, Error::Decode(_)));
}

#[test]
fn test_backend_names_parse() {
    for backend in Backend::ALL {
        assert_eq!(backend.name().parse::<Backend>(), Ok(backend));
    }
    assert!("fast".parse::<Backend>().is_err());
}
