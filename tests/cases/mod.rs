#![allow(dead_code, unused_macros)]

use once_cell::sync::Lazy;
use uplc::{
    Backend, BudgetPolicy, EvalResult, LanguageVersion, MachineParams, Term, evaluate,
    parse_program, parse_term,
};

pub static PARAMS: Lazy<MachineParams> =
    Lazy::new(|| MachineParams::embedded(LanguageVersion::PlutusV3).unwrap());

/// Evaluates a textual program with a counting budget.
pub fn eval(source: &str, backend: Backend) -> EvalResult {
    eval_with(source, BudgetPolicy::Counting, backend)
}

pub fn eval_with(source: &str, policy: BudgetPolicy, backend: Backend) -> EvalResult {
    let program = parse_program(source).unwrap_or_else(|e| panic!("bad test program: {e}"));
    evaluate(&program, &PARAMS, policy, backend)
}

pub fn expected_term(source: &str) -> Term {
    parse_term(source).unwrap_or_else(|e| panic!("bad expected term: {e}"))
}

/// Declares a test that evaluates `input` on every backend.
///
/// ```ignore
/// test_case!(
///     add_integer,
///     input: "(program 1.0.0 [(builtin addInteger) (con integer 5) (con integer 10)])",
///     result: "(con integer 15)",
///     budget: (402, 149308),
/// );
///
/// test_case!(
///     explicit_error,
///     input: "(program 1.0.0 (error))",
///     failure: ExplicitError,
/// );
/// ```
macro_rules! test_case {
    (
        $name:ident,
        input: $input:expr,
        result: $result:expr
        $(, budget: ($mem:expr, $cpu:expr))?
        $(,)?
    ) => {
        #[test]
        fn $name() {
            let expected = $crate::cases::expected_term($result);
            for backend in uplc::Backend::ALL {
                let result = $crate::cases::eval($input, backend);
                pretty_assertions::assert_eq!(
                    result.term(),
                    Some(&expected),
                    "backend {backend}: {result}"
                );
                $(
                    pretty_assertions::assert_eq!(
                        result.budget(),
                        uplc::ExBudget::new($mem, $cpu),
                        "backend {backend}"
                    );
                )?
            }
        }
    };
    (
        $name:ident,
        input: $input:expr,
        failure: $kind:ident
        $(,)?
    ) => {
        #[test]
        fn $name() {
            for backend in uplc::Backend::ALL {
                let result = $crate::cases::eval($input, backend);
                pretty_assertions::assert_eq!(
                    result.failure_kind(),
                    Some(uplc::FailureKind::$kind),
                    "backend {backend}: {result}"
                );
            }
        }
    };
}
