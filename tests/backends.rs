//! Properties every backend must share: same verdicts, same budgets, and
//! no dependence on binder names or host stack depth.

mod cases;

use cases::{PARAMS, eval, eval_with};
use indoc::indoc;
use pretty_assertions::assert_eq;
use uplc::{
    Backend, BudgetPolicy, ExBudget, FailureKind, Program, Term, Version, builtins::DefaultFunction,
    evaluate,
};

const PROGRAMS: &[&str] = &[
    "(program 1.0.0 [(builtin addInteger) (con integer 5) (con integer 10)])",
    "(program 1.0.0 [(lam x [(builtin addInteger) x (con integer 1)]) (con integer 5)])",
    "(program 1.0.0 [(lam f [f [f (con integer 1)]]) (lam n [(builtin multiplyInteger) n (con integer 3)])])",
    "(program 1.0.0 [(lam x (lam y x)) (con integer 7)])",
    "(program 1.0.0 [(force (builtin ifThenElse)) (con bool False) (delay (error)) (delay (con unit ()))])",
    "(program 1.0.0 (force [(force (builtin ifThenElse)) (con bool False) (delay (error)) (delay (con unit ()))]))",
    "(program 1.0.0 [(force (builtin trace)) (con string \"hello\") (con integer 1)])",
    "(program 1.0.0 [(builtin appendByteString) (con bytestring #00) (con bytestring #ff)])",
    "(program 1.0.0 [(builtin addInteger) (con integer 1)])",
    "(program 1.0.0 (force (force (builtin fstPair))))",
    "(program 1.1.0 (case (constr 0 (con integer 1) (con integer 2)) (lam a (lam b [(builtin addInteger) a b]))))",
    "(program 1.1.0 (constr 4 (delay (error)) [(lam x x) (lam y y)]))",
    "(program 1.0.0 (error))",
    "(program 1.0.0 [(con integer 1) (con integer 2)])",
    "(program 1.0.0 [(builtin divideInteger) (con integer 1) (con integer 0)])",
    "(program 1.1.0 (case (con integer 3) (lam x x)))",
];

// Z-combinator countdown: a few hundred closure applications.
const COUNTDOWN: &str = indoc! {"
(program 1.0.0
  [ (lam f [ (lam x [f (lam v [x x v])]) (lam x [f (lam v [x x v])]) ])
    (lam self (lam n
      (force [ (force (builtin ifThenElse))
               [(builtin equalsInteger) n (con integer 0)]
               (delay (con integer 0))
               (delay [self [(builtin subtractInteger) n (con integer 1)]]) ])))
    (con integer 50) ])
"};

#[test]
fn test_backends_agree_on_results_and_budgets() {
    for source in PROGRAMS.iter().copied().chain([COUNTDOWN]) {
        let reference = eval(source, Backend::Cek);
        for backend in Backend::ALL {
            assert_eq!(eval(source, backend), reference, "{backend} on {source}");
        }
    }
}

#[test]
fn test_countdown_terminates() {
    let result = eval(COUNTDOWN, Backend::Cek);
    assert_eq!(result.term(), Some(&Term::integer(0)));
    assert!(result.budget().cpu > 50 * 16_000);
}

#[test]
fn test_evaluation_is_deterministic() {
    for backend in Backend::ALL {
        let first = eval(COUNTDOWN, backend);
        let second = eval(COUNTDOWN, backend);
        assert_eq!(first, second, "{backend}");
    }
}

#[test]
fn test_binder_names_do_not_matter() {
    let named = "(program 1.0.0 [(lam first (lam second [(builtin subtractInteger) first second])) (con integer 9) (con integer 4)])";
    let renamed = "(program 1.0.0 [(lam a (lam b [(builtin subtractInteger) a b])) (con integer 9) (con integer 4)])";
    for backend in Backend::ALL {
        assert_eq!(eval(named, backend), eval(renamed, backend), "{backend}");
    }
}

#[test]
fn test_counted_budget_is_the_exact_limit() {
    for source in PROGRAMS.iter().copied().chain([COUNTDOWN]) {
        let counted = eval(source, Backend::Cek);
        if !counted.is_success() {
            continue;
        }
        let spent = counted.budget();
        for backend in Backend::ALL {
            let exact = eval_with(source, BudgetPolicy::Restricting(spent), backend);
            assert_eq!(exact.term(), counted.term(), "{backend} on {source}");
            assert_eq!(exact.budget(), spent);

            let short_cpu = ExBudget::new(spent.mem, spent.cpu - 1);
            let starved = eval_with(source, BudgetPolicy::Restricting(short_cpu), backend);
            assert_eq!(
                starved.failure_kind(),
                Some(FailureKind::BudgetExhausted),
                "{backend} on {source}"
            );

            let short_mem = ExBudget::new(spent.mem - 1, spent.cpu);
            let starved = eval_with(source, BudgetPolicy::Restricting(short_mem), backend);
            assert_eq!(starved.failure_kind(), Some(FailureKind::BudgetExhausted));
        }
    }
}

#[test]
fn test_larger_inputs_cost_more() {
    let small = "(program 1.0.0 [(builtin appendByteString) (con bytestring #00) (con bytestring #00)])";
    let large = format!(
        "(program 1.0.0 [(builtin appendByteString) (con bytestring #{}) (con bytestring #{})])",
        "00".repeat(4096),
        "00".repeat(4096)
    );
    let small = eval(small, Backend::Cek).budget();
    let large = eval(&large, Backend::Cek).budget();
    assert!(large.mem > small.mem);
    assert!(large.cpu > small.cpu);
}

#[test]
fn test_unbudgeted_agrees_on_results() {
    for source in PROGRAMS {
        let counted = eval(source, Backend::Cek);
        for backend in Backend::ALL {
            let free = eval_with(source, BudgetPolicy::Unbudgeted, backend);
            assert_eq!(free.term(), counted.term(), "{backend} on {source}");
            assert_eq!(free.failure_kind(), counted.failure_kind());
            assert_eq!(free.budget(), ExBudget::ZERO);
        }
    }
}

fn deep_force_delay(depth: usize) -> Term {
    let mut term = Term::integer(1);
    for _ in 0..depth {
        term = Term::force(Term::delay(term));
    }
    term
}

fn deep_arguments(depth: usize) -> Term {
    // [(lam x x) [(lam x x) ... (con integer 1)]]
    let mut term = Term::integer(1);
    for _ in 0..depth {
        term = Term::lambda(Term::var(1)).apply(term);
    }
    term
}

fn deep_additions(depth: usize) -> Term {
    let mut term = Term::integer(0);
    for _ in 0..depth {
        term = Term::builtin(DefaultFunction::AddInteger)
            .apply(Term::integer(1))
            .apply(term);
    }
    term
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let depth = 100_000;
    let cases = [
        (deep_force_delay(depth), Term::integer(1)),
        (deep_arguments(depth), Term::integer(1)),
        (deep_additions(depth), Term::integer(depth as i64)),
    ];
    for (term, expected) in cases {
        let program = Program::new(Version::V1_0_0, term);
        let mut budgets = Vec::new();
        for backend in Backend::ALL {
            let result = evaluate(&program, &PARAMS, BudgetPolicy::Counting, backend);
            assert_eq!(result.term(), Some(&expected), "{backend}");
            budgets.push(result.budget());
        }
        assert!(budgets.windows(2).all(|w| w[0] == w[1]));
    }
}

#[test]
fn test_deep_value_is_discharged() {
    // A chain of delays is already a value and must be read back whole.
    let mut term = Term::integer(1);
    for _ in 0..50_000 {
        term = Term::delay(term);
    }
    let program = Program::new(Version::V1_0_0, term);
    for backend in Backend::ALL {
        let result = evaluate(&program, &PARAMS, BudgetPolicy::Counting, backend);
        // Compared by size: derived equality recurses on depth.
        assert_eq!(result.term().map(Term::size), Some(50_001), "{backend}");
    }
}
