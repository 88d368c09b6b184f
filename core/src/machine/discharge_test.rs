use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::{
    ast::{Constant, Term},
    builtins::{BuiltinRuntime, DefaultFunction},
};

fn int(n: i64) -> Value {
    Value::integer(n)
}

#[test]
fn test_constant() {
    assert_eq!(discharge(&int(4)), Term::integer(4));
}

#[test]
fn test_lambda_substitutes_environment() {
    // (lam y x) with x = 7 in scope.
    let env = Env::new().extend(int(7));
    let value = Value::Lambda(Rc::new(Term::var(2)), env);
    assert_eq!(discharge(&value), Term::lambda(Term::integer(7)));
}

#[test]
fn test_bound_variables_are_kept() {
    let env = Env::new().extend(int(7));
    let body = Term::lambda(Term::var(1).apply(Term::var(3)));
    let value = Value::Lambda(Rc::new(body), env);
    assert_eq!(
        discharge(&value),
        Term::lambda(Term::lambda(Term::var(1).apply(Term::integer(7))))
    );
}

#[test]
fn test_nested_closures() {
    let inner = Value::Delay(Rc::new(Term::var(1)), Env::new().extend(int(1)));
    let env = Env::new().extend(inner);
    let value = Value::Lambda(Rc::new(Term::var(2)), env);
    assert_eq!(
        discharge(&value),
        Term::lambda(Term::delay(Term::integer(1)))
    );
}

#[test]
fn test_partial_builtin() {
    let mut runtime = BuiltinRuntime::new(DefaultFunction::IfThenElse);
    runtime.consume_force();
    runtime.push_arg(Value::bool(true));
    let value = Value::Builtin(Rc::new(runtime));
    assert_eq!(
        discharge(&value),
        Term::builtin(DefaultFunction::IfThenElse)
            .forced()
            .apply(Term::bool(true))
    );
}

#[test]
fn test_constr_fields() {
    let value = Value::constr(2, vec![int(1), Value::con(Constant::Unit)]);
    assert_eq!(
        discharge(&value),
        Term::constr(2, vec![Term::integer(1), Term::unit()])
    );
}

#[test]
fn test_case_inside_closure() {
    let env = Env::new().extend(int(9));
    let body = Term::case(Term::var(2), vec![Term::var(1), Term::var(2)]);
    let value = Value::Lambda(Rc::new(body), env);
    assert_eq!(
        discharge(&value),
        Term::lambda(Term::case(
            Term::integer(9),
            vec![Term::var(1), Term::integer(9)]
        ))
    );
}

#[test]
fn test_deep_value() {
    let mut value = int(0);
    for _ in 0..100_000 {
        value = Value::constr(0, vec![value]);
    }
    let term = discharge(&value);
    assert_eq!(term.size(), 100_001);
}
