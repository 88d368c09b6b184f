//! Converts machine values back into closed terms.
//!
//! Closures are turned into terms by substituting their environment into
//! the body. The traversal keeps its own stack, so deeply nested values and
//! long environments do not exhaust the native stack.

use std::rc::Rc;

use crate::{
    ast::Term,
    builtins::DefaultFunction,
    machine::{Env, Value},
};

enum Task<'a> {
    Value(&'a Value),
    /// A closure body with an empty environment, already closed.
    Reuse(&'a Rc<Term>),
    /// Substitute `env` into `term`; `depth` counts binders crossed inside it.
    Term {
        term: &'a Rc<Term>,
        env: &'a Env,
        depth: usize,
    },
    Build(Build),
}

enum Build {
    Lambda,
    Delay,
    Force,
    Apply,
    Constr { tag: u64, arity: usize },
    Case { branches: usize },
    Builtin {
        fun: DefaultFunction,
        forces: usize,
        arguments: usize,
    },
}

/// Turns a value into the equivalent closed term.
pub fn discharge(value: &Value) -> Term {
    let mut tasks = vec![Task::Value(value)];
    let mut results: Vec<Rc<Term>> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Value(value) => match value {
                Value::Con(constant) => results.push(Rc::new(Term::Constant(constant.clone()))),
                Value::Delay(body, env) => {
                    tasks.push(Task::Build(Build::Delay));
                    push_body(&mut tasks, body, env, 0);
                }
                Value::Lambda(body, env) => {
                    tasks.push(Task::Build(Build::Lambda));
                    push_body(&mut tasks, body, env, 1);
                }
                Value::Builtin(runtime) => {
                    tasks.push(Task::Build(Build::Builtin {
                        fun: runtime.fun,
                        forces: runtime.forces(),
                        arguments: runtime.args().len(),
                    }));
                    tasks.extend(runtime.args().iter().rev().map(Task::Value));
                }
                Value::Constr(tag, fields) => {
                    tasks.push(Task::Build(Build::Constr {
                        tag: *tag,
                        arity: fields.len(),
                    }));
                    tasks.extend(fields.iter().rev().map(Task::Value));
                }
            },
            Task::Reuse(term) => results.push(term.clone()),
            Task::Term { term, env, depth } => substitute(&mut tasks, &mut results, term, env, depth),
            Task::Build(build) => build_node(&mut results, build),
        }
    }

    match results.pop() {
        Some(term) => Rc::unwrap_or_clone(term),
        None => Term::Error,
    }
}

fn push_body<'a>(tasks: &mut Vec<Task<'a>>, body: &'a Rc<Term>, env: &'a Env, depth: usize) {
    if env.is_empty() {
        tasks.push(Task::Reuse(body));
    } else {
        tasks.push(Task::Term {
            term: body,
            env,
            depth,
        });
    }
}

fn substitute<'a>(
    tasks: &mut Vec<Task<'a>>,
    results: &mut Vec<Rc<Term>>,
    term: &'a Rc<Term>,
    env: &'a Env,
    depth: usize,
) {
    match &**term {
        Term::Var(index) if *index > depth => match env.lookup(index - depth) {
            Some(value) => tasks.push(Task::Value(value)),
            None => results.push(term.clone()),
        },
        Term::Var(_) | Term::Constant(_) | Term::Builtin(_) | Term::Error => {
            results.push(term.clone())
        }
        Term::Lambda(body) => {
            tasks.push(Task::Build(Build::Lambda));
            tasks.push(Task::Term {
                term: body,
                env,
                depth: depth + 1,
            });
        }
        Term::Delay(body) => {
            tasks.push(Task::Build(Build::Delay));
            tasks.push(Task::Term {
                term: body,
                env,
                depth,
            });
        }
        Term::Force(body) => {
            tasks.push(Task::Build(Build::Force));
            tasks.push(Task::Term {
                term: body,
                env,
                depth,
            });
        }
        Term::Apply { function, argument } => {
            tasks.push(Task::Build(Build::Apply));
            tasks.push(Task::Term {
                term: argument,
                env,
                depth,
            });
            tasks.push(Task::Term {
                term: function,
                env,
                depth,
            });
        }
        Term::Constr { tag, fields } => {
            tasks.push(Task::Build(Build::Constr {
                tag: *tag,
                arity: fields.len(),
            }));
            tasks.extend(
                fields
                    .iter()
                    .rev()
                    .map(|field| Task::Term { term: field, env, depth }),
            );
        }
        Term::Case {
            scrutinee,
            branches,
        } => {
            tasks.push(Task::Build(Build::Case {
                branches: branches.len(),
            }));
            tasks.extend(
                branches
                    .iter()
                    .rev()
                    .map(|branch| Task::Term { term: branch, env, depth }),
            );
            tasks.push(Task::Term {
                term: scrutinee,
                env,
                depth,
            });
        }
    }
}

fn pop_many(results: &mut Vec<Rc<Term>>, count: usize) -> Vec<Rc<Term>> {
    let start = results.len().saturating_sub(count);
    results.split_off(start)
}

fn pop_one(results: &mut Vec<Rc<Term>>) -> Rc<Term> {
    results.pop().unwrap_or_else(|| Rc::new(Term::Error))
}

fn build_node(results: &mut Vec<Rc<Term>>, build: Build) {
    let term = match build {
        Build::Lambda => Term::Lambda(pop_one(results)),
        Build::Delay => Term::Delay(pop_one(results)),
        Build::Force => Term::Force(pop_one(results)),
        Build::Apply => {
            let argument = pop_one(results);
            let function = pop_one(results);
            Term::Apply { function, argument }
        }
        Build::Constr { tag, arity } => Term::Constr {
            tag,
            fields: pop_many(results, arity),
        },
        Build::Case { branches } => {
            let branches = pop_many(results, branches);
            let scrutinee = pop_one(results);
            Term::Case {
                scrutinee,
                branches,
            }
        }
        Build::Builtin {
            fun,
            forces,
            arguments,
        } => {
            let arguments = pop_many(results, arguments);
            let mut term = Term::Builtin(fun);
            for _ in 0..forces {
                term = Term::Force(Rc::new(term));
            }
            for argument in arguments {
                term = Term::Apply {
                    function: Rc::new(term),
                    argument,
                };
            }
            term
        }
    };
    results.push(Rc::new(term));
}
