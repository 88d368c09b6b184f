use std::rc::Rc;

use num_bigint::BigInt;

use crate::{
    ast::{Constant, PlutusData},
    builtins::DefaultFunction,
};

/// A Plutus Core term with de Bruijn indexed variables.
///
/// Equality is structural, which for de Bruijn terms is exactly
/// alpha-equivalence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A variable; `Var(1)` is the innermost binder. Index 0 is malformed.
    Var(usize),
    Lambda(Rc<Term>),
    Apply {
        function: Rc<Term>,
        argument: Rc<Term>,
    },
    Delay(Rc<Term>),
    Force(Rc<Term>),
    Constant(Rc<Constant>),
    Builtin(DefaultFunction),
    Error,
    Constr {
        tag: u64,
        fields: Vec<Rc<Term>>,
    },
    Case {
        scrutinee: Rc<Term>,
        branches: Vec<Rc<Term>>,
    },
}

impl Term {
    pub fn var(index: usize) -> Term {
        Term::Var(index)
    }

    pub fn lambda(body: Term) -> Term {
        Term::Lambda(Rc::new(body))
    }

    pub fn delay(body: Term) -> Term {
        Term::Delay(Rc::new(body))
    }

    pub fn force(body: Term) -> Term {
        Term::Force(Rc::new(body))
    }

    pub fn builtin(fun: DefaultFunction) -> Term {
        Term::Builtin(fun)
    }

    pub fn constant(constant: Constant) -> Term {
        Term::Constant(Rc::new(constant))
    }

    pub fn integer(value: impl Into<BigInt>) -> Term {
        Term::constant(Constant::Integer(value.into()))
    }

    pub fn byte_string(bytes: impl Into<Vec<u8>>) -> Term {
        Term::constant(Constant::ByteString(bytes.into()))
    }

    pub fn string(text: impl Into<String>) -> Term {
        Term::constant(Constant::String(text.into()))
    }

    pub fn bool(value: bool) -> Term {
        Term::constant(Constant::Bool(value))
    }

    pub fn unit() -> Term {
        Term::constant(Constant::Unit)
    }

    pub fn data(data: PlutusData) -> Term {
        Term::constant(Constant::Data(data))
    }

    pub fn constr(tag: u64, fields: Vec<Term>) -> Term {
        Term::Constr {
            tag,
            fields: fields.into_iter().map(Rc::new).collect(),
        }
    }

    pub fn case(scrutinee: Term, branches: Vec<Term>) -> Term {
        Term::Case {
            scrutinee: Rc::new(scrutinee),
            branches: branches.into_iter().map(Rc::new).collect(),
        }
    }

    /// Applies `self` to `argument`, so calls can be chained:
    /// `Term::builtin(f).apply(x).apply(y)`.
    pub fn apply(self, argument: Term) -> Term {
        Term::Apply {
            function: Rc::new(self),
            argument: Rc::new(argument),
        }
    }

    /// Wraps `self` in a `Force`.
    pub fn forced(self) -> Term {
        Term::force(self)
    }

    /// Returns true when every variable refers to an enclosing lambda.
    pub fn is_closed(&self) -> bool {
        let mut pending: Vec<(&Term, usize)> = vec![(self, 0)];
        while let Some((term, depth)) = pending.pop() {
            match term {
                Term::Var(index) => {
                    if *index == 0 || *index > depth {
                        return false;
                    }
                }
                Term::Lambda(body) => pending.push((body, depth + 1)),
                Term::Delay(body) | Term::Force(body) => pending.push((body, depth)),
                Term::Apply { function, argument } => {
                    pending.push((function, depth));
                    pending.push((argument, depth));
                }
                Term::Constr { fields, .. } => {
                    pending.extend(fields.iter().map(|field| (&**field, depth)));
                }
                Term::Case {
                    scrutinee,
                    branches,
                } => {
                    pending.push((scrutinee, depth));
                    pending.extend(branches.iter().map(|branch| (&**branch, depth)));
                }
                Term::Constant(_) | Term::Builtin(_) | Term::Error => {}
            }
        }
        true
    }

    /// Alpha-equivalence. With de Bruijn indices this is plain equality.
    pub fn alpha_eq(&self, other: &Term) -> bool {
        self == other
    }

    /// Number of nodes in the term.
    pub fn size(&self) -> usize {
        let mut size = 0;
        let mut pending: Vec<&Term> = vec![self];
        while let Some(term) = pending.pop() {
            size += 1;
            match term {
                Term::Lambda(body) | Term::Delay(body) | Term::Force(body) => pending.push(body),
                Term::Apply { function, argument } => {
                    pending.push(function);
                    pending.push(argument);
                }
                Term::Constr { fields, .. } => pending.extend(fields.iter().map(|f| &**f)),
                Term::Case {
                    scrutinee,
                    branches,
                } => {
                    pending.push(scrutinee);
                    pending.extend(branches.iter().map(|b| &**b));
                }
                Term::Var(_) | Term::Constant(_) | Term::Builtin(_) | Term::Error => {}
            }
        }
        size
    }

    /// Moves the children out of `self`, leaving placeholders behind.
    fn detach_children(&mut self, out: &mut Vec<Rc<Term>>) {
        match self {
            Term::Lambda(body) | Term::Delay(body) | Term::Force(body) => out.push(detach(body)),
            Term::Apply { function, argument } => {
                out.push(detach(function));
                out.push(detach(argument));
            }
            Term::Constr { fields, .. } => out.append(fields),
            Term::Case {
                scrutinee,
                branches,
            } => {
                out.push(detach(scrutinee));
                out.append(branches);
            }
            Term::Var(_) | Term::Constant(_) | Term::Builtin(_) | Term::Error => {}
        }
    }
}

thread_local! {
    static PLACEHOLDER: Rc<Term> = Rc::new(Term::Error);
}

fn detach(slot: &mut Rc<Term>) -> Rc<Term> {
    let placeholder = PLACEHOLDER
        .try_with(Rc::clone)
        .unwrap_or_else(|_| Rc::new(Term::Error));
    std::mem::replace(slot, placeholder)
}

// Deeply nested terms (long application spines, nested lambdas) would
// overflow the native stack with the derived drop glue.
impl Drop for Term {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(child) = pending.pop() {
            if let Some(mut term) = Rc::into_inner(child) {
                term.detach_children(&mut pending);
            }
        }
    }
}
