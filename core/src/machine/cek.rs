use std::rc::Rc;

use tracing::debug;

use crate::{
    ast::Term,
    budget::BudgetSpender,
    cost::StepKind,
    machine::{Applied, Env, Machine, MachineContext, MachineError, Value},
};

/// The reference CEK machine: a compute/return loop with a heap-held
/// continuation stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct CekMachine;

/// Continuation frames.
enum Frame {
    /// Waiting for the function; the argument is still a term.
    AwaitFunTerm { argument: Rc<Term>, env: Env },
    /// Waiting for the argument of an evaluated function.
    AwaitArg { function: Value },
    /// Waiting for a function to apply to an already evaluated argument.
    AwaitFunValue { argument: Value },
    Force,
    /// Collecting constructor fields left to right. `todo` is reversed.
    Constr {
        tag: u64,
        todo: Vec<Rc<Term>>,
        done: Vec<Value>,
        env: Env,
    },
    Cases { branches: Vec<Rc<Term>>, env: Env },
}

enum State {
    Compute(Rc<Term>, Env),
    Return(Value),
}

impl Machine for CekMachine {
    fn name(&self) -> &'static str {
        "cek"
    }

    fn run<S: BudgetSpender>(
        &self,
        term: &Rc<Term>,
        ctx: &mut MachineContext<'_, S>,
    ) -> Result<Value, MachineError> {
        let mut frames: Vec<Frame> = Vec::new();
        let mut state = State::Compute(term.clone(), Env::new());
        let mut steps: u64 = 0;
        loop {
            steps += 1;
            state = match state {
                State::Compute(term, env) => compute(ctx, &mut frames, &term, env)?,
                State::Return(value) => match frames.pop() {
                    Some(frame) => return_to(ctx, &mut frames, frame, value)?,
                    None => {
                        debug!(steps, "CEK machine halted");
                        return Ok(value);
                    }
                },
            };
        }
    }
}

fn compute<S: BudgetSpender>(
    ctx: &mut MachineContext<'_, S>,
    frames: &mut Vec<Frame>,
    term: &Rc<Term>,
    env: Env,
) -> Result<State, MachineError> {
    let state = match &**term {
        Term::Var(index) => State::Return(ctx.var(&env, *index)?),
        Term::Lambda(body) => State::Return(ctx.lambda(body, &env)?),
        Term::Delay(body) => State::Return(ctx.delay(body, &env)?),
        Term::Constant(constant) => State::Return(ctx.constant(constant)?),
        Term::Builtin(fun) => State::Return(ctx.builtin(*fun)?),
        Term::Error => return Err(MachineError::ExplicitError),
        Term::Apply { function, argument } => {
            frames.push(Frame::AwaitFunTerm {
                argument: argument.clone(),
                env: env.clone(),
            });
            State::Compute(function.clone(), env)
        }
        Term::Force(body) => {
            frames.push(Frame::Force);
            State::Compute(body.clone(), env)
        }
        Term::Constr { tag, fields } => {
            ctx.step(StepKind::Constr)?;
            match fields.split_first() {
                None => State::Return(Value::constr(*tag, Vec::new())),
                Some((first, rest)) => {
                    frames.push(Frame::Constr {
                        tag: *tag,
                        todo: rest.iter().rev().cloned().collect(),
                        done: Vec::with_capacity(fields.len()),
                        env: env.clone(),
                    });
                    State::Compute(first.clone(), env)
                }
            }
        }
        Term::Case {
            scrutinee,
            branches,
        } => {
            ctx.step(StepKind::Case)?;
            frames.push(Frame::Cases {
                branches: branches.clone(),
                env: env.clone(),
            });
            State::Compute(scrutinee.clone(), env)
        }
    };
    Ok(state)
}

fn return_to<S: BudgetSpender>(
    ctx: &mut MachineContext<'_, S>,
    frames: &mut Vec<Frame>,
    frame: Frame,
    value: Value,
) -> Result<State, MachineError> {
    let applied = match frame {
        Frame::AwaitFunTerm { argument, env } => {
            frames.push(Frame::AwaitArg { function: value });
            return Ok(State::Compute(argument, env));
        }
        Frame::AwaitArg { function } => ctx.apply(function, value)?,
        Frame::AwaitFunValue { argument } => ctx.apply(value, argument)?,
        Frame::Force => ctx.force(value)?,
        Frame::Constr {
            tag,
            mut todo,
            mut done,
            env,
        } => {
            done.push(value);
            return Ok(match todo.pop() {
                Some(next) => {
                    frames.push(Frame::Constr {
                        tag,
                        todo,
                        done,
                        env: env.clone(),
                    });
                    State::Compute(next, env)
                }
                None => State::Return(Value::constr(tag, done)),
            });
        }
        Frame::Cases { branches, env } => {
            let (tag, fields) = match value {
                Value::Constr(tag, fields) => (tag, fields),
                other => return Err(MachineError::type_mismatch("constructor", &other)),
            };
            let branch = usize::try_from(tag)
                .ok()
                .and_then(|i| branches.get(i))
                .ok_or_else(|| MachineError::TypeMismatch {
                    expected: format!("one of {} case branches", branches.len()),
                    found: format!("constructor {tag}"),
                })?;
            for field in fields.iter().rev() {
                frames.push(Frame::AwaitFunValue {
                    argument: field.clone(),
                });
            }
            return Ok(State::Compute(branch.clone(), env));
        }
    };
    Ok(match applied {
        Applied::Enter { body, env } => State::Compute(body, env),
        Applied::Value(value) => State::Return(value),
    })
}
