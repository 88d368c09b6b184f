use std::mem;

use crate::{
    budget::BudgetSpender,
    cost::StepKind,
    machine::{Applied, Env, MachineContext, MachineError, Value},
    vm::{
        Code, Frame, FrameStack, Snippet,
        instruction_set::{Addr, Instruction, Operand, OperandRange, RETURN_ADDR, SnippetId},
    },
};

/// Executes compiled code with continuation frames held in `F`.
pub struct Vm<'c, F> {
    code: &'c Code,
    frames: F,
    ip: Addr,
    env: Env,
    /// The value most recently produced.
    acc: Option<Value>,
    steps: u64,
}

impl<'c, F: FrameStack> Vm<'c, F> {
    pub fn new(code: &'c Code, frames: F) -> Self {
        Vm {
            code,
            frames,
            ip: code.entry,
            env: Env::new(),
            acc: None,
            steps: 0,
        }
    }

    /// Instructions dispatched so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn run<S: BudgetSpender>(
        &mut self,
        ctx: &mut MachineContext<'_, S>,
    ) -> Result<Value, MachineError> {
        loop {
            let instruction = self.code.instructions[self.ip as usize];
            self.steps += 1;

            use Instruction::*;
            match instruction {
                ExecSnippet(id) => {
                    let value = self.snippet(ctx, id)?;
                    self.acc = Some(value);
                    self.ip += 1;
                }
                Apply { fun, arg } => {
                    let resume = self.ip + 1;
                    match fun {
                        Operand::Snippet(id) => {
                            let fun = self.snippet(ctx, id)?;
                            self.apply_to(ctx, fun, arg, resume)?;
                        }
                        Operand::Unit(addr) => {
                            self.frames.push(Frame::AwaitFun {
                                arg,
                                env: self.env.clone(),
                                resume,
                            });
                            self.ip = addr;
                        }
                    }
                }
                ForceUnwrap => {
                    let value = self.take_acc()?;
                    let applied = ctx.force(value)?;
                    let env = mem::take(&mut self.env);
                    self.finish(applied, env, self.ip + 1)?;
                }
                Construct { tag, fields } => {
                    ctx.step(StepKind::Constr)?;
                    let done = Vec::with_capacity(fields.len());
                    let env = mem::take(&mut self.env);
                    self.construct(ctx, tag, fields, done, env, self.ip + 1)?;
                }
                Case {
                    scrutinee,
                    branches,
                } => {
                    ctx.step(StepKind::Case)?;
                    let resume = self.ip + 1;
                    match scrutinee {
                        Operand::Snippet(id) => {
                            let value = self.snippet(ctx, id)?;
                            let env = mem::take(&mut self.env);
                            self.dispatch(ctx, value, branches, env, resume)?;
                        }
                        Operand::Unit(addr) => {
                            self.frames.push(Frame::AwaitScrutinee {
                                branches,
                                env: self.env.clone(),
                                resume,
                            });
                            self.ip = addr;
                        }
                    }
                }
                Return => {
                    let value = self.take_acc()?;
                    match self.frames.pop() {
                        Some(frame) => self.resume(ctx, frame, value)?,
                        None => return Ok(value),
                    }
                }
            }
        }
    }

    /// Hands `value` to a popped frame.
    fn resume<S: BudgetSpender>(
        &mut self,
        ctx: &mut MachineContext<'_, S>,
        frame: Frame,
        value: Value,
    ) -> Result<(), MachineError> {
        match frame {
            Frame::AwaitFun { arg, env, resume } => {
                self.env = env;
                self.apply_to(ctx, value, arg, resume)
            }
            Frame::AwaitArg { fun, env, resume } => {
                let applied = ctx.apply(fun, value)?;
                self.finish(applied, env, resume)
            }
            Frame::ApplyField { arg, env, resume } => {
                let applied = ctx.apply(value, arg)?;
                self.finish(applied, env, resume)
            }
            Frame::Resume { env, resume } => {
                self.env = env;
                self.acc = Some(value);
                self.ip = resume;
                Ok(())
            }
            Frame::AwaitField {
                tag,
                fields,
                mut done,
                env,
                resume,
            } => {
                done.push(value);
                self.construct(ctx, tag, fields, done, env, resume)
            }
            Frame::AwaitScrutinee {
                branches,
                env,
                resume,
            } => self.dispatch(ctx, value, branches, env, resume),
        }
    }

    /// Evaluates `arg` under the current environment and applies `fun`.
    fn apply_to<S: BudgetSpender>(
        &mut self,
        ctx: &mut MachineContext<'_, S>,
        fun: Value,
        arg: Operand,
        resume: Addr,
    ) -> Result<(), MachineError> {
        match arg {
            Operand::Snippet(id) => {
                let arg = self.snippet(ctx, id)?;
                let applied = ctx.apply(fun, arg)?;
                let env = mem::take(&mut self.env);
                self.finish(applied, env, resume)
            }
            Operand::Unit(addr) => {
                self.frames.push(Frame::AwaitArg {
                    fun,
                    env: self.env.clone(),
                    resume,
                });
                self.ip = addr;
                Ok(())
            }
        }
    }

    /// Continues after an application or force. Entering a body pushes a
    /// `Resume` frame unless the continuation would just return.
    fn finish(&mut self, applied: Applied, env: Env, resume: Addr) -> Result<(), MachineError> {
        match applied {
            Applied::Enter { body, env: callee } => {
                let entry = self.code.entry_of(&body).ok_or_else(|| {
                    MachineError::MalformedProgram("body has no compiled entry".to_string())
                })?;
                if !self.code.returns_at(resume) {
                    self.frames.push(Frame::Resume { env, resume });
                }
                self.env = callee;
                self.ip = entry;
            }
            Applied::Value(value) => {
                self.acc = Some(value);
                self.env = env;
                self.ip = resume;
            }
        }
        Ok(())
    }

    /// Evaluates the remaining constructor fields left to right.
    fn construct<S: BudgetSpender>(
        &mut self,
        ctx: &mut MachineContext<'_, S>,
        tag: u64,
        fields: OperandRange,
        mut done: Vec<Value>,
        env: Env,
        resume: Addr,
    ) -> Result<(), MachineError> {
        self.env = env;
        let code = self.code;
        for operand in &code.operands(fields)[done.len()..] {
            match *operand {
                Operand::Snippet(id) => done.push(self.snippet(ctx, id)?),
                Operand::Unit(addr) => {
                    self.frames.push(Frame::AwaitField {
                        tag,
                        fields,
                        done,
                        env: self.env.clone(),
                        resume,
                    });
                    self.ip = addr;
                    return Ok(());
                }
            }
        }
        self.acc = Some(Value::constr(tag, done));
        self.ip = resume;
        Ok(())
    }

    /// Selects the branch for a constructed value and applies it to the
    /// value's fields.
    fn dispatch<S: BudgetSpender>(
        &mut self,
        ctx: &mut MachineContext<'_, S>,
        scrutinee: Value,
        branches: OperandRange,
        env: Env,
        resume: Addr,
    ) -> Result<(), MachineError> {
        let (tag, fields) = match scrutinee {
            Value::Constr(tag, fields) => (tag, fields),
            other => return Err(MachineError::type_mismatch("constructor", &other)),
        };
        let code = self.code;
        let branches = code.operands(branches);
        let branch = usize::try_from(tag)
            .ok()
            .and_then(|i| branches.get(i))
            .copied()
            .ok_or_else(|| MachineError::TypeMismatch {
                expected: format!("one of {} case branches", branches.len()),
                found: format!("constructor {tag}"),
            })?;

        // The last field resumes the caller; earlier ones return straight
        // into the next field's frame.
        self.env = env;
        let count = fields.len();
        for (i, field) in fields.iter().enumerate().rev() {
            let (env, resume) = if i + 1 == count {
                (self.env.clone(), resume)
            } else {
                (Env::new(), RETURN_ADDR)
            };
            self.frames.push(Frame::ApplyField {
                arg: field.clone(),
                env,
                resume,
            });
        }
        drop(fields);

        // Without fields the branch itself is the result.
        let branch_resume = if count == 0 { resume } else { RETURN_ADDR };
        match branch {
            Operand::Snippet(id) => {
                self.acc = Some(self.snippet(ctx, id)?);
                self.ip = branch_resume;
            }
            Operand::Unit(addr) => {
                if !self.code.returns_at(branch_resume) {
                    self.frames.push(Frame::Resume {
                        env: self.env.clone(),
                        resume: branch_resume,
                    });
                }
                self.ip = addr;
            }
        }
        Ok(())
    }

    fn snippet<S: BudgetSpender>(
        &self,
        ctx: &mut MachineContext<'_, S>,
        id: SnippetId,
    ) -> Result<Value, MachineError> {
        match self.code.snippet(id) {
            Snippet::Var(index) => ctx.var(&self.env, *index),
            Snippet::Constant(constant) => ctx.constant(constant),
            Snippet::Builtin(fun) => ctx.builtin(*fun),
            Snippet::Lambda(body) => ctx.lambda(body, &self.env),
            Snippet::Delay(body) => ctx.delay(body, &self.env),
            Snippet::Error => Err(MachineError::ExplicitError),
        }
    }

    fn take_acc(&mut self) -> Result<Value, MachineError> {
        self.acc
            .take()
            .ok_or_else(|| MachineError::MalformedProgram("no value to return".to_string()))
    }
}
