use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::{
    ast::{Constant, Term},
    budget::{BudgetSpender, ExBudget},
    builtins::{self, BuiltinRuntime, DefaultFunction},
    cost::{ExMem, MachineParams, StepKind},
    machine::{Env, MachineError, Value},
};

/// Outcome of applying or forcing a value.
pub enum Applied {
    /// Continue by computing `body` under `env`.
    Enter { body: Rc<Term>, env: Env },
    /// The result is already a value.
    Value(Value),
}

/// State shared by every machine: parameters, the spender, and the trace
/// log. All charging goes through here so backends cannot drift apart.
pub struct MachineContext<'p, S> {
    params: &'p MachineParams,
    spender: S,
    logs: Vec<String>,
}

impl<'p, S: BudgetSpender> MachineContext<'p, S> {
    pub fn new(params: &'p MachineParams, spender: S) -> Self {
        Self {
            params,
            spender,
            logs: Vec::new(),
        }
    }

    pub fn params(&self) -> &'p MachineParams {
        self.params
    }

    pub fn spent(&self) -> ExBudget {
        self.spender.spent()
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Consumes the context, returning the final spend and the trace log.
    pub fn finish(self) -> (ExBudget, Vec<String>) {
        (self.spender.spent(), self.logs)
    }

    /// The one-off charge made before the first step.
    pub fn startup(&mut self) -> Result<(), MachineError> {
        self.spender.spend(self.params.machine_costs.startup)
    }

    #[inline]
    pub fn step(&mut self, kind: StepKind) -> Result<(), MachineError> {
        self.spender.spend(self.params.machine_costs.step(kind))
    }

    pub fn var(&mut self, env: &Env, index: usize) -> Result<Value, MachineError> {
        self.step(StepKind::Var)?;
        env.lookup(index).cloned().ok_or_else(|| {
            MachineError::MalformedProgram(format!(
                "variable index {index} is out of scope (environment holds {})",
                env.len()
            ))
        })
    }

    pub fn constant(&mut self, constant: &Rc<Constant>) -> Result<Value, MachineError> {
        self.step(StepKind::Constant)?;
        Ok(Value::Con(constant.clone()))
    }

    pub fn lambda(&mut self, body: &Rc<Term>, env: &Env) -> Result<Value, MachineError> {
        self.step(StepKind::Lambda)?;
        Ok(Value::Lambda(body.clone(), env.clone()))
    }

    pub fn delay(&mut self, body: &Rc<Term>, env: &Env) -> Result<Value, MachineError> {
        self.step(StepKind::Delay)?;
        Ok(Value::Delay(body.clone(), env.clone()))
    }

    pub fn builtin(&mut self, fun: DefaultFunction) -> Result<Value, MachineError> {
        self.step(StepKind::Builtin)?;
        if !self.params.builtin_costs.contains(fun) {
            return Err(MachineError::MalformedProgram(format!(
                "builtin {fun} is not available under the current cost model"
            )));
        }
        Ok(Value::Builtin(Rc::new(BuiltinRuntime::new(fun))))
    }

    /// Applies `function` to `argument`. Only closures pay the apply step;
    /// builtins pay when saturated.
    pub fn apply(&mut self, function: Value, argument: Value) -> Result<Applied, MachineError> {
        match function {
            Value::Lambda(body, env) => {
                self.step(StepKind::Apply)?;
                Ok(Applied::Enter {
                    body,
                    env: env.extend(argument),
                })
            }
            Value::Builtin(runtime) => {
                if runtime.needs_force() || runtime.is_saturated() {
                    return Err(MachineError::type_mismatch(
                        "builtin expecting an argument",
                        &Value::Builtin(runtime),
                    ));
                }
                let mut runtime = Rc::unwrap_or_clone(runtime);
                runtime.push_arg(argument);
                self.settle(runtime)
            }
            other => Err(MachineError::type_mismatch("function", &other)),
        }
    }

    /// Forces `value`: delayed terms are entered, builtins waiting for a
    /// type force consume it.
    pub fn force(&mut self, value: Value) -> Result<Applied, MachineError> {
        self.step(StepKind::Force)?;
        match value {
            Value::Delay(body, env) => Ok(Applied::Enter { body, env }),
            Value::Builtin(runtime) if runtime.needs_force() => {
                let mut runtime = Rc::unwrap_or_clone(runtime);
                runtime.consume_force();
                self.settle(runtime)
            }
            other => Err(MachineError::type_mismatch("delayed term", &other)),
        }
    }

    fn settle(&mut self, runtime: BuiltinRuntime) -> Result<Applied, MachineError> {
        if runtime.is_saturated() {
            return self.call_builtin(&runtime).map(Applied::Value);
        }
        Ok(Applied::Value(Value::Builtin(Rc::new(runtime))))
    }

    fn call_builtin(&mut self, runtime: &BuiltinRuntime) -> Result<Value, MachineError> {
        let fun = runtime.fun;
        if self.spender.is_enabled() {
            let sizes: SmallVec<[i64; 6]> = runtime.args().iter().map(|arg| arg.ex_mem()).collect();
            let cost = self
                .params
                .builtin_costs
                .get(fun)
                .map(|costs| costs.cost(&sizes))
                .ok_or_else(|| {
                    MachineError::MalformedProgram(format!("no cost model for builtin {fun}"))
                })?;
            trace!(%fun, ?sizes, ?cost, "Charging builtin");
            self.spender.spend(cost)?;
        }
        builtins::call(fun, runtime.args(), &mut self.logs)
    }
}
