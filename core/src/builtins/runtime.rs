use smallvec::SmallVec;

use crate::{builtins::DefaultFunction, machine::Value};

/// A builtin that has received some, but not all, of its forces and
/// arguments.
#[derive(Debug, Clone)]
pub struct BuiltinRuntime {
    pub fun: DefaultFunction,
    forces: usize,
    args: SmallVec<[Value; 3]>,
}

impl BuiltinRuntime {
    pub fn new(fun: DefaultFunction) -> Self {
        Self {
            fun,
            forces: 0,
            args: SmallVec::new(),
        }
    }

    /// True while type forces are still expected; arguments are refused
    /// until they have all been supplied.
    pub fn needs_force(&self) -> bool {
        self.forces < self.fun.force_count()
    }

    pub fn consume_force(&mut self) {
        self.forces += 1;
    }

    pub fn push_arg(&mut self, arg: Value) {
        self.args.push(arg);
    }

    pub fn is_saturated(&self) -> bool {
        !self.needs_force() && self.args.len() == self.fun.arity()
    }

    pub fn forces(&self) -> usize {
        self.forces
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub(crate) fn into_args(self) -> SmallVec<[Value; 3]> {
        self.args
    }
}
