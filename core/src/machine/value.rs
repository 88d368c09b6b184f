use std::{ops::Deref, rc::Rc};

use num_bigint::BigInt;

use crate::{
    ast::{Constant, Term},
    builtins::BuiltinRuntime,
    machine::Env,
};

/// A runtime value produced by either machine.
#[derive(Debug, Clone)]
pub enum Value {
    Con(Rc<Constant>),
    /// A suspended computation with its captured environment.
    Delay(Rc<Term>, Env),
    /// A lambda body with its captured environment.
    Lambda(Rc<Term>, Env),
    Builtin(Rc<BuiltinRuntime>),
    Constr(u64, Fields),
}

/// Evaluated constructor fields, shared between copies of the value.
#[derive(Debug, Clone, Default)]
pub struct Fields(Rc<Vec<Value>>);

impl Value {
    pub fn con(constant: Constant) -> Value {
        Value::Con(Rc::new(constant))
    }

    pub fn integer(value: impl Into<BigInt>) -> Value {
        Value::con(Constant::Integer(value.into()))
    }

    pub fn bool(value: bool) -> Value {
        Value::con(Constant::Bool(value))
    }

    pub fn byte_string(bytes: Vec<u8>) -> Value {
        Value::con(Constant::ByteString(bytes))
    }

    pub fn string(text: String) -> Value {
        Value::con(Constant::String(text))
    }

    pub fn constr(tag: u64, fields: Vec<Value>) -> Value {
        Value::Constr(tag, Fields::from(fields))
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Value::Con(constant) => Some(constant),
            _ => None,
        }
    }

    /// Short description used in type mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            Value::Con(constant) => format!("{} constant", constant.type_of()),
            Value::Delay(..) => "delayed term".to_string(),
            Value::Lambda(..) => "lambda".to_string(),
            Value::Builtin(runtime) => format!("builtin {}", runtime.fun),
            Value::Constr(tag, _) => format!("constructor {tag}"),
        }
    }
}

impl From<Vec<Value>> for Fields {
    fn from(values: Vec<Value>) -> Self {
        Fields(Rc::new(values))
    }
}

impl Deref for Fields {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.0
    }
}

impl Fields {
    /// Moves the values out if this is the last reference to them.
    pub(crate) fn unlink(&mut self, pending: &mut Vec<Value>) {
        if let Some(values) = Rc::get_mut(&mut self.0) {
            pending.append(values);
        }
    }
}

impl Drop for Fields {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.unlink(&mut pending);
        release(pending);
    }
}

/// Drops values without recursing into their children: anything uniquely
/// owned is moved onto the worklist first.
pub(crate) fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Lambda(_, mut env) | Value::Delay(_, mut env) => env.unlink(&mut pending),
            Value::Constr(_, mut fields) => fields.unlink(&mut pending),
            Value::Builtin(runtime) => {
                if let Some(runtime) = Rc::into_inner(runtime) {
                    pending.extend(runtime.into_args());
                }
            }
            Value::Con(_) => {}
        }
    }
}
