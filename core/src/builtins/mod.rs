//! Builtin functions: the catalogue, partial application state, and
//! the semantics of each function.

mod crypto;
mod default_function;
mod runtime;
mod semantics;

pub use default_function::{DefaultFunction, UnknownBuiltin};
pub use runtime::BuiltinRuntime;
pub(crate) use semantics::call;
