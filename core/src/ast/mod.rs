//! Untyped Plutus Core syntax: terms, constants, and the `Data` type.
//!
//! Terms use 1-based de Bruijn indices: `Var(1)` refers to the nearest
//! enclosing lambda. Subterms are reference counted so that closures, the
//! JIT, and discharge can share them without copying.

mod constant;
mod data;
mod display;
mod program;
mod term;

pub use constant::{Constant, Type};
pub use data::{DataDecodeError, PlutusData};
pub use program::{Program, Version};
pub use term::Term;
