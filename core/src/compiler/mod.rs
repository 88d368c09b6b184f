//! Compiler from terms to VM code.
//!
//! ## Design
//!
//! - Leaf terms become snippets, evaluated in place by whoever needs them
//! - Every other term becomes a unit ending in `Return`; operands refer to
//!   units by id while compiling and by address once all units are laid out
//! - Units are memoised by term address, so shared subterms compile once
//! - The traversal uses a worklist, never the host stack

mod error;
mod jit;


pub use error::CompileError;
pub use jit::JitCompiler;
