//! UPLC - a deterministic evaluator for Untyped Plutus Core
//!
//! # Overview
//!
//! Programs are closed lambda-calculus terms with builtins, constants and
//! constructor/case forms. Evaluation is a pure function of the program,
//! the cost model parameters and the budget: every validator running the
//! same program reaches the same verdict at the same cost.
//!
//! # Quick Start
//!
//! ```
//! use uplc::{Backend, BudgetPolicy, EvaluationOptions, Evaluator};
//!
//! let evaluator = Evaluator::embedded(EvaluationOptions {
//!     backend: Backend::Cek,
//!     policy: BudgetPolicy::Counting,
//! })
//! .unwrap();
//!
//! let result = evaluator
//!     .evaluate_text("(program 1.0.0 [(lam x [(builtin addInteger) x (con integer 1)]) (con integer 5)])")
//!     .unwrap();
//! assert_eq!(result.term().unwrap().to_string(), "(con integer 6)");
//! ```
//!
//! # Backends
//!
//! [`Backend::Cek`] is the reference machine. The [`Backend::Jit`] variants
//! compile the term once and run it on a frame-stack VM whose host stack use
//! does not grow with the program. All backends agree on results and on the
//! exact budget spent.

mod error_renderer;

// Re-export public API from uplc_core
pub use uplc_core::api::{
    Backend, Diagnostic, Error, EvalResult, EvaluationOptions, Evaluator, RelatedInfo, Severity,
    evaluate,
};

// Re-export the term model and the pieces an embedder configures
pub use uplc_core::ast::{self, Constant, PlutusData, Program, Term, Type, Version};
pub use uplc_core::budget::{self, BudgetPolicy, ExBudget};
pub use uplc_core::cost::{self, CostModelTable, LanguageVersion, MachineParams, ProtocolVersion};
pub use uplc_core::machine::{FailureKind, MachineError};
pub use uplc_core::parser::{self, ParseError, parse_program, parse_term};
pub use uplc_core::vm::FrameStrategy;
pub use uplc_core::{builtins, compiler, flat};

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
