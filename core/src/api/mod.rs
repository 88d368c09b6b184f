//! Public API of the evaluator.
//!
//! [`evaluate`] runs one program with explicit parameters, policy and
//! backend. [`Evaluator`] bundles parameters and [`EvaluationOptions`] for
//! repeated use and accepts textual or flat-encoded programs.
//!
//! # Example
//!
//! ```
//! use uplc_core::api::{Backend, EvalResult, evaluate};
//! use uplc_core::budget::BudgetPolicy;
//! use uplc_core::cost::{LanguageVersion, MachineParams};
//! use uplc_core::parser::parse_program;
//!
//! let params = MachineParams::embedded(LanguageVersion::PlutusV3).unwrap();
//! let program = parse_program("(program 1.0.0 (force (delay (con integer 42))))").unwrap();
//!
//! let result = evaluate(&program, &params, BudgetPolicy::Counting, Backend::Cek);
//! assert!(matches!(result, EvalResult::Success { .. }));
//! assert_eq!(result.budget().cpu, 48100);
//! ```

pub mod engine;
pub mod error;
pub mod options;
pub mod result;

pub use engine::{Evaluator, evaluate};
pub use error::{Diagnostic, Error, RelatedInfo, Severity};
pub use options::{Backend, EvaluationOptions};
pub use result::EvalResult;

#[cfg(test)]
mod engine_test;
