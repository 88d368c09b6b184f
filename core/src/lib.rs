//! Untyped Plutus Core evaluation.
//!
//! Programs are evaluated either by the reference CEK machine or by
//! compiling them for the frame-stack VM. Both charge the same costs from
//! the same [`cost::MachineParams`], so they agree on results and budgets.

pub mod api;
pub mod ast;
pub mod budget;
pub mod builtins;
pub mod compiler;
pub mod cost;
pub mod flat;
pub mod machine;
pub mod parser;
pub mod scope_stack;
pub mod vm;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_add_integer() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
