use thiserror::Error;

use crate::builtins::DefaultFunction;

/// Errors raised while loading cost model parameters.
#[derive(Debug, Error)]
pub enum CostModelError {
    #[error("invalid cost model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("costing function for {fun} reads argument {position} but the builtin takes {arity}")]
    ArgumentOutOfRange {
        fun: DefaultFunction,
        position: usize,
        arity: usize,
    },

    #[error("negative cost {value} in {location}")]
    NegativeCost { location: String, value: i64 },

    #[error("no cost model for {language} at protocol version {protocol}")]
    NoMatchingEntry {
        language: String,
        protocol: String,
    },
}
