//! Cost model: how much each machine step and builtin call costs.
//!
//! Parameters are data, loaded from JSON keyed by protocol and language
//! version. The default table ships embedded in the crate.

mod costing;
mod error;
mod ex_mem;
mod machine_costs;
mod params;

pub use costing::{CostingFun, Linear, OffDiagonal, OnDiagonal, Quadratic, Subtracted};
pub use error::CostModelError;
pub use ex_mem::{ExMem, byte_string_ex_mem, integer_ex_mem};
pub use machine_costs::{MachineCosts, StepKind};
pub use params::{
    BuiltinCostModel, BuiltinCosts, CostModelEntry, CostModelTable, LanguageVersion,
    MachineParams, ProtocolVersion,
};
