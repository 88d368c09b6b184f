use std::{collections::BTreeMap, fmt, str::FromStr};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    budget::ExBudget,
    builtins::DefaultFunction,
    cost::{CostModelError, CostingFun, MachineCosts},
};

const EMBEDDED_COST_MODELS: &str = include_str!("../../data/cost_models.json");

/// CPU and memory costing functions of one builtin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinCosts {
    pub cpu: CostingFun,
    pub memory: CostingFun,
}

impl BuiltinCosts {
    pub fn cost(&self, sizes: &[i64]) -> ExBudget {
        ExBudget {
            mem: self.memory.cost(sizes),
            cpu: self.cpu.cost(sizes),
        }
    }
}

/// Costs for every builtin available under a parameter set. A builtin
/// missing here is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinCostModel {
    costs: HashMap<DefaultFunction, BuiltinCosts>,
}

impl BuiltinCostModel {
    pub fn get(&self, fun: DefaultFunction) -> Option<&BuiltinCosts> {
        self.costs.get(&fun)
    }

    pub fn contains(&self, fun: DefaultFunction) -> bool {
        self.costs.contains_key(&fun)
    }

    pub fn insert(&mut self, fun: DefaultFunction, costs: BuiltinCosts) {
        self.costs.insert(fun, costs);
    }

    pub fn remove(&mut self, fun: DefaultFunction) -> Option<BuiltinCosts> {
        self.costs.remove(&fun)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

/// Everything the machine needs to price an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineParams {
    pub machine_costs: MachineCosts,
    pub builtin_costs: BuiltinCostModel,
}

#[derive(Deserialize)]
struct RawParams {
    machine: MachineCosts,
    builtins: BTreeMap<String, BuiltinCosts>,
}

impl MachineParams {
    /// Parses a single parameter set: `{"machine": {...}, "builtins": {...}}`.
    pub fn from_json(json: &str) -> Result<Self, CostModelError> {
        let raw: RawParams = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Latest embedded parameters for `language`.
    pub fn embedded(language: LanguageVersion) -> Result<Self, CostModelError> {
        Ok(CostModelTable::embedded()?.latest(language)?.clone())
    }

    fn from_raw(raw: RawParams) -> Result<Self, CostModelError> {
        for (location, value) in raw.machine.entries() {
            if value.mem < 0 || value.cpu < 0 {
                return Err(CostModelError::NegativeCost {
                    location: location.to_string(),
                    value: value.mem.min(value.cpu),
                });
            }
        }

        let mut builtin_costs = BuiltinCostModel::default();
        for (name, costs) in raw.builtins {
            let Ok(fun) = name.parse::<DefaultFunction>() else {
                warn!(builtin = %name, "Ignoring cost entry for unsupported builtin");
                continue;
            };
            for (resource, costing) in [("cpu", &costs.cpu), ("memory", &costs.memory)] {
                let value = costing.min_coefficient();
                if value < 0 {
                    return Err(CostModelError::NegativeCost {
                        location: format!("{name}.{resource}"),
                        value,
                    });
                }
                if let Some(position) = costing.max_argument() {
                    if position >= fun.arity() {
                        return Err(CostModelError::ArgumentOutOfRange {
                            fun,
                            position,
                            arity: fun.arity(),
                        });
                    }
                }
            }
            builtin_costs.insert(fun, costs);
        }

        Ok(MachineParams {
            machine_costs: raw.machine,
            builtin_costs,
        })
    }
}

/// Protocol version of the ledger, e.g. `9.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
        let parse = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| format!("invalid protocol version `{s}`"))
        };
        Ok(ProtocolVersion::new(parse(major)?, parse(minor)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageVersion {
    PlutusV1,
    PlutusV2,
    PlutusV3,
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LanguageVersion::PlutusV1 => "PlutusV1",
            LanguageVersion::PlutusV2 => "PlutusV2",
            LanguageVersion::PlutusV3 => "PlutusV3",
        };
        f.write_str(name)
    }
}

impl FromStr for LanguageVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "plutusv1" => Ok(LanguageVersion::PlutusV1),
            "v2" | "plutusv2" => Ok(LanguageVersion::PlutusV2),
            "v3" | "plutusv3" => Ok(LanguageVersion::PlutusV3),
            _ => Err(format!("unknown language version `{s}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CostModelEntry {
    /// First protocol version the parameters apply to.
    pub protocol: ProtocolVersion,
    pub language: LanguageVersion,
    pub params: MachineParams,
}

#[derive(Deserialize)]
struct RawEntry {
    protocol: ProtocolVersion,
    language: LanguageVersion,
    params: RawParams,
}

#[derive(Deserialize)]
struct RawTable {
    entries: Vec<RawEntry>,
}

/// Parameter sets keyed by protocol and language version.
#[derive(Debug, Clone, Default)]
pub struct CostModelTable {
    entries: Vec<CostModelEntry>,
}

impl CostModelTable {
    pub fn from_json(json: &str) -> Result<Self, CostModelError> {
        let raw: RawTable = serde_json::from_str(json)?;
        let mut entries = raw
            .entries
            .into_iter()
            .map(|entry| {
                Ok(CostModelEntry {
                    protocol: entry.protocol,
                    language: entry.language,
                    params: MachineParams::from_raw(entry.params)?,
                })
            })
            .collect::<Result<Vec<_>, CostModelError>>()?;
        entries.sort_by_key(|entry| (entry.language, entry.protocol));
        debug!(entries = entries.len(), "Loaded cost model table");
        Ok(CostModelTable { entries })
    }

    /// The table shipped with the crate.
    pub fn embedded() -> Result<Self, CostModelError> {
        Self::from_json(EMBEDDED_COST_MODELS)
    }

    pub fn entries(&self) -> &[CostModelEntry] {
        &self.entries
    }

    /// Parameters in force for `language` at `protocol`: the entry with the
    /// highest protocol version not above `protocol`.
    pub fn lookup(
        &self,
        protocol: ProtocolVersion,
        language: LanguageVersion,
    ) -> Result<&MachineParams, CostModelError> {
        self.entries
            .iter()
            .filter(|entry| entry.language == language && entry.protocol <= protocol)
            .max_by_key(|entry| entry.protocol)
            .map(|entry| &entry.params)
            .ok_or_else(|| CostModelError::NoMatchingEntry {
                language: language.to_string(),
                protocol: protocol.to_string(),
            })
    }

    /// Most recent parameters for `language`.
    pub fn latest(&self, language: LanguageVersion) -> Result<&MachineParams, CostModelError> {
        self.lookup(ProtocolVersion::new(u32::MAX, u32::MAX), language)
    }
}
