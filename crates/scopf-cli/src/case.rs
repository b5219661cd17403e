//! JSON case files: one network snapshot plus its contingency list.
//!
//! ```json
//! {
//!   "buses": [{ "id": 1 }, { "id": 2 }],
//!   "branches": [{ "from": 1, "to": 2, "reactance": 0.1, "flow_min": -100, "flow_max": 100 }],
//!   "generators": [{ "bus": 1, "pmin": 0, "pmax": 200, "cost": 10, "alpha": 1 }],
//!   "demand": { "2": 50 },
//!   "contingencies": { "branches": ["1-2-1"], "generators": ["1-1"] }
//! }
//! ```
//!
//! Omitted flow limits mean the branch is unlimited in that direction.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use scopf_algo::Contingency;
use scopf_core::{Branch, BranchId, Bus, BusId, Gen, GenId, Megawatts, Network, ValidationError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BusRecord {
    pub id: usize,
    pub name: Option<String>,
    #[serde(default)]
    pub demand: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRecord {
    pub from: usize,
    pub to: usize,
    #[serde(default = "default_index")]
    pub circuit: usize,
    pub name: Option<String>,
    pub reactance: f64,
    pub flow_min: Option<f64>,
    pub flow_max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenRecord {
    pub bus: usize,
    #[serde(default = "default_index")]
    pub unit: usize,
    pub name: Option<String>,
    pub pmin: f64,
    pub pmax: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub alpha: f64,
}

fn default_index() -> usize {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContingencyRecords {
    #[serde(default)]
    pub branches: Vec<BranchId>,
    #[serde(default)]
    pub generators: Vec<GenId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseFile {
    pub buses: Vec<BusRecord>,
    #[serde(default)]
    pub branches: Vec<BranchRecord>,
    #[serde(default)]
    pub generators: Vec<GenRecord>,
    /// Extra demand per bus, added to each bus record's own
    #[serde(default)]
    pub demand: BTreeMap<usize, f64>,
    #[serde(default)]
    pub contingencies: ContingencyRecords,
}

impl CaseFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading case file {}", path.display()))?;
        let case: CaseFile = serde_json::from_str(&contents)
            .with_context(|| format!("parsing case file {}", path.display()))?;
        Ok(case)
    }

    pub fn network(&self) -> Result<Network, ValidationError> {
        let buses = self.buses.iter().map(|record| {
            let mut bus = Bus::new(record.id).with_demand(record.demand);
            if let Some(name) = &record.name {
                bus.name = name.clone();
            }
            bus
        });
        let branches = self.branches.iter().map(|record| {
            let branch = Branch::new(record.from, record.to, record.circuit, record.reactance)
                .with_limits(
                    record.flow_min.unwrap_or(f64::NEG_INFINITY),
                    record.flow_max.unwrap_or(f64::INFINITY),
                );
            match &record.name {
                Some(name) => branch.with_name(name.clone()),
                None => branch,
            }
        });
        let generators = self.generators.iter().map(|record| {
            let gen = Gen::new(record.bus, record.unit)
                .with_limits(record.pmin, record.pmax)
                .with_cost(record.cost)
                .with_participation(record.alpha);
            match &record.name {
                Some(name) => gen.with_name(name.clone()),
                None => gen,
            }
        });
        let demand = self
            .demand
            .iter()
            .map(|(&bus, &mw)| (BusId::new(bus), Megawatts(mw)));

        Network::build(buses, branches, generators, demand)
    }

    /// Branch outages first, then generator outages, in file order.
    pub fn contingency_list(&self) -> Vec<Contingency> {
        self.contingencies
            .branches
            .iter()
            .map(|&id| Contingency::Branch(id))
            .chain(
                self.contingencies
                    .generators
                    .iter()
                    .map(|&id| Contingency::Generator(id)),
            )
            .collect()
    }
}
