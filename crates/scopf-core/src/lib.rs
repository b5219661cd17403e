//! # scopf-core: Network model for security-constrained DC-OPF
//!
//! Holds the bus, branch and generator registries of one optimization run and
//! derives the linearized (DC) branch parameters the model builder needs.
//!
//! ## Design
//!
//! - Every element is a plain typed record keyed by a typed identifier:
//!   [`BusId`], [`BranchId`] (`from`, `to`, `circuit`) and [`GenId`]
//!   (`bus`, `unit`).
//! - Registries are ordered maps, so iteration order (and therefore LP row and
//!   column order downstream) depends only on the identifiers.
//! - A [`Network`] can only be obtained through validation; once built it is
//!   immutable.
//!
//! ## Quick Start
//!
//! ```
//! use scopf_core::{Branch, Gen, NetworkBuilder};
//!
//! let network = NetworkBuilder::new()
//!     .bus_count(2)
//!     .branch(Branch::new(1, 2, 1, 0.1).with_limits(-100.0, 100.0))
//!     .generator(Gen::new(1, 1).with_limits(0.0, 200.0).with_cost(10.0))
//!     .demand(2, 50.0)
//!     .build()?;
//!
//! assert_eq!(network.stats().num_buses, 2);
//! assert_eq!(network.stats().total_demand_mw, 50.0);
//! # Ok::<(), scopf_core::ValidationError>(())
//! ```
//!
//! ## Units
//!
//! Angles are in degrees and reactance in deg/MW, so the susceptance
//! `1/x` converts an angle difference directly into MW of flow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::ValidationError;
pub use graph_utils::{islands, IslandMap};
pub use units::{Degrees, DegreesPerMw, Megawatts, MwPerDegree};

// ============================================================================
// Identifiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);

impl BusId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BusId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch identifier: endpoints plus a circuit number for parallel lines.
///
/// Serialized as `"from-to-circuit"` so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BranchId {
    pub from: BusId,
    pub to: BusId,
    pub circuit: usize,
}

impl BranchId {
    pub fn new(from: usize, to: usize, circuit: usize) -> Self {
        Self {
            from: BusId(from),
            to: BusId(to),
            circuit,
        }
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.from, self.to, self.circuit)
    }
}

impl FromStr for BranchId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [from, to, circuit] => {
                let parse = |p: &str| {
                    p.trim()
                        .parse::<usize>()
                        .map_err(|e| format!("invalid branch id '{}': {}", s, e))
                };
                Ok(BranchId::new(parse(from)?, parse(to)?, parse(circuit)?))
            }
            _ => Err(format!(
                "invalid branch id '{}': expected 'from-to-circuit'",
                s
            )),
        }
    }
}

impl From<BranchId> for String {
    fn from(id: BranchId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for BranchId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Generator identifier: host bus plus unit number.
///
/// Serialized as `"bus-unit"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GenId {
    pub bus: BusId,
    pub unit: usize,
}

impl GenId {
    pub fn new(bus: usize, unit: usize) -> Self {
        Self {
            bus: BusId(bus),
            unit,
        }
    }
}

impl fmt::Display for GenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.bus, self.unit)
    }
}

impl FromStr for GenId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((bus, unit)) => {
                let parse = |p: &str| {
                    p.trim()
                        .parse::<usize>()
                        .map_err(|e| format!("invalid generator id '{}': {}", s, e))
                };
                Ok(GenId::new(parse(bus)?, parse(unit)?))
            }
            None => Err(format!(
                "invalid generator id '{}': expected 'bus-unit'",
                s
            )),
        }
    }
}

impl From<GenId> for String {
    fn from(id: GenId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for GenId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Active power demand
    pub demand: Megawatts,
}

impl Bus {
    pub fn new(id: usize) -> Self {
        Self {
            id: BusId(id),
            name: format!("bus {}", id),
            demand: Megawatts(0.0),
        }
    }

    pub fn with_demand(mut self, demand_mw: f64) -> Self {
        self.demand = Megawatts(demand_mw);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    /// Series reactance; must be nonzero
    pub reactance: DegreesPerMw,
    /// Lower flow limit (from → to positive)
    pub flow_min: Megawatts,
    /// Upper flow limit
    pub flow_max: Megawatts,
}

impl Branch {
    /// Unlimited branch between `from` and `to`.
    pub fn new(from: usize, to: usize, circuit: usize, reactance: f64) -> Self {
        let id = BranchId::new(from, to, circuit);
        Self {
            id,
            name: format!("branch {}", id),
            reactance: DegreesPerMw(reactance),
            flow_min: Megawatts(f64::NEG_INFINITY),
            flow_max: Megawatts(f64::INFINITY),
        }
    }

    pub fn with_limits(mut self, flow_min_mw: f64, flow_max_mw: f64) -> Self {
        self.flow_min = Megawatts(flow_min_mw);
        self.flow_max = Megawatts(flow_max_mw);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn from_bus(&self) -> BusId {
        self.id.from
    }

    #[inline]
    pub fn to_bus(&self) -> BusId {
        self.id.to
    }

    /// `1 / reactance`
    #[inline]
    pub fn susceptance(&self) -> MwPerDegree {
        self.reactance.recip()
    }

    /// DC flow from → to for the given terminal angles.
    #[inline]
    pub fn flow(&self, angle_from: Degrees, angle_to: Degrees) -> Megawatts {
        self.susceptance() * (angle_from - angle_to)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gen {
    pub id: GenId,
    pub name: String,
    pub pmin: Megawatts,
    pub pmax: Megawatts,
    /// Linear cost coefficient ($/MWh)
    pub cost: f64,
    /// Participation factor used when another unit trips
    pub alpha: f64,
}

impl Gen {
    /// Zero-capacity, zero-cost unit; chain the `with_*` setters.
    pub fn new(bus: usize, unit: usize) -> Self {
        let id = GenId::new(bus, unit);
        Self {
            id,
            name: format!("gen {}", id),
            pmin: Megawatts(0.0),
            pmax: Megawatts(0.0),
            cost: 0.0,
            alpha: 0.0,
        }
    }

    pub fn with_limits(mut self, pmin_mw: f64, pmax_mw: f64) -> Self {
        self.pmin = Megawatts(pmin_mw);
        self.pmax = Megawatts(pmax_mw);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_participation(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ============================================================================
// Network
// ============================================================================

/// Counts and totals of a validated network
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_branches: usize,
    pub num_gens: usize,
    pub total_demand_mw: f64,
    pub total_capacity_mw: f64,
}

/// Validated, immutable network snapshot.
#[derive(Debug, Clone, Default)]
pub struct Network {
    buses: BTreeMap<BusId, Bus>,
    branches: BTreeMap<BranchId, Branch>,
    generators: BTreeMap<GenId, Gen>,
}

impl Network {
    /// Validate raw records and assemble a network.
    ///
    /// `demand` entries are added on top of each bus record's own demand;
    /// buses never mentioned keep 0 MW. All problems are reported together.
    pub fn build(
        buses: impl IntoIterator<Item = Bus>,
        branches: impl IntoIterator<Item = Branch>,
        generators: impl IntoIterator<Item = Gen>,
        demand: impl IntoIterator<Item = (BusId, Megawatts)>,
    ) -> Result<Self, ValidationError> {
        let mut diag = Diagnostics::new();
        let mut network = Network::default();

        for bus in buses {
            let entity = format!("bus {}", bus.id);
            if bus.id.value() == 0 {
                diag.add_error_with_entity("topology", "Bus identifiers start at 1", &entity);
            }
            if !bus.demand.is_finite() {
                diag.add_error_with_entity("parameter", "Demand is not finite", &entity);
            }
            if network.buses.contains_key(&bus.id) {
                diag.add_error_with_entity("duplicate", "Duplicate bus identifier", &entity);
                continue;
            }
            network.buses.insert(bus.id, bus);
        }

        for (bus_id, mw) in demand {
            match network.buses.get_mut(&bus_id) {
                Some(bus) if mw.is_finite() => bus.demand = bus.demand + mw,
                Some(_) => diag.add_error_with_entity(
                    "parameter",
                    "Demand is not finite",
                    &format!("bus {}", bus_id),
                ),
                None => diag.add_error_with_entity(
                    "topology",
                    "Demand references unknown bus",
                    &format!("bus {}", bus_id),
                ),
            }
        }

        for branch in branches {
            let entity = format!("branch {}", branch.id);
            for end in [branch.from_bus(), branch.to_bus()] {
                if !network.buses.contains_key(&end) {
                    diag.add_error_with_entity(
                        "topology",
                        &format!("Endpoint bus {} does not exist", end),
                        &entity,
                    );
                }
            }
            if branch.from_bus() == branch.to_bus() {
                diag.add_error_with_entity("topology", "Branch connects a bus to itself", &entity);
            }
            let x = branch.reactance.value();
            if x == 0.0 || !x.is_finite() {
                diag.add_error_with_entity(
                    "parameter",
                    &format!("Reactance must be finite and nonzero (got {})", x),
                    &entity,
                );
            }
            if branch.flow_min.value().is_nan()
                || branch.flow_max.value().is_nan()
                || branch.flow_min > branch.flow_max
            {
                diag.add_error_with_entity(
                    "parameter",
                    &format!(
                        "Flow limits are inconsistent ({} > {})",
                        branch.flow_min.value(),
                        branch.flow_max.value()
                    ),
                    &entity,
                );
            }
            if network.branches.contains_key(&branch.id) {
                diag.add_error_with_entity("duplicate", "Duplicate branch identifier", &entity);
                continue;
            }
            network.branches.insert(branch.id, branch);
        }

        for gen in generators {
            let entity = format!("gen {}", gen.id);
            if !network.buses.contains_key(&gen.id.bus) {
                diag.add_error_with_entity(
                    "topology",
                    &format!("Generator bus {} does not exist", gen.id.bus),
                    &entity,
                );
            }
            if !gen.pmin.is_finite() || !gen.pmax.is_finite() {
                diag.add_error_with_entity("parameter", "Output limits must be finite", &entity);
            } else if gen.pmin > gen.pmax {
                diag.add_error_with_entity(
                    "parameter",
                    &format!(
                        "pg_min {} exceeds pg_max {}",
                        gen.pmin.value(),
                        gen.pmax.value()
                    ),
                    &entity,
                );
            }
            if !gen.cost.is_finite() || !gen.alpha.is_finite() {
                diag.add_error_with_entity(
                    "parameter",
                    "Cost and participation factor must be finite",
                    &entity,
                );
            }
            if network.generators.contains_key(&gen.id) {
                diag.add_error_with_entity("duplicate", "Duplicate generator identifier", &entity);
                continue;
            }
            network.generators.insert(gen.id, gen);
        }

        if !diag.has_errors() {
            diag.merge(network.advisories());
        }
        ValidationError::check(diag)?;

        let stats = network.stats();
        tracing::debug!(
            buses = stats.num_buses,
            branches = stats.num_branches,
            generators = stats.num_gens,
            demand_mw = stats.total_demand_mw,
            "network validated"
        );
        Ok(network)
    }

    /// Non-fatal observations about a valid network.
    pub fn advisories(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let stats = self.stats();

        if stats.num_buses == 0 {
            diag.add_warning("structure", "Network has no buses");
        }
        if stats.num_gens == 0 {
            diag.add_warning("structure", "Network has no generators");
        }
        if stats.total_capacity_mw < stats.total_demand_mw {
            diag.add_warning(
                "capacity",
                &format!(
                    "Total generation capacity ({:.1} MW) is less than total demand ({:.1} MW)",
                    stats.total_capacity_mw, stats.total_demand_mw
                ),
            );
        }
        diag
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            num_buses: self.buses.len(),
            num_branches: self.branches.len(),
            num_gens: self.generators.len(),
            total_demand_mw: self.buses.values().map(|b| b.demand.value()).sum(),
            total_capacity_mw: self.generators.values().map(|g| g.pmax.value()).sum(),
        }
    }

    pub fn buses(&self) -> impl Iterator<Item = &Bus> {
        self.buses.values()
    }

    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    pub fn generators(&self) -> impl Iterator<Item = &Gen> {
        self.generators.values()
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.buses.get(&id)
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(&id)
    }

    pub fn generator(&self, id: GenId) -> Option<&Gen> {
        self.generators.get(&id)
    }

    /// Demand at `bus`, 0 MW when the bus carries none.
    pub fn demand(&self, bus: BusId) -> Megawatts {
        self.buses.get(&bus).map(|b| b.demand).unwrap_or_default()
    }

    /// Units connected at `bus`, ordered by unit number.
    pub fn generators_at(&self, bus: BusId) -> impl Iterator<Item = &Gen> {
        let lo = GenId { bus, unit: 0 };
        let hi = GenId {
            bus,
            unit: usize::MAX,
        };
        self.generators.range(lo..=hi).map(|(_, g)| g)
    }
}

/// Fluent front-end for [`Network::build`].
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    buses: Vec<Bus>,
    branches: Vec<Branch>,
    generators: Vec<Gen>,
    demand: Vec<(BusId, Megawatts)>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add buses `1..=count`.
    pub fn bus_count(mut self, count: usize) -> Self {
        self.buses.extend((1..=count).map(Bus::new));
        self
    }

    pub fn bus(mut self, bus: Bus) -> Self {
        self.buses.push(bus);
        self
    }

    pub fn branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn generator(mut self, gen: Gen) -> Self {
        self.generators.push(gen);
        self
    }

    pub fn demand(mut self, bus: usize, demand_mw: f64) -> Self {
        self.demand.push((BusId::new(bus), Megawatts(demand_mw)));
        self
    }

    pub fn build(self) -> Result<Network, ValidationError> {
        Network::build(self.buses, self.branches, self.generators, self.demand)
    }
}
