use super::{
    BranchContingencyScenario, Contingency, ContingencySet, GeneratorContingencyScenario,
};
use scopf_core::{islands, BusId, Diagnostics, IslandMap, Network, ValidationError};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Participation sums at or below this are treated as "no re-dispatch".
pub const PARTICIPATION_EPS: f64 = 1e-9;

impl ContingencySet {
    /// Validate and expand a raw contingency list.
    ///
    /// Duplicates collapse. Every reference to a branch or generator missing
    /// from `network` is reported in one [`ValidationError`].
    pub fn expand(
        network: &Network,
        contingencies: &[Contingency],
    ) -> Result<ContingencySet, ValidationError> {
        let mut diag = Diagnostics::new();
        for contingency in contingencies {
            let known = match contingency {
                Contingency::Branch(id) => network.branch(*id).is_some(),
                Contingency::Generator(id) => network.generator(*id).is_some(),
            };
            if !known {
                diag.add_error_with_entity(
                    "contingency",
                    "Contingency references an element that is not in the network",
                    &contingency.to_string(),
                );
            }
        }
        if diag.has_errors() {
            return Err(ValidationError {
                issues: diag.errors().cloned().collect(),
            });
        }

        let base_islands = islands(network, None);

        let mut branch = BTreeMap::new();
        let mut generator = BTreeMap::new();
        for contingency in contingencies {
            match *contingency {
                Contingency::Branch(id) => {
                    branch.entry(id).or_insert_with(|| BranchContingencyScenario {
                        branch: id,
                        islands: islands(network, Some(id)),
                    });
                }
                Contingency::Generator(id) => {
                    generator.entry(id).or_insert_with(|| {
                        let survivors: Vec<_> = network
                            .generators()
                            .filter(|g| g.id != id)
                            .map(|g| g.id)
                            .collect();
                        let alphas: Vec<f64> = network
                            .generators()
                            .filter(|g| g.id != id)
                            .map(|g| g.alpha)
                            .collect();
                        GeneratorContingencyScenario {
                            generator: id,
                            survivors,
                            participation: alphas.iter().sum(),
                            responders: alphas
                                .iter()
                                .filter(|a| a.abs() > PARTICIPATION_EPS)
                                .count(),
                        }
                    });
                }
            }
        }

        for scenario in branch.values() {
            if scenario.islands.count() > base_islands.count() {
                diag.add_warning_with_entity(
                    "islanding",
                    &format!(
                        "Outage splits the network into {} islands",
                        scenario.islands.count()
                    ),
                    &format!("branch {}", scenario.branch),
                );
            }
            for (buses, demand) in stranded_demand(network, &scenario.islands) {
                diag.add_warning_with_entity(
                    "islanding",
                    &format!(
                        "Buses {} carry {:.1} MW of demand with no generator attached",
                        buses, demand
                    ),
                    &format!("branch {}", scenario.branch),
                );
            }
        }
        for scenario in generator.values() {
            let entity = format!("gen {}", scenario.generator);
            if !scenario.has_survivors() {
                diag.add_warning_with_entity(
                    "participation",
                    "No surviving generator can absorb the lost output",
                    &entity,
                );
            } else if scenario.participation.abs() <= PARTICIPATION_EPS {
                diag.add_warning_with_entity(
                    "participation",
                    "Surviving participation factors sum to zero; dispatch cannot respond",
                    &entity,
                );
            }
        }
        diag.log_warnings();

        let set = ContingencySet {
            base_islands,
            branch,
            generator,
            diagnostics: diag,
        };
        info!(
            branch = set.branch.len(),
            generator = set.generator.len(),
            requested = contingencies.len(),
            "contingency scenarios expanded"
        );
        debug!(warnings = set.diagnostics.warning_count(), "expansion findings");
        Ok(set)
    }
}

/// Islands with positive demand and no generator, as a bus list and their
/// total demand (MW).
fn stranded_demand(network: &Network, islands: &IslandMap) -> Vec<(String, f64)> {
    let mut fed = vec![false; islands.count()];
    for gen in network.generators() {
        if let Some(island) = islands.island_of(gen.id.bus) {
            fed[island] = true;
        }
    }
    fed.iter()
        .enumerate()
        .filter(|&(_, &has_gen)| !has_gen)
        .filter_map(|(island, _)| {
            let buses: Vec<BusId> = islands.members(island).collect();
            let demand: f64 = buses.iter().map(|&bus| network.demand(bus).value()).sum();
            (demand > 0.0).then(|| {
                let names: Vec<String> = buses.iter().map(ToString::to_string).collect();
                (names.join(", "), demand)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopf_core::{Branch, BranchId, Gen, GenId, NetworkBuilder};

    fn network() -> Network {
        NetworkBuilder::new()
            .bus_count(3)
            .branch(Branch::new(1, 2, 1, 0.1))
            .branch(Branch::new(2, 3, 1, 0.1))
            .branch(Branch::new(1, 3, 1, 0.1))
            .generator(Gen::new(1, 1).with_limits(0.0, 100.0).with_participation(0.5))
            .generator(Gen::new(2, 1).with_limits(0.0, 100.0).with_participation(0.3))
            .generator(Gen::new(3, 1).with_limits(0.0, 100.0).with_participation(0.2))
            .demand(2, 40.0)
            .build()
            .unwrap()
    }

    #[test]
    fn duplicates_collapse() {
        let set = ContingencySet::expand(
            &network(),
            &[
                Contingency::branch(1, 2, 1),
                Contingency::branch(1, 2, 1),
                Contingency::generator(3, 1),
                Contingency::generator(3, 1),
            ],
        )
        .unwrap();
        assert_eq!(set.branch.len(), 1);
        assert_eq!(set.generator.len(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn survivors_exclude_failed_unit() {
        let set = ContingencySet::expand(&network(), &[Contingency::generator(1, 1)]).unwrap();
        let scenario = &set.generator[&GenId::new(1, 1)];
        assert_eq!(scenario.survivors, [GenId::new(2, 1), GenId::new(3, 1)]);
        assert!((scenario.participation - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unknown_references_fail_together() {
        let err = ContingencySet::expand(
            &network(),
            &[
                Contingency::branch(2, 1, 1),
                Contingency::generator(9, 1),
                Contingency::branch(1, 2, 1),
            ],
        )
        .unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.has_category("contingency"));
    }

    #[test]
    fn sole_generator_has_no_survivors() {
        let network = NetworkBuilder::new()
            .bus_count(2)
            .branch(Branch::new(1, 2, 1, 0.1))
            .generator(Gen::new(1, 1).with_limits(0.0, 100.0).with_participation(1.0))
            .build()
            .unwrap();
        let set = ContingencySet::expand(&network, &[Contingency::generator(1, 1)]).unwrap();
        assert!(!set.generator[&GenId::new(1, 1)].has_survivors());
        assert_eq!(set.diagnostics.warning_count(), 1);
    }

    #[test]
    fn radial_outage_is_flagged() {
        let network = NetworkBuilder::new()
            .bus_count(3)
            .branch(Branch::new(1, 2, 1, 0.1))
            .branch(Branch::new(2, 3, 1, 0.1))
            .generator(Gen::new(1, 1).with_limits(0.0, 100.0).with_participation(1.0))
            .demand(3, 15.0)
            .build()
            .unwrap();
        let set = ContingencySet::expand(&network, &[Contingency::branch(2, 3, 1)]).unwrap();
        let scenario = &set.branch[&BranchId::new(2, 3, 1)];
        assert_eq!(scenario.islands.count(), 2);

        let messages: Vec<_> = set
            .diagnostics
            .warnings()
            .filter(|w| w.category == "islanding")
            .map(|w| w.message.as_str())
            .collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[1],
            "Buses 3 carry 15.0 MW of demand with no generator attached"
        );
    }

    #[test]
    fn empty_island_is_not_stranded() {
        let network = NetworkBuilder::new()
            .bus_count(3)
            .branch(Branch::new(1, 2, 1, 0.1))
            .branch(Branch::new(2, 3, 1, 0.1))
            .generator(Gen::new(1, 1).with_limits(0.0, 100.0).with_participation(1.0))
            .demand(2, 15.0)
            .build()
            .unwrap();
        let set = ContingencySet::expand(&network, &[Contingency::branch(2, 3, 1)]).unwrap();
        assert_eq!(set.diagnostics.warning_count(), 1);
    }

    #[test]
    fn cancelling_factors_still_respond() {
        let network = NetworkBuilder::new()
            .bus_count(1)
            .generator(Gen::new(1, 1).with_limits(0.0, 100.0).with_participation(1.0))
            .generator(Gen::new(1, 2).with_limits(0.0, 100.0).with_participation(-1.0))
            .generator(Gen::new(1, 3).with_limits(0.0, 100.0))
            .build()
            .unwrap();
        let set = ContingencySet::expand(&network, &[Contingency::generator(1, 3)]).unwrap();
        let scenario = &set.generator[&GenId::new(1, 3)];
        assert_eq!(scenario.responders, 2);
        assert!(scenario.participation.abs() <= PARTICIPATION_EPS);
        assert!(scenario.can_respond());
        assert!(set.diagnostics.warnings().any(|w| w.category == "participation"));
    }

    #[test]
    fn idle_survivors_do_not_respond() {
        let network = NetworkBuilder::new()
            .bus_count(1)
            .generator(Gen::new(1, 1).with_limits(0.0, 100.0))
            .generator(Gen::new(1, 2).with_limits(0.0, 100.0).with_participation(1.0))
            .build()
            .unwrap();
        let set = ContingencySet::expand(&network, &[Contingency::generator(1, 2)]).unwrap();
        let scenario = &set.generator[&GenId::new(1, 2)];
        assert!(scenario.has_survivors());
        assert!(!scenario.can_respond());
    }

    #[test]
    fn empty_list_is_valid() {
        let set = ContingencySet::expand(&network(), &[]).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.base_islands.count(), 1);
    }
}
