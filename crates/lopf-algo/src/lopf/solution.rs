//! LOPF results.

use super::problem::{Capacity, ProblemData};
use lopf_core::{BusId, Network, Snapshot};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LopfStatus {
    Optimal,
    /// Solver stopped at its reduced-accuracy tolerances
    AlmostOptimal,
}

impl fmt::Display for LopfStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LopfStatus::Optimal => write!(f, "optimal"),
            LopfStatus::AlmostOptimal => write!(f, "almost optimal"),
        }
    }
}

/// Outcome of a successful solve; per-element results live on the network.
#[derive(Debug, Clone, Serialize)]
pub struct LopfSummary {
    pub status: LopfStatus,
    /// Capital plus operating cost
    pub objective: f64,
    /// Total CO2 emitted over the solved snapshots (t)
    pub emissions: f64,
    pub co2_limit: Option<f64>,
    pub snapshots: Vec<Snapshot>,
    pub num_variables: usize,
    pub num_constraints: usize,
    pub solve_time: Duration,
}

impl LopfSummary {
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("LOPF Solution Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Status: {}\n", self.status));
        s.push_str(&format!("Objective: {:.2}\n", self.objective));
        match self.co2_limit {
            Some(limit) => s.push_str(&format!(
                "Emissions: {:.2} t (cap {:.2} t)\n",
                self.emissions, limit
            )),
            None => s.push_str(&format!("Emissions: {:.2} t (uncapped)\n", self.emissions)),
        }
        s.push_str(&format!(
            "Model: {} variables, {} constraints, {} snapshots\n",
            self.num_variables,
            self.num_constraints,
            self.snapshots.len()
        ));
        s.push_str(&format!("Solve time: {:.2?}\n", self.solve_time));
        s
    }
}

/// Primal values in the order of [`ProblemData`]; `[element][t]` for series.
#[derive(Debug)]
pub(super) struct RawSolution {
    pub status: LopfStatus,
    pub gen_capacity: Vec<f64>,
    pub gen_p: Vec<Vec<f64>>,
    pub storage_capacity: Vec<f64>,
    pub storage_store: Vec<Vec<f64>>,
    pub storage_dispatch: Vec<Vec<f64>>,
    /// Energy level at the end of each snapshot
    pub storage_soc: Vec<Vec<f64>>,
    pub line_capacity: Vec<f64>,
    pub line_flow: Vec<Vec<f64>>,
    pub link_capacity: Vec<f64>,
    pub link_flow: Vec<Vec<f64>>,
    pub num_variables: usize,
    pub num_constraints: usize,
}

fn capital(capacity: &Capacity, value: f64, cost: f64) -> f64 {
    match capacity {
        Capacity::Extendable(_) => cost * value,
        Capacity::Fixed(_) => 0.0,
    }
}

fn opt(capacity: &Capacity, value: f64) -> Option<f64> {
    match capacity {
        Capacity::Extendable(_) => Some(value),
        Capacity::Fixed(_) => None,
    }
}

impl RawSolution {
    pub fn emissions(&self, data: &ProblemData) -> f64 {
        data.generators
            .iter()
            .zip(&self.gen_p)
            .map(|(gen, p)| gen.emission_intensity * p.iter().sum::<f64>())
            .sum()
    }

    pub fn objective(&self, data: &ProblemData) -> f64 {
        let mut total = 0.0;
        for (i, gen) in data.generators.iter().enumerate() {
            total += capital(&gen.capacity, self.gen_capacity[i], gen.capital_cost);
            total += gen.marginal_cost * self.gen_p[i].iter().sum::<f64>();
        }
        for (i, su) in data.storage.iter().enumerate() {
            total += capital(&su.capacity, self.storage_capacity[i], su.capital_cost);
            total += su.marginal_cost * self.storage_dispatch[i].iter().sum::<f64>();
        }
        for (i, line) in data.lines.iter().enumerate() {
            total += capital(&line.capacity, self.line_capacity[i], line.capital_cost);
        }
        for (i, link) in data.links.iter().enumerate() {
            total += capital(&link.capacity, self.link_capacity[i], link.capital_cost);
        }
        total
    }

    /// Populate result series and optimised capacities on the network,
    /// replacing those of any earlier solve.
    pub fn write_into(&self, network: &mut Network, data: &ProblemData, snapshots: &[Snapshot]) {
        network.clear_results(snapshots.first());
        let mut injection = vec![vec![0.0; snapshots.len()]; data.n_bus];

        for load in network.loads.iter_mut() {
            for (t, s) in snapshots.iter().enumerate() {
                let demand = load.p_set.get(s).unwrap_or(0.0);
                load.p.insert(*s, demand);
                injection[load.bus.value()][t] -= demand;
            }
        }

        for (i, gen) in data.generators.iter().enumerate() {
            let Some(target) = network.generators.get_mut(gen.id.value()) else {
                continue;
            };
            target.p_nom_opt = opt(&gen.capacity, self.gen_capacity[i]);
            for (t, s) in snapshots.iter().enumerate() {
                let p = self.gen_p[i][t];
                target.p.insert(*s, p);
                injection[gen.bus][t] += p;
            }
        }

        for (i, su) in data.storage.iter().enumerate() {
            let Some(target) = network.storage_units.get_mut(su.id.value()) else {
                continue;
            };
            target.p_nom_opt = opt(&su.capacity, self.storage_capacity[i]);
            target.state_of_charge.insert(snapshots[0], su.initial_soc);
            for (t, s) in snapshots.iter().enumerate() {
                let store = self.storage_store[i][t];
                let dispatch = self.storage_dispatch[i][t];
                target.p_store.insert(*s, store);
                target.p_dispatch.insert(*s, dispatch);
                target.p.insert(*s, dispatch - store);
                injection[su.bus][t] += dispatch - store;
                if let Some(next) = snapshots.get(t + 1) {
                    target.state_of_charge.insert(*next, self.storage_soc[i][t]);
                }
            }
            target.final_state_of_charge = self.storage_soc[i].last().copied();
        }

        for (i, line) in data.lines.iter().enumerate() {
            let Some(target) = network.line_mut(line.id) else {
                continue;
            };
            target.s_nom_opt = opt(&line.capacity, self.line_capacity[i]);
            for (t, s) in snapshots.iter().enumerate() {
                let f = self.line_flow[i][t];
                target.p0.insert(*s, f);
                target.p1.insert(*s, -f);
            }
        }

        for (i, link) in data.links.iter().enumerate() {
            let Some(target) = network.transport_link_mut(link.id) else {
                continue;
            };
            target.s_nom_opt = opt(&link.capacity, self.link_capacity[i]);
            for (t, s) in snapshots.iter().enumerate() {
                let q = self.link_flow[i][t];
                target.p0.insert(*s, q);
                target.p1.insert(*s, -q);
                injection[link.bus0][t] -= q;
                injection[link.bus1][t] += q;
            }
        }

        for (b, values) in injection.iter().enumerate() {
            if let Some(bus) = network.bus_mut(BusId::new(b)) {
                for (s, v) in snapshots.iter().zip(values) {
                    bus.p.insert(*s, *v);
                }
            }
        }
    }
}
