//! Solver-facing snapshot of the network.
//!
//! Copies the attributes the LP needs out of the [`Network`] so the model can
//! be built without holding a borrow while results are written back.

use super::SolveError;
use lopf_core::{
    Dispatch, Extendable, GenId, LineId, LinkDispatch, LinkId, Network, Series, Snapshot,
    StorageId,
};
use std::collections::HashSet;

/// LOPF configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LopfOptions {
    pub link_dispatch: LinkDispatch,
    /// Overrides the network's `co2_limit` when set
    pub co2_limit: Option<f64>,
}

impl Default for LopfOptions {
    fn default() -> Self {
        Self {
            link_dispatch: LinkDispatch::Optimised,
            co2_limit: None,
        }
    }
}

/// Fixed rating or expansion bounds.
#[derive(Debug, Clone, Copy)]
pub(super) enum Capacity {
    Fixed(f64),
    Extendable(Extendable),
}

impl Capacity {
    fn from_parts(fixed: f64, ext: Option<Extendable>) -> Self {
        match ext {
            Some(ext) => Capacity::Extendable(ext),
            None => Capacity::Fixed(fixed),
        }
    }
}

#[derive(Debug)]
pub(super) struct GenData {
    pub id: GenId,
    pub bus: usize,
    pub capacity: Capacity,
    pub capital_cost: f64,
    pub marginal_cost: f64,
    /// t CO2 per MWh electrical
    pub emission_intensity: f64,
    /// Per-snapshot availability; `None` for flexible units
    pub p_max_pu: Option<Vec<f64>>,
}

#[derive(Debug)]
pub(super) struct StorageData {
    pub id: StorageId,
    pub bus: usize,
    pub capacity: Capacity,
    pub capital_cost: f64,
    pub marginal_cost: f64,
    pub p_max_pu: f64,
    pub p_min_pu: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    pub standing_loss: f64,
    pub max_hours: f64,
    pub initial_soc: f64,
}

#[derive(Debug)]
pub(super) struct LineData {
    pub id: LineId,
    pub bus0: usize,
    pub bus1: usize,
    pub susceptance: f64,
    pub capacity: Capacity,
    pub capital_cost: f64,
}

#[derive(Debug)]
pub(super) struct LinkData {
    pub id: LinkId,
    pub bus0: usize,
    pub bus1: usize,
    pub p_min: f64,
    pub p_max: f64,
    pub capacity: Capacity,
    pub capital_cost: f64,
    /// Present when the link follows its schedule
    pub schedule: Option<Vec<f64>>,
}

/// Everything the LP formulation reads.
#[derive(Debug)]
pub(super) struct ProblemData {
    pub n_bus: usize,
    /// Angle reference per bus
    pub is_slack: Vec<bool>,
    /// Demand per bus and snapshot, `[bus][t]`
    pub demand: Vec<Vec<f64>>,
    pub generators: Vec<GenData>,
    pub storage: Vec<StorageData>,
    pub lines: Vec<LineData>,
    pub links: Vec<LinkData>,
    pub co2_limit: Option<f64>,
}

fn values_for(
    series: &Series,
    snapshots: &[Snapshot],
    what: impl Fn() -> String,
) -> Result<Vec<f64>, SolveError> {
    snapshots
        .iter()
        .map(|s| {
            series
                .get(s)
                .ok_or_else(|| SolveError::MissingData(format!("{} at {}", what(), s)))
        })
        .collect()
}

/// Check the requested snapshots against the network horizon.
pub(super) fn check_snapshots(network: &Network, snapshots: &[Snapshot]) -> Result<(), SolveError> {
    if snapshots.is_empty() {
        return Err(SolveError::NoSnapshots);
    }
    let horizon: HashSet<&Snapshot> = network.snapshots.iter().collect();
    if let Some(unknown) = snapshots.iter().find(|s| !horizon.contains(s)) {
        return Err(SolveError::UnknownSnapshot(*unknown));
    }
    if let Some(i) = snapshots.windows(2).position(|w| w[0] >= w[1]) {
        return Err(SolveError::UnorderedSnapshots(i + 1));
    }
    Ok(())
}

/// Extract network data into solver-friendly format
pub(super) fn extract_problem_data(
    network: &Network,
    snapshots: &[Snapshot],
    options: &LopfOptions,
) -> Result<ProblemData, SolveError> {
    let n_bus = network.graph.node_count();
    if n_bus == 0 {
        return Err(SolveError::MissingData("network has no buses".into()));
    }

    let mut is_slack = vec![false; n_bus];
    for sub in &network.sub_networks {
        is_slack[sub.slack_bus.value()] = true;
    }

    let mut demand = vec![vec![0.0; snapshots.len()]; n_bus];
    for load in &network.loads {
        let values = values_for(&load.p_set, snapshots, || format!("p_set of load '{}'", load.name))?;
        for (t, v) in values.into_iter().enumerate() {
            demand[load.bus.value()][t] += v;
        }
    }

    let mut generators = Vec::with_capacity(network.generators.len());
    for gen in &network.generators {
        let p_max_pu = match gen.dispatch {
            Dispatch::Flexible => None,
            Dispatch::Variable => Some(values_for(&gen.p_max_pu, snapshots, || {
                format!("p_max_pu of generator '{}'", gen.name)
            })?),
        };
        generators.push(GenData {
            id: gen.id,
            bus: gen.bus.value(),
            capacity: Capacity::from_parts(gen.p_nom, gen.p_nom_extendable),
            capital_cost: gen.capital_cost,
            marginal_cost: gen.marginal_cost,
            emission_intensity: network.emission_intensity(gen),
            p_max_pu,
        });
    }

    let storage = network
        .storage_units
        .iter()
        .map(|su| StorageData {
            id: su.id,
            bus: su.bus.value(),
            capacity: Capacity::from_parts(su.p_nom, su.p_nom_extendable),
            capital_cost: su.capital_cost,
            marginal_cost: su.marginal_cost,
            p_max_pu: su.p_max_pu_fixed,
            p_min_pu: su.p_min_pu_fixed,
            efficiency_store: su.efficiency_store,
            efficiency_dispatch: su.efficiency_dispatch,
            standing_loss: su.standing_loss,
            max_hours: su.max_hours,
            initial_soc: su.state_of_charge.get(&snapshots[0]).unwrap_or(0.0),
        })
        .collect();

    let lines = network
        .lines()
        .map(|line| LineData {
            id: line.id,
            bus0: line.bus0.value(),
            bus1: line.bus1.value(),
            susceptance: 1.0 / line.x,
            capacity: Capacity::from_parts(line.s_nom, line.s_nom_extendable),
            capital_cost: line.capital_cost,
        })
        .collect();

    let mut links = Vec::new();
    for link in network.transport_links() {
        let schedule = match options.link_dispatch {
            LinkDispatch::Optimised => None,
            LinkDispatch::Scheduled => Some(values_for(&link.p_set, snapshots, || {
                format!("p_set of transport link '{}'", link.name)
            })?),
        };
        links.push(LinkData {
            id: link.id,
            bus0: link.bus0.value(),
            bus1: link.bus1.value(),
            p_min: link.p_min,
            p_max: link.p_max,
            capacity: Capacity::from_parts(link.s_nom, link.s_nom_extendable),
            capital_cost: link.capital_cost,
            schedule,
        });
    }

    Ok(ProblemData {
        n_bus,
        is_slack,
        demand,
        generators,
        storage,
        lines,
        links,
        co2_limit: options.co2_limit.or(network.co2_limit),
    })
}
