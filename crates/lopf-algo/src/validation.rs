//! Post-solve consistency checks.
//!
//! These re-derive physical invariants from the result series written by
//! [`crate::Lopf::solve`] and are used as regression checks on the solver
//! integration: nodal power balance, expansion bounds, the CO2 cap and the
//! storage energy recursion.

use lopf_core::{BusId, Extendable, LopfError, Network, Series, Snapshot};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// A violated post-solve invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("{kind} '{name}' has no result at {snapshot}")]
    MissingResult {
        kind: &'static str,
        name: String,
        snapshot: Snapshot,
    },

    #[error("{kind} '{name}' has no optimised capacity")]
    MissingCapacity { kind: &'static str, name: String },

    #[error("power imbalance of {mismatch:.6} MW at bus '{bus}' ({snapshot})")]
    PowerBalance {
        bus: String,
        snapshot: Snapshot,
        mismatch: f64,
    },

    #[error("{kind} '{name}' capacity {value:.6} outside [{min}, {max:?}]")]
    CapacityBound {
        kind: &'static str,
        name: String,
        value: f64,
        min: f64,
        max: Option<f64>,
    },

    #[error("emissions of {emissions:.3} t exceed the cap of {limit:.3} t")]
    Co2Cap { emissions: f64, limit: f64 },

    #[error("storage unit '{name}' energy balance off by {residual:.6} MWh at {snapshot}")]
    StorageBalance {
        name: String,
        snapshot: Snapshot,
        residual: f64,
    },

    #[error("storage unit '{name}' state of charge {soc:.6} MWh outside [0, {max:.6}] at {snapshot}")]
    StateOfCharge {
        name: String,
        snapshot: Snapshot,
        soc: f64,
        max: f64,
    },
}

impl From<ConsistencyError> for LopfError {
    fn from(err: ConsistencyError) -> Self {
        LopfError::Consistency(err.to_string())
    }
}

fn result_at(
    series: &Series,
    kind: &'static str,
    name: &str,
    snapshot: &Snapshot,
) -> Result<f64, ConsistencyError> {
    series.get(snapshot).ok_or_else(|| ConsistencyError::MissingResult {
        kind,
        name: name.to_string(),
        snapshot: *snapshot,
    })
}

/// Both sides of the power balance at one bus and snapshot (MW).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusBalance {
    /// Σ sign · p over generators, storage units and loads
    pub one_port: f64,
    /// Net feed-in from transport links
    pub transport: f64,
    /// Net power injected into AC lines
    pub branch: f64,
}

impl BusBalance {
    /// Injection minus what leaves through AC lines; zero when balanced.
    pub fn mismatch(&self) -> f64 {
        self.one_port + self.transport - self.branch
    }
}

/// Power balance terms at `bus` for a solved `snapshot`.
pub fn bus_balance(
    network: &Network,
    bus: BusId,
    snapshot: &Snapshot,
) -> Result<BusBalance, ConsistencyError> {
    let mut one_port = 0.0;
    for gen in network.generators_at_bus(bus) {
        one_port += gen.sign() * result_at(&gen.p, "generator", &gen.name, snapshot)?;
    }
    for su in network.storage_units_at_bus(bus) {
        one_port += su.sign() * result_at(&su.p, "storage unit", &su.name, snapshot)?;
    }
    for load in network.loads_at_bus(bus) {
        one_port += load.sign() * result_at(&load.p, "load", &load.name, snapshot)?;
    }

    let mut transport = 0.0;
    for link in network.transport_links() {
        if link.bus0 == bus {
            transport -= result_at(&link.p0, "transport link", &link.name, snapshot)?;
        }
        if link.bus1 == bus {
            transport -= result_at(&link.p1, "transport link", &link.name, snapshot)?;
        }
    }

    let mut branch = 0.0;
    for line in network.lines() {
        if line.bus0 == bus {
            branch += result_at(&line.p0, "line", &line.name, snapshot)?;
        }
        if line.bus1 == bus {
            branch += result_at(&line.p1, "line", &line.name, snapshot)?;
        }
    }

    Ok(BusBalance {
        one_port,
        transport,
        branch,
    })
}

/// Check Kirchhoff balance at every bus; returns the largest mismatch seen.
pub fn check_power_balance(
    network: &Network,
    snapshots: &[Snapshot],
    tol: f64,
) -> Result<f64, ConsistencyError> {
    let mut worst: f64 = 0.0;
    for snapshot in snapshots {
        for bus in network.buses() {
            let mismatch = bus_balance(network, bus.id, snapshot)?.mismatch();
            if mismatch.abs() > tol {
                return Err(ConsistencyError::PowerBalance {
                    bus: bus.name.clone(),
                    snapshot: *snapshot,
                    mismatch,
                });
            }
            worst = worst.max(mismatch.abs());
        }
    }
    debug!(max_mismatch = worst, "power balance holds");
    Ok(worst)
}

fn check_bound(
    kind: &'static str,
    name: &str,
    ext: &Option<Extendable>,
    opt: Option<f64>,
    tol: f64,
) -> Result<(), ConsistencyError> {
    let Some(ext) = ext else {
        return Ok(());
    };
    let value = opt.ok_or_else(|| ConsistencyError::MissingCapacity {
        kind,
        name: name.to_string(),
    })?;
    if !ext.admits(value, tol) {
        return Err(ConsistencyError::CapacityBound {
            kind,
            name: name.to_string(),
            value,
            min: ext.min,
            max: ext.max,
        });
    }
    Ok(())
}

/// Check that every optimised capacity lies within its expansion bounds.
pub fn check_capacity_bounds(network: &Network, tol: f64) -> Result<(), ConsistencyError> {
    for gen in &network.generators {
        check_bound("generator", &gen.name, &gen.p_nom_extendable, gen.p_nom_opt, tol)?;
    }
    for su in &network.storage_units {
        check_bound("storage unit", &su.name, &su.p_nom_extendable, su.p_nom_opt, tol)?;
    }
    for line in network.lines() {
        check_bound("line", &line.name, &line.s_nom_extendable, line.s_nom_opt, tol)?;
    }
    for link in network.transport_links() {
        check_bound(
            "transport link",
            &link.name,
            &link.s_nom_extendable,
            link.s_nom_opt,
            tol,
        )?;
    }
    Ok(())
}

/// Total emissions over `snapshots` (t).
pub fn total_emissions(network: &Network, snapshots: &[Snapshot]) -> Result<f64, ConsistencyError> {
    let mut total = 0.0;
    for gen in &network.generators {
        let intensity = network.emission_intensity(gen);
        if intensity == 0.0 {
            continue;
        }
        for snapshot in snapshots {
            total += intensity * result_at(&gen.p, "generator", &gen.name, snapshot)?;
        }
    }
    Ok(total)
}

/// Check the network's CO2 cap; returns total emissions.
pub fn check_co2_cap(
    network: &Network,
    snapshots: &[Snapshot],
    tol: f64,
) -> Result<f64, ConsistencyError> {
    let emissions = total_emissions(network, snapshots)?;
    if let Some(limit) = network.co2_limit {
        if emissions > limit + tol {
            return Err(ConsistencyError::Co2Cap { emissions, limit });
        }
    }
    Ok(emissions)
}

/// Check the storage energy recursion and state-of-charge bounds.
///
/// `state_of_charge` holds the level at the start of each snapshot; the level
/// after the last solved snapshot is `final_state_of_charge`.
pub fn check_storage_balance(
    network: &Network,
    snapshots: &[Snapshot],
    tol: f64,
) -> Result<(), ConsistencyError> {
    for su in &network.storage_units {
        let max = su.max_hours * su.capacity();
        for (t, snapshot) in snapshots.iter().enumerate() {
            let start = result_at(&su.state_of_charge, "storage unit", &su.name, snapshot)?;
            let end = match snapshots.get(t + 1) {
                Some(next) => result_at(&su.state_of_charge, "storage unit", &su.name, next)?,
                None => su
                    .final_state_of_charge
                    .ok_or_else(|| ConsistencyError::MissingResult {
                        kind: "storage unit",
                        name: su.name.clone(),
                        snapshot: *snapshot,
                    })?,
            };
            let store = result_at(&su.p_store, "storage unit", &su.name, snapshot)?;
            let dispatch = result_at(&su.p_dispatch, "storage unit", &su.name, snapshot)?;

            let expected = (1.0 - su.standing_loss) * start + su.efficiency_store * store
                - dispatch / su.efficiency_dispatch;
            let residual = end - expected;
            if residual.abs() > tol {
                return Err(ConsistencyError::StorageBalance {
                    name: su.name.clone(),
                    snapshot: *snapshot,
                    residual,
                });
            }
            if end < -tol || end > max + tol {
                return Err(ConsistencyError::StateOfCharge {
                    name: su.name.clone(),
                    snapshot: *snapshot,
                    soc: end,
                    max,
                });
            }
        }
    }
    Ok(())
}

/// Outcome of [`check_all`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub max_imbalance: f64,
    pub emissions: f64,
}

/// Run every post-solve check with a common tolerance.
pub fn check_all(
    network: &Network,
    snapshots: &[Snapshot],
    tol: f64,
) -> Result<ConsistencyReport, ConsistencyError> {
    let max_imbalance = check_power_balance(network, snapshots, tol)?;
    check_capacity_bounds(network, tol)?;
    let emissions = check_co2_cap(network, snapshots, tol)?;
    check_storage_balance(network, snapshots, tol)?;
    Ok(ConsistencyReport {
        max_imbalance,
        emissions,
    })
}
