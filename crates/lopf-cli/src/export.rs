//! JSON run report.

use crate::report::ReportError;
use lopf_algo::{ConsistencyReport, LopfSummary};
use lopf_core::{DemoConfig, Network, Series, Snapshot};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct CapacityOutput {
    pub name: String,
    pub kind: &'static str,
    /// Installed capacity after the solve (MW)
    pub capacity: f64,
    pub extendable: bool,
}

#[derive(Debug, Serialize)]
pub struct StorageOutput {
    pub p: f64,
    pub p_store: f64,
    pub p_dispatch: f64,
    /// Energy at the start of the snapshot (MWh)
    pub state_of_charge: f64,
}

#[derive(Debug, Serialize)]
pub struct SnapshotOutput {
    pub snapshot: Snapshot,
    pub buses: BTreeMap<String, f64>,
    pub generators: BTreeMap<String, f64>,
    pub storage_units: BTreeMap<String, StorageOutput>,
    /// Flow into each line at `bus0`
    pub lines: BTreeMap<String, f64>,
    /// Flow withdrawn at `bus0` of each transport link
    pub transport_links: BTreeMap<String, f64>,
}

/// Everything a run produced, serialised by `lopf run --json`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub config: DemoConfig,
    pub summary: LopfSummary,
    pub capacities: Vec<CapacityOutput>,
    pub snapshots: Vec<SnapshotOutput>,
    pub consistency: Option<ConsistencyReport>,
}

fn at(series: &Series, kind: &str, name: &str, snapshot: &Snapshot) -> Result<f64, ReportError> {
    series.get(snapshot).ok_or_else(|| ReportError::NotSolved {
        element: format!("{kind} '{name}'"),
        snapshot: *snapshot,
    })
}

impl RunReport {
    /// Collect results for the snapshots in `summary` from a solved network.
    pub fn collect(
        config: &DemoConfig,
        network: &Network,
        summary: &LopfSummary,
        consistency: Option<ConsistencyReport>,
    ) -> Result<Self, ReportError> {
        let mut capacities = Vec::new();
        for gen in &network.generators {
            capacities.push(CapacityOutput {
                name: gen.name.clone(),
                kind: "generator",
                capacity: gen.capacity(),
                extendable: gen.p_nom_extendable.is_some(),
            });
        }
        for su in &network.storage_units {
            capacities.push(CapacityOutput {
                name: su.name.clone(),
                kind: "storage_unit",
                capacity: su.capacity(),
                extendable: su.p_nom_extendable.is_some(),
            });
        }
        for line in network.lines() {
            capacities.push(CapacityOutput {
                name: line.name.clone(),
                kind: "line",
                capacity: line.rating(),
                extendable: line.s_nom_extendable.is_some(),
            });
        }
        for link in network.transport_links() {
            capacities.push(CapacityOutput {
                name: link.name.clone(),
                kind: "transport_link",
                capacity: link.rating(),
                extendable: link.s_nom_extendable.is_some(),
            });
        }

        let mut snapshots = Vec::with_capacity(summary.snapshots.len());
        for s in &summary.snapshots {
            let mut out = SnapshotOutput {
                snapshot: *s,
                buses: BTreeMap::new(),
                generators: BTreeMap::new(),
                storage_units: BTreeMap::new(),
                lines: BTreeMap::new(),
                transport_links: BTreeMap::new(),
            };
            for bus in network.buses() {
                out.buses.insert(bus.name.clone(), at(&bus.p, "bus", &bus.name, s)?);
            }
            for gen in &network.generators {
                out.generators
                    .insert(gen.name.clone(), at(&gen.p, "generator", &gen.name, s)?);
            }
            for su in &network.storage_units {
                let kind = "storage unit";
                out.storage_units.insert(
                    su.name.clone(),
                    StorageOutput {
                        p: at(&su.p, kind, &su.name, s)?,
                        p_store: at(&su.p_store, kind, &su.name, s)?,
                        p_dispatch: at(&su.p_dispatch, kind, &su.name, s)?,
                        state_of_charge: at(&su.state_of_charge, kind, &su.name, s)?,
                    },
                );
            }
            for line in network.lines() {
                out.lines
                    .insert(line.name.clone(), at(&line.p0, "line", &line.name, s)?);
            }
            for link in network.transport_links() {
                out.transport_links.insert(
                    link.name.clone(),
                    at(&link.p0, "transport link", &link.name, s)?,
                );
            }
            snapshots.push(out);
        }

        Ok(Self {
            config: config.clone(),
            summary: summary.clone(),
            capacities,
            snapshots,
            consistency,
        })
    }
}
