//! Plain-text report of a solved demo network.
//!
//! Every section is a read-only traversal of the network written to any
//! [`io::Write`]. Sections that show a single snapshot take it as an explicit
//! argument, and fail with [`ReportError::NotSolved`] if the network carries
//! no results for it.

use lopf_algo::validation::{bus_balance, ConsistencyError};
use lopf_core::{Edge, Network, Series, Snapshot};
use lopf_ts::SeriesTable;
use std::io::{self, Write};
use tabwriter::TabWriter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{element} has no result for snapshot {snapshot} (was it solved?)")]
    NotSolved { element: String, snapshot: Snapshot },

    #[error(transparent)]
    Consistency(ConsistencyError),

    #[error("writing report: {0}")]
    Io(#[from] io::Error),
}

impl From<ConsistencyError> for ReportError {
    fn from(err: ConsistencyError) -> Self {
        match err {
            ConsistencyError::MissingResult {
                kind,
                name,
                snapshot,
            } => ReportError::NotSolved {
                element: format!("{kind} '{name}'"),
                snapshot,
            },
            other => ReportError::Consistency(other),
        }
    }
}

fn value_at(
    series: &Series,
    element: impl Fn() -> String,
    snapshot: &Snapshot,
) -> Result<f64, ReportError> {
    series.get(snapshot).ok_or_else(|| ReportError::NotSolved {
        element: element(),
        snapshot: *snapshot,
    })
}

/// Formats sections of the report for one network.
pub struct Reporter<'a> {
    network: &'a Network,
}

impl<'a> Reporter<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network }
    }

    /// Element counts, horizon and the snapshot used for single-snapshot views.
    pub fn header<W: Write>(&self, out: &mut W, current: &Snapshot) -> Result<(), ReportError> {
        writeln!(out, "{}", self.network.stats())?;
        let horizon: Vec<String> = self.network.snapshots.iter().map(|s| s.to_string()).collect();
        writeln!(out, "Snapshots: [{}]", horizon.join(", "))?;
        writeln!(out, "Current snapshot: {current}")?;
        match self.network.co2_limit {
            Some(limit) => writeln!(out, "CO2 limit: {limit} t")?,
            None => writeln!(out, "CO2 limit: none")?,
        }
        Ok(())
    }

    pub fn wind_series<W: Write>(&self, out: &mut W, wind: &SeriesTable) -> Result<(), ReportError> {
        writeln!(out, "\nWind availability (per unit):")?;
        write!(out, "{wind}")?;
        Ok(())
    }

    pub fn sub_networks<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        writeln!(out, "\nSub-networks:")?;
        for sub in &self.network.sub_networks {
            let names: Vec<&str> = sub
                .buses
                .iter()
                .filter_map(|b| self.network.bus(*b))
                .map(|b| b.name.as_str())
                .collect();
            let slack = self
                .network
                .bus(sub.slack_bus)
                .map_or("?", |b| b.name.as_str());
            writeln!(out, "  {sub}: buses [{}], slack {slack}", names.join(", "))?;
        }
        Ok(())
    }

    /// Optimised (or fixed) capacities of one-ports and branches.
    pub fn capacities<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        writeln!(out, "\nGenerator and storage capacities:\n")?;
        {
            let mut tw = TabWriter::new(&mut *out).padding(2);
            for gen in &self.network.generators {
                writeln!(tw, "Generator {}\t{:.4}", gen.name, gen.capacity())?;
            }
            for su in &self.network.storage_units {
                writeln!(tw, "StorageUnit {}\t{:.4}", su.name, su.capacity())?;
            }
            tw.flush()?;
        }

        writeln!(out, "\nBranch capacities:\n")?;
        let mut tw = TabWriter::new(&mut *out).padding(2);
        for edge in self.network.graph.edge_weights() {
            let (kind, rating) = match edge {
                Edge::Line(line) => ("Line", line.rating()),
                Edge::TransportLink(link) => ("TransportLink", link.rating()),
            };
            writeln!(tw, "{kind} {}\t{rating:.4}", edge.label())?;
        }
        tw.flush()?;
        Ok(())
    }

    /// Net injection at every bus for each snapshot, with the network total.
    pub fn bus_injections<W: Write>(
        &self,
        out: &mut W,
        snapshots: &[Snapshot],
    ) -> Result<(), ReportError> {
        for snapshot in snapshots {
            writeln!(out, "\nFor time {snapshot}:\nBus injections:")?;
            let mut tw = TabWriter::new(&mut *out).padding(2);
            let mut total = 0.0;
            for bus in self.network.buses() {
                let p = value_at(&bus.p, || format!("bus '{}'", bus.name), snapshot)?;
                total += p;
                writeln!(tw, "Bus {}\t{p:.4}", bus.name)?;
            }
            writeln!(tw, "Total:\t{total:.4}")?;
            tw.flush()?;
        }
        Ok(())
    }

    /// Power arriving at `bus1` of every branch.
    pub fn branch_flows<W: Write>(&self, out: &mut W, snapshot: &Snapshot) -> Result<(), ReportError> {
        writeln!(out, "\nBranch flows (p1) at {snapshot}:")?;
        let mut tw = TabWriter::new(&mut *out).padding(2);
        for edge in self.network.graph.edge_weights() {
            let (kind, p1) = match edge {
                Edge::Line(line) => ("Line", &line.p1),
                Edge::TransportLink(link) => ("TransportLink", &link.p1),
            };
            let value = value_at(p1, || format!("{kind} '{}'", edge.label()), snapshot)?;
            writeln!(tw, "{kind} {}\t{value:.4}", edge.label())?;
        }
        tw.flush()?;
        Ok(())
    }

    /// Bus injection against AC branch outflow, per sub-network.
    pub fn injection_cross_check<W: Write>(
        &self,
        out: &mut W,
        snapshot: &Snapshot,
    ) -> Result<(), ReportError> {
        writeln!(out, "\nComparing bus injection to branch outgoing for {snapshot}:")?;
        for sub in &self.network.sub_networks {
            writeln!(out, "\nConsidering {sub}:")?;
            for &bus_id in &sub.buses {
                let Some(bus) = self.network.bus(bus_id) else {
                    continue;
                };
                let injection = value_at(&bus.p, || format!("bus '{}'", bus.name), snapshot)?;
                let balance = bus_balance(self.network, bus_id, snapshot)?;

                writeln!(out, "\nBus {}", bus.name)?;
                writeln!(
                    out,
                    "power injection (generators - loads + transport feed-in): {injection:.4}"
                )?;
                writeln!(out, "generators - loads: {:.4}", balance.one_port)?;
                writeln!(out, "transport feed-in: {:.4}", balance.transport)?;

                for line in sub.lines.iter().filter_map(|id| self.network.line(*id)) {
                    if line.bus0 == bus_id {
                        let p0 = value_at(&line.p0, || format!("line '{}'", line.name), snapshot)?;
                        writeln!(out, "from branch: Line {} {p0:.4}", line.name)?;
                    } else if line.bus1 == bus_id {
                        let p1 = value_at(&line.p1, || format!("line '{}'", line.name), snapshot)?;
                        writeln!(out, "to branch: Line {} {p1:.4}", line.name)?;
                    }
                }
                writeln!(out, "branch injection: {:.4}", balance.branch)?;
            }
        }
        Ok(())
    }

    /// Capacity, state of charge and net dispatch of every storage unit.
    pub fn storage<W: Write>(&self, out: &mut W, snapshots: &[Snapshot]) -> Result<(), ReportError> {
        writeln!(out, "\nStorage units:")?;
        for su in &self.network.storage_units {
            writeln!(out, "\nStorageUnit {} p_nom {:.4}", su.name, su.capacity())?;
            let mut tw = TabWriter::new(&mut *out).padding(2);
            writeln!(tw, "snapshot\tstate_of_charge\tp")?;
            for snapshot in snapshots {
                let soc = value_at(
                    &su.state_of_charge,
                    || format!("storage unit '{}'", su.name),
                    snapshot,
                )?;
                let p = value_at(&su.p, || format!("storage unit '{}'", su.name), snapshot)?;
                writeln!(tw, "{snapshot}\t{soc:.4}\t{p:.4}")?;
            }
            if let Some(end) = su.final_state_of_charge {
                writeln!(tw, "end\t{end:.4}\t")?;
            }
            tw.flush()?;
        }
        Ok(())
    }

    /// Emission intensity (`co2 / efficiency`) per generator and the CO2 cap.
    pub fn emissions<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        writeln!(out, "\nEmission intensity (t/MWh):")?;
        {
            let mut tw = TabWriter::new(&mut *out).padding(2);
            for gen in &self.network.generators {
                let intensity = self.network.emission_intensity(gen);
                writeln!(tw, "Generator {}\t{intensity:.4}", gen.name)?;
            }
            tw.flush()?;
        }
        match self.network.co2_limit {
            Some(limit) => writeln!(out, "CO2 limit: {limit} t")?,
            None => writeln!(out, "CO2 limit: none")?,
        }
        Ok(())
    }

    /// Every post-solve section, in report order.
    pub fn solved_sections<W: Write>(
        &self,
        out: &mut W,
        snapshots: &[Snapshot],
        current: &Snapshot,
    ) -> Result<(), ReportError> {
        self.capacities(out)?;
        self.bus_injections(out, snapshots)?;
        self.branch_flows(out, current)?;
        self.injection_cross_check(out, current)?;
        self.storage(out, snapshots)?;
        self.emissions(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopf_algo::{demo_case, Lopf};
    use lopf_core::DemoConfig;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), ReportError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_unsolved_snapshot_is_reported() {
        let case = demo_case(&DemoConfig::default()).unwrap();
        let reporter = Reporter::new(&case.network);
        let snapshot = case.network.snapshots[0];
        let mut buf = Vec::new();
        let err = reporter.branch_flows(&mut buf, &snapshot).unwrap_err();
        assert!(matches!(err, ReportError::NotSolved { snapshot: s, .. } if s == snapshot));
        let err = reporter.injection_cross_check(&mut buf, &snapshot).unwrap_err();
        assert!(matches!(err, ReportError::NotSolved { .. }));
    }

    #[test]
    fn test_pre_solve_sections() {
        let case = demo_case(&DemoConfig::default()).unwrap();
        let reporter = Reporter::new(&case.network);
        let first = case.network.snapshots[0];
        let text = render(|out| {
            reporter.header(out, &first)?;
            reporter.wind_series(out, &case.series.wind)?;
            reporter.sub_networks(out)
        });
        assert!(text.contains("6 buses"));
        assert!(text.contains("Current snapshot: 2015-01-01 00:00:00"));
        assert!(text.contains("Wind 5"));
        assert!(text.contains("buses [0, 1, 2], slack 0"));
        assert!(text.contains("buses [3, 4, 5], slack 3"));
    }

    #[test]
    fn test_solved_sections() {
        let config = DemoConfig {
            solve_snapshot_count: 2,
            ..DemoConfig::default()
        };
        let mut case = demo_case(&config).unwrap();
        let snapshots = config.solve_snapshots();
        Lopf::new().solve(&mut case.network, &snapshots).unwrap();

        let reporter = Reporter::new(&case.network);
        let text = render(|out| reporter.solved_sections(out, &snapshots, &snapshots[1]));
        assert!(text.contains("Generator and storage capacities:"));
        assert!(text.contains("TransportLink TL 1"));
        assert!(text.contains("For time 2015-01-01 01:00:00:"));
        assert!(text.contains("Considering SubNetwork 1"));
        assert!(text.contains("branch injection:"));
        assert!(text.contains("Generator Gas 0"));
        assert!(text.contains("0.6857"));
        assert!(text.contains("CO2 limit: 1000 t"));
    }
}
