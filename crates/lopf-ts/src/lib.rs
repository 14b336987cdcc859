//! Synthetic time series for demo networks.
//!
//! Draws load, wind availability and transport schedules from a seeded
//! [`StdRng`]. Draws happen in a fixed order (loads, wind, links; row by row
//! over snapshots) so a given seed always reproduces the same inputs.

use lopf_core::{source_is, Network, Series, Snapshot};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;
use tracing::debug;

/// Value ranges for the synthetic series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRanges {
    /// Loads are uniform in `[0, load_max)` MW
    pub load_max: f64,
    /// Transport schedules are uniform in `[-amplitude, amplitude)` MW
    pub transport_amplitude: f64,
}

impl Default for SeriesRanges {
    fn default() -> Self {
        Self {
            load_max: 1000.0,
            transport_amplitude: 100.0,
        }
    }
}

/// Seeded pseudo-random source shared by network construction and series synthesis.
#[derive(Debug, Clone)]
pub struct SeriesGenerator {
    rng: StdRng,
}

impl SeriesGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform sample in `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.rng.gen::<f64>()
    }

    /// Snapshot-by-column table of uniform samples, drawn row-major.
    pub fn table(
        &mut self,
        snapshots: &[Snapshot],
        columns: Vec<String>,
        low: f64,
        high: f64,
    ) -> SeriesTable {
        let rows = snapshots
            .iter()
            .map(|_| columns.iter().map(|_| self.uniform(low, high)).collect())
            .collect();
        SeriesTable {
            snapshots: snapshots.to_vec(),
            columns,
            rows,
        }
    }

    /// Demand per load, uniform in `[0, load_max)` MW.
    pub fn load_series(
        &mut self,
        snapshots: &[Snapshot],
        loads: Vec<String>,
        load_max: f64,
    ) -> SeriesTable {
        self.table(snapshots, loads, 0.0, load_max)
    }

    /// Availability per wind generator, uniform in `[0, 1)`.
    pub fn wind_series(&mut self, snapshots: &[Snapshot], generators: Vec<String>) -> SeriesTable {
        self.table(snapshots, generators, 0.0, 1.0)
    }

    /// Schedule per transport link, uniform in `[-amplitude, amplitude)` MW.
    pub fn transport_schedule(
        &mut self,
        snapshots: &[Snapshot],
        links: Vec<String>,
        amplitude: f64,
    ) -> SeriesTable {
        self.table(snapshots, links, -amplitude, amplitude)
    }
}

/// Dense table of values indexed by snapshot (rows) and element name (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub snapshots: Vec<Snapshot>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl SeriesTable {
    pub fn column(&self, name: &str) -> Option<Series> {
        let j = self.columns.iter().position(|c| c == name)?;
        Some(
            self.snapshots
                .iter()
                .zip(&self.rows)
                .map(|(s, row)| (*s, row[j]))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }
}

impl fmt::Display for SeriesTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20}", "")?;
        for column in &self.columns {
            write!(f, " {column:>10}")?;
        }
        writeln!(f)?;
        for (snapshot, row) in self.snapshots.iter().zip(&self.rows) {
            write!(f, "{:<20}", snapshot.to_string())?;
            for value in row {
                write!(f, " {value:>10.6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The three tables attached to a network by [`attach_synthetic_series`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    pub load: SeriesTable,
    pub wind: SeriesTable,
    pub transport: SeriesTable,
}

/// Draw and attach load, wind and transport series for every network snapshot.
///
/// - every load gets `p_set`
/// - every generator fed by the `wind` source gets `p_max_pu` (availability)
///   and `p_set = availability * p_nom`
/// - every transport link gets a `p_set` schedule
/// - every storage unit's state of charge is seeded with 0 at the first snapshot
pub fn attach_synthetic_series(
    network: &mut Network,
    generator: &mut SeriesGenerator,
    ranges: &SeriesRanges,
) -> SyntheticSeries {
    let snapshots = network.snapshots.clone();

    let load_names = network.loads.iter().map(|l| l.name.clone()).collect();
    let load = generator.load_series(&snapshots, load_names, ranges.load_max);
    for l in network.loads.iter_mut() {
        l.p_set = load.column(&l.name).unwrap_or_default();
    }

    let wind_names: Vec<String> = match network.source_by_name("wind") {
        Some(wind) => network
            .generators_where(source_is(wind.id))
            .into_iter()
            .map(|g| g.name.clone())
            .collect(),
        None => Vec::new(),
    };
    let wind = generator.wind_series(&snapshots, wind_names);
    for gen in network.generators.iter_mut() {
        if let Some(availability) = wind.column(&gen.name) {
            gen.p_set = availability.scaled(gen.p_nom);
            gen.p_max_pu = availability;
        }
    }

    let link_names = network.transport_links().map(|l| l.name.clone()).collect();
    let transport =
        generator.transport_schedule(&snapshots, link_names, ranges.transport_amplitude);
    for link in network.transport_links_mut() {
        link.p_set = transport.column(&link.name).unwrap_or_default();
    }

    if let Some(first) = snapshots.first() {
        for su in network.storage_units.iter_mut() {
            su.state_of_charge.insert(*first, 0.0);
        }
    }

    debug!(
        snapshots = snapshots.len(),
        loads = load.columns.len(),
        wind = wind.columns.len(),
        links = transport.columns.len(),
        "attached synthetic series"
    );

    SyntheticSeries {
        load,
        wind,
        transport,
    }
}
