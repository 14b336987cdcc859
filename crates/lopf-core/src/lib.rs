//! # lopf-core: network model for linear optimal power flow
//!
//! Provides the data structures shared by the `lopf` crates: buses, AC lines,
//! DC transport links, loads, generators, storage units and fuel sources,
//! together with snapshot-indexed time series and sub-network topology.
//!
//! ## Design
//!
//! The network is an **undirected multigraph**:
//! - **Nodes**: buses
//! - **Edges**: AC lines and DC transport links (parallel edges allowed)
//!
//! One-port elements (loads, generators, storage units) are kept in ordered
//! vectors and refer to their bus through a [`BusId`]. Every element is
//! addressed by a newtype ID and has a unique name within its kind.
//!
//! Time-varying inputs (`p_set`, `p_max_pu`, initial state of charge) and
//! optimisation results (`p`, `p0`, `p1`, `state_of_charge`, `p_nom_opt`) are
//! explicit [`Series`] fields, populated by the time-series generator and the
//! solver respectively.
//!
//! ## Quick Start
//!
//! ```rust
//! use lopf_core::*;
//!
//! let mut network = Network::new();
//! let b0 = network.add_bus("0", 380.0).unwrap();
//! let b1 = network.add_bus("1", 380.0).unwrap();
//! network.add_line(Line::new("0", b0, b1, 0.1).with_s_nom(500.0)).unwrap();
//!
//! let gas = network.add_source("gas", 0.24).unwrap();
//! network
//!     .add_generator(Generator::new("Gas 0", b0, gas).with_p_nom(1000.0))
//!     .unwrap();
//! network.add_load(Load::new("0", b1)).unwrap();
//!
//! assert_eq!(network.stats().num_buses, 2);
//! ```

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod config;
pub mod error;
pub mod series;
pub mod topology;

pub use config::{DemoConfig, LinkDispatch};
pub use error::{ConfigError, LopfError, LopfResult, NetworkError};
pub use series::{default_start, hourly_snapshots, Series, Snapshot};
pub use topology::SubNetwork;

macro_rules! newtype_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(usize);

            impl $name {
                #[inline]
                pub fn new(value: usize) -> Self {
                    $name(value)
                }
                #[inline]
                pub fn value(&self) -> usize {
                    self.0
                }
            }
        )*
    };
}

newtype_id!(BusId, LineId, LinkId, LoadId, GenId, StorageId, SourceId, SubNetworkId);

/// A network node.
#[derive(Debug, Clone)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Nominal voltage in kV
    pub v_nom: f64,
    /// Net active power injection per snapshot (result)
    pub p: Series,
}

/// Capacity expansion bounds shared by every extendable asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extendable {
    pub min: f64,
    /// `None` means no upper bound
    pub max: Option<f64>,
}

impl Extendable {
    pub fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in `[min, max]` up to `tol`.
    pub fn admits(&self, value: f64, tol: f64) -> bool {
        value >= self.min - tol && self.max.map_or(true, |max| value <= max + tol)
    }

    fn validate(&self, kind: &'static str, name: &str) -> Result<(), NetworkError> {
        let ordered = self.max.map_or(true, |max| max >= self.min);
        if !self.min.is_finite() || self.min < 0.0 || !ordered {
            return Err(NetworkError::InvalidAttribute {
                kind,
                name: name.to_string(),
                reason: format!("invalid capacity bounds [{}, {:?}]", self.min, self.max),
            });
        }
        Ok(())
    }
}

/// AC branch, modelled with a linearised (DC) flow `p0 = (θ0 - θ1) / x`.
#[derive(Debug, Clone)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub bus0: BusId,
    pub bus1: BusId,
    /// Series reactance (per-unit)
    pub x: f64,
    /// Fixed thermal rating, MVA
    pub s_nom: f64,
    /// Rating is a decision variable when set
    pub s_nom_extendable: Option<Extendable>,
    /// Annualised cost per MVA of rating
    pub capital_cost: f64,
    /// Power withdrawn from `bus0` into the line (result)
    pub p0: Series,
    /// Power withdrawn from `bus1` into the line (result)
    pub p1: Series,
    pub s_nom_opt: Option<f64>,
}

impl Line {
    pub fn new(name: impl Into<String>, bus0: BusId, bus1: BusId, x: f64) -> Self {
        Self {
            id: LineId(0),
            name: name.into(),
            bus0,
            bus1,
            x,
            s_nom: 0.0,
            s_nom_extendable: None,
            capital_cost: 0.0,
            p0: Series::new(),
            p1: Series::new(),
            s_nom_opt: None,
        }
    }

    pub fn with_s_nom(mut self, s_nom: f64) -> Self {
        self.s_nom = s_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.s_nom_extendable = Some(Extendable::new(min, max));
        self
    }

    pub fn with_capital_cost(mut self, cost: f64) -> Self {
        self.capital_cost = cost;
        self
    }

    /// Optimised rating if solved, otherwise the fixed rating.
    pub fn rating(&self) -> f64 {
        self.s_nom_opt.unwrap_or(self.s_nom)
    }
}

/// Controllable point-to-point DC connection.
///
/// Positive flow withdraws power at `bus0` and feeds it in at `bus1`. The
/// link is lossless and does not couple bus angles, so it never merges
/// sub-networks.
#[derive(Debug, Clone)]
pub struct TransportLink {
    pub id: LinkId,
    pub name: String,
    pub bus0: BusId,
    pub bus1: BusId,
    pub p_nom: f64,
    /// Lower flow bound (MW, usually negative)
    pub p_min: f64,
    /// Upper flow bound (MW)
    pub p_max: f64,
    pub s_nom: f64,
    pub s_nom_extendable: Option<Extendable>,
    pub capital_cost: f64,
    /// Scheduled transfer (MW)
    pub p_set: Series,
    pub p0: Series,
    pub p1: Series,
    pub s_nom_opt: Option<f64>,
}

impl TransportLink {
    pub fn new(name: impl Into<String>, bus0: BusId, bus1: BusId) -> Self {
        Self {
            id: LinkId(0),
            name: name.into(),
            bus0,
            bus1,
            p_nom: 0.0,
            p_min: 0.0,
            p_max: 0.0,
            s_nom: 0.0,
            s_nom_extendable: None,
            capital_cost: 0.0,
            p_set: Series::new(),
            p0: Series::new(),
            p1: Series::new(),
            s_nom_opt: None,
        }
    }

    pub fn with_p_limits(mut self, p_nom: f64, p_min: f64, p_max: f64) -> Self {
        self.p_nom = p_nom;
        self.p_min = p_min;
        self.p_max = p_max;
        self
    }

    pub fn with_s_nom(mut self, s_nom: f64) -> Self {
        self.s_nom = s_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.s_nom_extendable = Some(Extendable::new(min, max));
        self
    }

    pub fn with_capital_cost(mut self, cost: f64) -> Self {
        self.capital_cost = cost;
        self
    }

    pub fn rating(&self) -> f64 {
        self.s_nom_opt.unwrap_or(self.s_nom)
    }
}

/// Graph edge payload.
#[derive(Debug, Clone)]
pub enum Edge {
    Line(Line),
    TransportLink(TransportLink),
}

impl Edge {
    pub fn label(&self) -> &str {
        match self {
            Edge::Line(line) => &line.name,
            Edge::TransportLink(link) => &link.name,
        }
    }

    /// AC edges couple bus angles; transport links do not.
    pub fn is_ac(&self) -> bool {
        matches!(self, Edge::Line(_))
    }
}

/// Fuel type metadata.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    /// Emissions per MWh of primary energy (t/MWh)
    pub co2_emissions: f64,
}

#[derive(Debug, Clone)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    /// Demand per snapshot (MW)
    pub p_set: Series,
    /// Served demand (result)
    pub p: Series,
}

impl Load {
    pub fn new(name: impl Into<String>, bus: BusId) -> Self {
        Self {
            id: LoadId(0),
            name: name.into(),
            bus,
            p_set: Series::new(),
            p: Series::new(),
        }
    }

    pub fn sign(&self) -> f64 {
        -1.0
    }
}

/// Generator dispatch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// Output limited by `p_nom` only
    #[default]
    Flexible,
    /// Output limited by `p_max_pu[t] * p_nom` (wind, solar)
    Variable,
}

#[derive(Debug, Clone)]
pub struct Generator {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    pub source: SourceId,
    pub dispatch: Dispatch,
    pub p_nom: f64,
    pub p_nom_extendable: Option<Extendable>,
    /// Cost per MWh generated
    pub marginal_cost: f64,
    /// Annualised cost per MW of capacity
    pub capital_cost: f64,
    /// Conversion efficiency from primary energy
    pub efficiency: f64,
    /// Output set-point per snapshot (MW)
    pub p_set: Series,
    /// Per-unit availability per snapshot (variable generators)
    pub p_max_pu: Series,
    pub p: Series,
    pub p_nom_opt: Option<f64>,
}

impl Generator {
    pub fn new(name: impl Into<String>, bus: BusId, source: SourceId) -> Self {
        Self {
            id: GenId(0),
            name: name.into(),
            bus,
            source,
            dispatch: Dispatch::Flexible,
            p_nom: 0.0,
            p_nom_extendable: None,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            efficiency: 1.0,
            p_set: Series::new(),
            p_max_pu: Series::new(),
            p: Series::new(),
            p_nom_opt: None,
        }
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.p_nom_extendable = Some(Extendable::new(min, max));
        self
    }

    pub fn with_costs(mut self, marginal_cost: f64, capital_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.efficiency = efficiency;
        self
    }

    pub fn sign(&self) -> f64 {
        1.0
    }

    pub fn capacity(&self) -> f64 {
        self.p_nom_opt.unwrap_or(self.p_nom)
    }
}

#[derive(Debug, Clone)]
pub struct StorageUnit {
    pub id: StorageId,
    pub name: String,
    pub bus: BusId,
    pub source: Option<SourceId>,
    pub p_nom: f64,
    pub p_nom_extendable: Option<Extendable>,
    /// Discharge limit as a fraction of `p_nom`
    pub p_max_pu_fixed: f64,
    /// Charge limit as a (negative) fraction of `p_nom`
    pub p_min_pu_fixed: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    /// Fraction of stored energy lost per hour
    pub standing_loss: f64,
    /// Energy capacity in hours at `p_nom`
    pub max_hours: f64,
    /// Energy level at the start of each snapshot (MWh). The entry for the
    /// first solved snapshot is the initial condition.
    pub state_of_charge: Series,
    /// Energy level after the last solved snapshot (result)
    pub final_state_of_charge: Option<f64>,
    /// Net output, dispatch minus store (result)
    pub p: Series,
    pub p_store: Series,
    pub p_dispatch: Series,
    pub p_nom_opt: Option<f64>,
}

impl StorageUnit {
    pub fn new(name: impl Into<String>, bus: BusId) -> Self {
        Self {
            id: StorageId(0),
            name: name.into(),
            bus,
            source: None,
            p_nom: 0.0,
            p_nom_extendable: None,
            p_max_pu_fixed: 1.0,
            p_min_pu_fixed: -1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            standing_loss: 0.0,
            max_hours: 1.0,
            state_of_charge: Series::new(),
            final_state_of_charge: None,
            p: Series::new(),
            p_store: Series::new(),
            p_dispatch: Series::new(),
            p_nom_opt: None,
        }
    }

    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.p_nom_extendable = Some(Extendable::new(min, max));
        self
    }

    pub fn with_costs(mut self, marginal_cost: f64, capital_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_efficiencies(mut self, store: f64, dispatch: f64) -> Self {
        self.efficiency_store = store;
        self.efficiency_dispatch = dispatch;
        self
    }

    pub fn with_standing_loss(mut self, standing_loss: f64) -> Self {
        self.standing_loss = standing_loss;
        self
    }

    pub fn with_max_hours(mut self, max_hours: f64) -> Self {
        self.max_hours = max_hours;
        self
    }

    pub fn sign(&self) -> f64 {
        1.0
    }

    pub fn capacity(&self) -> f64 {
        self.p_nom_opt.unwrap_or(self.p_nom)
    }
}

/// Element counts, printed as the network header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_lines: usize,
    pub num_transport_links: usize,
    pub num_loads: usize,
    pub num_generators: usize,
    pub num_storage_units: usize,
    pub num_snapshots: usize,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Network: {} buses, {} lines, {} transport links, {} loads, {} generators, {} storage units, {} snapshots",
            self.num_buses,
            self.num_lines,
            self.num_transport_links,
            self.num_loads,
            self.num_generators,
            self.num_storage_units,
            self.num_snapshots
        )
    }
}

/// Root container for all network elements.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: UnGraph<Bus, Edge>,
    /// Ordered optimisation horizon
    pub snapshots: Vec<Snapshot>,
    /// Global cap on CO2 emissions over the solved horizon (t)
    pub co2_limit: Option<f64>,
    pub sources: Vec<Source>,
    pub loads: Vec<Load>,
    pub generators: Vec<Generator>,
    pub storage_units: Vec<StorageUnit>,
    /// Filled by [`Network::determine_network_topology`]
    pub sub_networks: Vec<SubNetwork>,
    bus_names: HashMap<String, BusId>,
}

/// Predicate selecting generators fed by `source`.
pub fn source_is(source: SourceId) -> impl Fn(&Generator) -> bool {
    move |gen| gen.source == source
}

/// Predicate selecting generators with the given dispatch mode.
pub fn dispatch_is(dispatch: Dispatch) -> impl Fn(&Generator) -> bool {
    move |gen| gen.dispatch == dispatch
}

fn ensure_unique<'a>(
    mut names: impl Iterator<Item = &'a str>,
    kind: &'static str,
    name: &str,
) -> Result<(), NetworkError> {
    if names.any(|n| n == name) {
        return Err(NetworkError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn invalid(kind: &'static str, name: &str, reason: impl Into<String>) -> NetworkError {
    NetworkError::InvalidAttribute {
        kind,
        name: name.to_string(),
        reason: reason.into(),
    }
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            num_buses: self.graph.node_count(),
            num_lines: self.lines().count(),
            num_transport_links: self.transport_links().count(),
            num_loads: self.loads.len(),
            num_generators: self.generators.len(),
            num_storage_units: self.storage_units.len(),
            num_snapshots: self.snapshots.len(),
        }
    }

    /// Replace the snapshot sequence. Timestamps must be strictly increasing.
    pub fn set_snapshots(&mut self, snapshots: Vec<Snapshot>) -> Result<(), NetworkError> {
        if let Some(i) = snapshots.windows(2).position(|w| w[0] >= w[1]) {
            return Err(NetworkError::UnorderedSnapshots(i + 1));
        }
        self.snapshots = snapshots;
        Ok(())
    }

    /// Drop every optimisation result, keeping inputs and the state of
    /// charge at `keep_soc_at` (the seeded level of the next solve).
    pub fn clear_results(&mut self, keep_soc_at: Option<&Snapshot>) {
        for bus in self.graph.node_weights_mut() {
            bus.p.clear();
        }
        for edge in self.graph.edge_weights_mut() {
            match edge {
                Edge::Line(line) => {
                    line.p0.clear();
                    line.p1.clear();
                    line.s_nom_opt = None;
                }
                Edge::TransportLink(link) => {
                    link.p0.clear();
                    link.p1.clear();
                    link.s_nom_opt = None;
                }
            }
        }
        for load in &mut self.loads {
            load.p.clear();
        }
        for gen in &mut self.generators {
            gen.p.clear();
            gen.p_nom_opt = None;
        }
        for su in &mut self.storage_units {
            let seeded = keep_soc_at.and_then(|s| su.state_of_charge.get(s).map(|v| (*s, v)));
            su.p.clear();
            su.p_store.clear();
            su.p_dispatch.clear();
            su.state_of_charge.clear();
            if let Some((s, v)) = seeded {
                su.state_of_charge.insert(s, v);
            }
            su.final_state_of_charge = None;
            su.p_nom_opt = None;
        }
    }

    // === Construction ===

    pub fn add_bus(&mut self, name: impl Into<String>, v_nom: f64) -> Result<BusId, NetworkError> {
        let name = name.into();
        if self.bus_names.contains_key(&name) {
            return Err(NetworkError::DuplicateName { kind: "bus", name });
        }
        let id = BusId(self.graph.node_count());
        self.graph.add_node(Bus {
            id,
            name: name.clone(),
            v_nom,
            p: Series::new(),
        });
        self.bus_names.insert(name, id);
        self.sub_networks.clear();
        Ok(id)
    }

    pub fn add_source(
        &mut self,
        name: impl Into<String>,
        co2_emissions: f64,
    ) -> Result<SourceId, NetworkError> {
        let name = name.into();
        ensure_unique(self.sources.iter().map(|s| s.name.as_str()), "source", &name)?;
        if !co2_emissions.is_finite() || co2_emissions < 0.0 {
            return Err(invalid("source", &name, "co2_emissions must be non-negative"));
        }
        let id = SourceId(self.sources.len());
        self.sources.push(Source {
            id,
            name,
            co2_emissions,
        });
        Ok(id)
    }

    pub fn add_line(&mut self, mut line: Line) -> Result<LineId, NetworkError> {
        ensure_unique(self.lines().map(|l| l.name.as_str()), "line", &line.name)?;
        let (a, b) = self.endpoints("line", &line.name, line.bus0, line.bus1)?;
        if !line.x.is_finite() || line.x.abs() < 1e-12 {
            return Err(invalid("line", &line.name, "reactance must be non-zero"));
        }
        if let Some(ext) = &line.s_nom_extendable {
            ext.validate("line", &line.name)?;
        }
        let id = LineId(self.graph.edge_count());
        line.id = id;
        self.graph.add_edge(a, b, Edge::Line(line));
        self.sub_networks.clear();
        Ok(id)
    }

    pub fn add_transport_link(&mut self, mut link: TransportLink) -> Result<LinkId, NetworkError> {
        ensure_unique(
            self.transport_links().map(|l| l.name.as_str()),
            "transport link",
            &link.name,
        )?;
        let (a, b) = self.endpoints("transport link", &link.name, link.bus0, link.bus1)?;
        if link.p_min > link.p_max {
            return Err(invalid("transport link", &link.name, "p_min exceeds p_max"));
        }
        if let Some(ext) = &link.s_nom_extendable {
            ext.validate("transport link", &link.name)?;
        }
        let id = LinkId(self.graph.edge_count());
        link.id = id;
        self.graph.add_edge(a, b, Edge::TransportLink(link));
        Ok(id)
    }

    pub fn add_load(&mut self, mut load: Load) -> Result<LoadId, NetworkError> {
        ensure_unique(self.loads.iter().map(|l| l.name.as_str()), "load", &load.name)?;
        self.check_bus("load", &load.name, load.bus)?;
        let id = LoadId(self.loads.len());
        load.id = id;
        self.loads.push(load);
        Ok(id)
    }

    pub fn add_generator(&mut self, mut gen: Generator) -> Result<GenId, NetworkError> {
        ensure_unique(
            self.generators.iter().map(|g| g.name.as_str()),
            "generator",
            &gen.name,
        )?;
        self.check_bus("generator", &gen.name, gen.bus)?;
        self.check_source("generator", &gen.name, gen.source)?;
        if !(gen.efficiency > 0.0) {
            return Err(invalid("generator", &gen.name, "efficiency must be positive"));
        }
        if let Some(ext) = &gen.p_nom_extendable {
            ext.validate("generator", &gen.name)?;
        }
        let id = GenId(self.generators.len());
        gen.id = id;
        self.generators.push(gen);
        Ok(id)
    }

    pub fn add_storage_unit(&mut self, mut su: StorageUnit) -> Result<StorageId, NetworkError> {
        ensure_unique(
            self.storage_units.iter().map(|s| s.name.as_str()),
            "storage unit",
            &su.name,
        )?;
        self.check_bus("storage unit", &su.name, su.bus)?;
        if let Some(source) = su.source {
            self.check_source("storage unit", &su.name, source)?;
        }
        if !(su.efficiency_store > 0.0 && su.efficiency_dispatch > 0.0) {
            return Err(invalid("storage unit", &su.name, "efficiencies must be positive"));
        }
        if !(0.0..1.0).contains(&su.standing_loss) {
            return Err(invalid("storage unit", &su.name, "standing_loss must lie in [0, 1)"));
        }
        if let Some(ext) = &su.p_nom_extendable {
            ext.validate("storage unit", &su.name)?;
        }
        let id = StorageId(self.storage_units.len());
        su.id = id;
        self.storage_units.push(su);
        Ok(id)
    }

    fn check_bus(&self, kind: &'static str, name: &str, bus: BusId) -> Result<NodeIndex, NetworkError> {
        let idx = NodeIndex::new(bus.value());
        if self.graph.node_weight(idx).is_none() {
            return Err(NetworkError::UnknownBus {
                kind,
                name: name.to_string(),
                bus: bus.value().to_string(),
            });
        }
        Ok(idx)
    }

    fn check_source(&self, kind: &'static str, name: &str, source: SourceId) -> Result<(), NetworkError> {
        if self.sources.get(source.value()).is_none() {
            return Err(NetworkError::UnknownSource {
                kind,
                name: name.to_string(),
                source_name: source.value().to_string(),
            });
        }
        Ok(())
    }

    fn endpoints(
        &self,
        kind: &'static str,
        name: &str,
        bus0: BusId,
        bus1: BusId,
    ) -> Result<(NodeIndex, NodeIndex), NetworkError> {
        let a = self.check_bus(kind, name, bus0)?;
        let b = self.check_bus(kind, name, bus1)?;
        if a == b {
            return Err(invalid(kind, name, "bus0 and bus1 must differ"));
        }
        Ok((a, b))
    }

    // === Lookup ===

    pub fn bus_id(&self, name: &str) -> Option<BusId> {
        self.bus_names.get(name).copied()
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.graph.node_weight(NodeIndex::new(id.value()))
    }

    pub fn bus_mut(&mut self, id: BusId) -> Option<&mut Bus> {
        self.graph.node_weight_mut(NodeIndex::new(id.value()))
    }

    pub fn buses(&self) -> impl Iterator<Item = &Bus> {
        self.graph.node_weights()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.graph.edge_weights().filter_map(|e| match e {
            Edge::Line(line) => Some(line),
            Edge::TransportLink(_) => None,
        })
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        match self.graph.edge_weight(EdgeIndex::new(id.value())) {
            Some(Edge::Line(line)) => Some(line),
            _ => None,
        }
    }

    pub fn line_mut(&mut self, id: LineId) -> Option<&mut Line> {
        match self.graph.edge_weight_mut(EdgeIndex::new(id.value())) {
            Some(Edge::Line(line)) => Some(line),
            _ => None,
        }
    }

    pub fn transport_links(&self) -> impl Iterator<Item = &TransportLink> {
        self.graph.edge_weights().filter_map(|e| match e {
            Edge::TransportLink(link) => Some(link),
            Edge::Line(_) => None,
        })
    }

    pub fn transport_link(&self, id: LinkId) -> Option<&TransportLink> {
        match self.graph.edge_weight(EdgeIndex::new(id.value())) {
            Some(Edge::TransportLink(link)) => Some(link),
            _ => None,
        }
    }

    pub fn transport_link_mut(&mut self, id: LinkId) -> Option<&mut TransportLink> {
        match self.graph.edge_weight_mut(EdgeIndex::new(id.value())) {
            Some(Edge::TransportLink(link)) => Some(link),
            _ => None,
        }
    }

    pub fn transport_links_mut(&mut self) -> impl Iterator<Item = &mut TransportLink> {
        self.graph.edge_weights_mut().filter_map(|e| match e {
            Edge::TransportLink(link) => Some(link),
            Edge::Line(_) => None,
        })
    }

    pub fn source(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id.value())
    }

    pub fn source_by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Typed attribute filter over the generator collection.
    pub fn generators_where<F>(&self, pred: F) -> Vec<&Generator>
    where
        F: Fn(&Generator) -> bool,
    {
        self.generators.iter().filter(|g| pred(g)).collect()
    }

    pub fn generators_at_bus(&self, bus: BusId) -> Vec<&Generator> {
        self.generators_where(|g| g.bus == bus)
    }

    pub fn loads_at_bus(&self, bus: BusId) -> Vec<&Load> {
        self.loads.iter().filter(|l| l.bus == bus).collect()
    }

    pub fn storage_units_at_bus(&self, bus: BusId) -> Vec<&StorageUnit> {
        self.storage_units.iter().filter(|s| s.bus == bus).collect()
    }

    /// Emissions per MWh of electrical output for a generator (t/MWh).
    pub fn emission_intensity(&self, gen: &Generator) -> f64 {
        self.source(gen.source)
            .map_or(0.0, |s| s.co2_emissions / gen.efficiency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus() -> (Network, BusId, BusId) {
        let mut network = Network::new();
        let a = network.add_bus("a", 380.0).unwrap();
        let b = network.add_bus("b", 380.0).unwrap();
        (network, a, b)
    }

    #[test]
    fn test_network_creation() {
        let (mut network, a, b) = two_bus();
        let gas = network.add_source("gas", 0.24).unwrap();
        let wind = network.add_source("wind", 0.0).unwrap();

        network.add_line(Line::new("a-b", a, b, 0.2)).unwrap();
        network
            .add_transport_link(TransportLink::new("TL", a, b).with_p_limits(1000.0, -900.0, 900.0))
            .unwrap();
        network.add_load(Load::new("load b", b)).unwrap();
        network.add_generator(Generator::new("Gas a", a, gas)).unwrap();
        network
            .add_generator(Generator::new("Wind a", a, wind).with_dispatch(Dispatch::Variable))
            .unwrap();
        network.add_storage_unit(StorageUnit::new("Storage b", b)).unwrap();

        let stats = network.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.num_lines, 1);
        assert_eq!(stats.num_transport_links, 1);
        assert_eq!(stats.num_generators, 2);
        assert_eq!(stats.num_storage_units, 1);
        assert!(stats.to_string().contains("2 buses"));
    }

    #[test]
    fn test_unknown_bus_rejected() {
        let (mut network, a, _) = two_bus();
        let err = network
            .add_line(Line::new("dangling", a, BusId::new(7), 0.1))
            .unwrap_err();
        assert!(matches!(err, NetworkError::UnknownBus { .. }));

        let err = network.add_load(Load::new("ghost", BusId::new(9))).unwrap_err();
        assert!(matches!(err, NetworkError::UnknownBus { kind: "load", .. }));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let (mut network, a, _) = two_bus();
        let err = network
            .add_generator(Generator::new("g", a, SourceId::new(3)))
            .unwrap_err();
        assert!(matches!(err, NetworkError::UnknownSource { .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (mut network, a, b) = two_bus();
        assert!(matches!(
            network.add_bus("a", 110.0),
            Err(NetworkError::DuplicateName { kind: "bus", .. })
        ));
        network.add_line(Line::new("l", a, b, 0.1)).unwrap();
        assert!(network.add_line(Line::new("l", b, a, 0.1)).is_err());
    }

    #[test]
    fn test_invalid_attributes_rejected() {
        let (mut network, a, b) = two_bus();
        assert!(network.add_line(Line::new("zero-x", a, b, 0.0)).is_err());
        assert!(network.add_line(Line::new("self", a, a, 0.1)).is_err());
        assert!(network
            .add_line(Line::new("bounds", a, b, 0.1).extendable(10.0, Some(5.0)))
            .is_err());
        assert!(network
            .add_storage_unit(StorageUnit::new("leaky", a).with_standing_loss(1.5))
            .is_err());
    }

    #[test]
    fn test_snapshots_must_increase() {
        let mut network = Network::new();
        let snaps = hourly_snapshots(default_start(), 3);
        let mut reversed = snaps.clone();
        reversed.reverse();
        assert_eq!(
            network.set_snapshots(reversed),
            Err(NetworkError::UnorderedSnapshots(1))
        );
        network.set_snapshots(snaps).unwrap();
        assert_eq!(network.snapshots.len(), 3);
    }

    #[test]
    fn test_generator_filters() {
        let (mut network, a, b) = two_bus();
        let gas = network.add_source("gas", 0.24).unwrap();
        let wind = network.add_source("wind", 0.0).unwrap();
        network.add_generator(Generator::new("Gas a", a, gas)).unwrap();
        network
            .add_generator(Generator::new("Wind a", a, wind).with_dispatch(Dispatch::Variable))
            .unwrap();
        network
            .add_generator(Generator::new("Wind b", b, wind).with_dispatch(Dispatch::Variable))
            .unwrap();

        let winds = network.generators_where(source_is(wind));
        assert_eq!(winds.len(), 2);
        assert!(winds.iter().all(|g| g.name.starts_with("Wind")));
        assert_eq!(network.generators_where(dispatch_is(Dispatch::Flexible)).len(), 1);
        assert_eq!(network.generators_at_bus(a).len(), 2);
    }

    #[test]
    fn test_emission_intensity() {
        let (mut network, a, _) = two_bus();
        let gas = network.add_source("gas", 0.24).unwrap();
        let id = network
            .add_generator(Generator::new("Gas a", a, gas).with_efficiency(0.35))
            .unwrap();
        let gen = &network.generators[id.value()];
        assert!((network.emission_intensity(gen) - 0.24 / 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_edge_lookup_by_id() {
        let (mut network, a, b) = two_bus();
        let line = network.add_line(Line::new("l", a, b, 0.1)).unwrap();
        let link = network.add_transport_link(TransportLink::new("t", a, b)).unwrap();
        assert_eq!(network.line(line).map(|l| l.name.as_str()), Some("l"));
        assert!(network.line(LineId::new(link.value())).is_none());
        assert_eq!(network.transport_link(link).map(|l| l.name.as_str()), Some("t"));
        assert_eq!(network.bus_id("b"), Some(b));
    }

    #[test]
    fn test_clear_results_keeps_inputs() {
        let (mut network, a, b) = two_bus();
        let snaps = hourly_snapshots(default_start(), 2);
        network.set_snapshots(snaps.clone()).unwrap();
        let line = network.add_line(Line::new("l", a, b, 0.1)).unwrap();
        let su = network.add_storage_unit(StorageUnit::new("s", b)).unwrap();
        let load = network.add_load(Load::new("d", b)).unwrap();

        network.loads[load.value()].p_set = Series::from_values(&snaps, &[5.0, 6.0]);
        network.loads[load.value()].p.insert(snaps[1], 6.0);
        network.line_mut(line).unwrap().p0.insert(snaps[1], 3.0);
        let storage = &mut network.storage_units[su.value()];
        storage.state_of_charge.insert(snaps[0], 1.0);
        storage.state_of_charge.insert(snaps[1], 4.0);
        storage.final_state_of_charge = Some(2.0);

        network.clear_results(Some(&snaps[0]));

        assert_eq!(network.loads[0].p_set.len(), 2);
        assert!(network.loads[0].p.is_empty());
        assert!(network.line(line).unwrap().p0.is_empty());
        let storage = &network.storage_units[0];
        assert_eq!(storage.state_of_charge.get(&snaps[0]), Some(1.0));
        assert_eq!(storage.state_of_charge.get(&snaps[1]), None);
        assert_eq!(storage.final_state_of_charge, None);
    }
}
