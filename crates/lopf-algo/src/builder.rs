//! Two-ring demo network.
//!
//! `replica_count` identical AC rings of `block_size` buses each, with
//! consecutive rings bridged by DC transport links. Every bus carries a
//! load, an extendable storage unit, an extendable wind farm and an
//! extendable gas plant.

use lopf_core::{
    DemoConfig, Dispatch, Generator, Line, Load, LopfResult, Network, StorageUnit, TransportLink,
};
use lopf_ts::{attach_synthetic_series, SeriesGenerator, SeriesRanges, SyntheticSeries};
use tracing::info;

const V_NOM: f64 = 380.0;
const MIN_REACTANCE: f64 = 1e-3;
const BRANCH_CAPITAL_COST: f64 = 0.1;
/// Links per consecutive ring pair (capped by the ring size)
const LINKS_PER_PAIR: usize = 2;

/// A built network together with the series that were attached to it.
#[derive(Debug, Clone)]
pub struct DemoCase {
    pub network: Network,
    pub series: SyntheticSeries,
}

/// Build the demo network for `config`.
///
/// Line reactances are drawn from `generator`; no time series are attached.
pub fn build_demo_network(
    config: &DemoConfig,
    generator: &mut SeriesGenerator,
) -> LopfResult<Network> {
    config.validate()?;
    let n = config.block_size;
    let num_buses = config.num_buses();

    let mut network = Network::new();
    network.set_snapshots(config.snapshots())?;
    network.co2_limit = Some(config.co2_limit);

    let gas = network.add_source("gas", 0.24)?;
    let wind = network.add_source("wind", 0.0)?;
    let storage = network.add_source("storage", 0.0)?;

    let buses = (0..num_buses)
        .map(|i| network.add_bus(i.to_string(), V_NOM))
        .collect::<Result<Vec<_>, _>>()?;

    // Line i closes ring i / n
    for i in 0..num_buses {
        let j = n * (i / n) + (i + 1) % n;
        let x = generator.uniform(0.0, 1.0).max(MIN_REACTANCE);
        network.add_line(
            Line::new(i.to_string(), buses[i], buses[j], x)
                .with_s_nom(0.0)
                .with_capital_cost(BRANCH_CAPITAL_COST)
                .extendable(0.0, None),
        )?;
    }

    let mut link_index = 0;
    for ring in 0..config.replica_count.saturating_sub(1) {
        for k in 0..LINKS_PER_PAIR.min(n) {
            network.add_transport_link(
                TransportLink::new(
                    format!("TL {link_index}"),
                    buses[ring * n + k],
                    buses[(ring + 1) * n + k],
                )
                .with_p_limits(1000.0, -900.0, 900.0)
                .with_s_nom(0.0)
                .with_capital_cost(BRANCH_CAPITAL_COST)
                .extendable(0.0, None),
            )?;
            link_index += 1;
        }
    }

    for (i, &bus) in buses.iter().enumerate() {
        network.add_load(Load::new(i.to_string(), bus))?;

        network.add_storage_unit(
            StorageUnit::new(format!("Storage {i}"), bus)
                .with_source(storage)
                .with_p_nom(0.0)
                .with_costs(2.0, 1000.0)
                .extendable(0.0, None)
                .with_efficiencies(0.9, 0.95)
                .with_standing_loss(0.01)
                .with_max_hours(6.0),
        )?;

        network.add_generator(
            Generator::new(format!("Wind {i}"), bus, wind)
                .with_dispatch(Dispatch::Variable)
                .with_p_nom(100.0)
                .with_costs(0.0, 1000.0)
                .extendable(100.0, None),
        )?;

        network.add_generator(
            Generator::new(format!("Gas {i}"), bus, gas)
                .with_dispatch(Dispatch::Flexible)
                .with_p_nom(0.0)
                .with_costs(2.0, 100.0)
                .with_efficiency(0.35)
                .extendable(0.0, None),
        )?;
    }

    info!("Built demo network. {}", network.stats());
    Ok(network)
}

/// Build the demo network, attach seeded series and resolve its topology.
pub fn demo_case(config: &DemoConfig) -> LopfResult<DemoCase> {
    let mut generator = SeriesGenerator::new(config.random_seed);
    let mut network = build_demo_network(config, &mut generator)?;
    let series = attach_synthetic_series(&mut network, &mut generator, &SeriesRanges::default());
    network.determine_network_topology();
    Ok(DemoCase { network, series })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopf_core::{dispatch_is, ConfigError, LopfError};

    #[test]
    fn test_default_counts() {
        let config = DemoConfig::default();
        let network = build_demo_network(&config, &mut SeriesGenerator::new(0)).unwrap();
        let stats = network.stats();
        assert_eq!(stats.num_buses, 6);
        assert_eq!(stats.num_lines, 6);
        assert_eq!(stats.num_transport_links, 2);
        assert_eq!(stats.num_loads, 6);
        assert_eq!(stats.num_generators, 12);
        assert_eq!(stats.num_storage_units, 6);
        assert_eq!(network.co2_limit, Some(1000.0));
        assert_eq!(network.generators_where(dispatch_is(Dispatch::Variable)).len(), 6);
    }

    #[test]
    fn test_rings_close() {
        let config = DemoConfig::default();
        let network = build_demo_network(&config, &mut SeriesGenerator::new(0)).unwrap();
        let ends: Vec<(usize, usize)> = network
            .lines()
            .map(|l| (l.bus0.value(), l.bus1.value()))
            .collect();
        assert_eq!(ends, vec![(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        for line in network.lines() {
            assert!(line.x >= MIN_REACTANCE && line.x < 1.0);
        }
        let links: Vec<(usize, usize)> = network
            .transport_links()
            .map(|l| (l.bus0.value(), l.bus1.value()))
            .collect();
        assert_eq!(links, vec![(0, 3), (1, 4)]);
    }

    #[test]
    fn test_single_ring_has_no_links() {
        let config = DemoConfig {
            replica_count: 1,
            ..DemoConfig::default()
        };
        let network = build_demo_network(&config, &mut SeriesGenerator::new(0)).unwrap();
        assert_eq!(network.transport_links().count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DemoConfig {
            block_size: 1,
            ..DemoConfig::default()
        };
        let err = build_demo_network(&config, &mut SeriesGenerator::new(0)).unwrap_err();
        assert!(matches!(err, LopfError::Config(ConfigError::BlockSize(1))));
    }

    #[test]
    fn test_demo_case_resolves_topology() {
        let case = demo_case(&DemoConfig::default()).unwrap();
        assert!(case.network.has_topology());
        assert_eq!(case.network.sub_networks.len(), 2);
        assert_eq!(case.series.wind.columns.len(), 6);
    }
}
