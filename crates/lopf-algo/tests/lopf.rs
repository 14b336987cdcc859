//! LOPF solver tests

use lopf_algo::validation::{
    check_capacity_bounds, check_co2_cap, check_power_balance, check_storage_balance,
    total_emissions,
};
use lopf_algo::{check_all, demo_case, Lopf, SolveError};
use lopf_core::{
    default_start, hourly_snapshots, DemoConfig, Generator, Line, LinkDispatch, Load, Network,
    Series,
};

const TOL: f64 = 1e-3;

/// Bus a: cheap gas (100 MW, 10/MWh)
/// Bus b: expensive gas (100 MW, 50/MWh), 50 MW load
/// Line a-b: fixed 30 MW rating
fn congested_pair(hours: usize) -> Network {
    let snapshots = hourly_snapshots(default_start(), hours);
    let mut network = Network::new();
    network.set_snapshots(snapshots.clone()).unwrap();
    let gas = network.add_source("gas", 0.24).unwrap();
    let a = network.add_bus("a", 380.0).unwrap();
    let b = network.add_bus("b", 380.0).unwrap();
    network
        .add_line(Line::new("a-b", a, b, 0.1).with_s_nom(30.0))
        .unwrap();
    let load = network.add_load(Load::new("b", b)).unwrap();
    network.loads[load.value()].p_set = Series::from_values(&snapshots, &vec![50.0; hours]);
    network
        .add_generator(
            Generator::new("cheap", a, gas)
                .with_p_nom(100.0)
                .with_costs(10.0, 0.0)
                .with_efficiency(0.5),
        )
        .unwrap();
    network
        .add_generator(
            Generator::new("expensive", b, gas)
                .with_p_nom(100.0)
                .with_costs(50.0, 0.0)
                .with_efficiency(0.5),
        )
        .unwrap();
    network
}

#[test]
fn test_congested_line_splits_dispatch() {
    let mut network = congested_pair(2);
    let snapshots = network.snapshots.clone();
    let summary = Lopf::new().solve(&mut network, &snapshots).unwrap();

    for s in &snapshots {
        let cheap = network.generators[0].p.get(s).unwrap();
        let expensive = network.generators[1].p.get(s).unwrap();
        assert!((cheap - 30.0).abs() < TOL, "cheap = {cheap}");
        assert!((expensive - 20.0).abs() < TOL, "expensive = {expensive}");
        let line = network.lines().next().unwrap();
        assert!((line.p0.get(s).unwrap() - 30.0).abs() < TOL);
        assert!((line.p1.get(s).unwrap() + 30.0).abs() < TOL);
    }

    // 2 * (30 * 10 + 20 * 50)
    assert!((summary.objective - 2600.0).abs() < 1e-2);
    // Fixed capacities are not reported as optimised
    assert!(network.generators[0].p_nom_opt.is_none());
    check_power_balance(&network, &snapshots, TOL).unwrap();
}

#[test]
fn test_emissions_in_summary() {
    let mut network = congested_pair(3);
    let snapshots = network.snapshots.clone();
    let summary = Lopf::new().solve(&mut network, &snapshots).unwrap();
    // 3 * 50 MWh / 0.5 * 0.24
    assert!((summary.emissions - 72.0).abs() < 1e-2);
    let recomputed = total_emissions(&network, &snapshots).unwrap();
    assert!((summary.emissions - recomputed).abs() < 1e-6);
}

#[test]
fn test_tight_co2_cap_is_infeasible() {
    let mut network = congested_pair(2);
    let snapshots = network.snapshots.clone();
    let err = Lopf::new()
        .with_co2_limit(0.0)
        .solve(&mut network, &snapshots)
        .unwrap_err();
    assert_eq!(
        err,
        SolveError::Infeasible {
            co2_limit: Some(0.0),
            horizon: 2
        }
    );
    assert!(err.to_string().contains("infeasible"));
}

#[test]
fn test_negative_capital_cost_is_unbounded() {
    let snapshots = hourly_snapshots(default_start(), 1);
    let mut network = Network::new();
    network.set_snapshots(snapshots.clone()).unwrap();
    let wind = network.add_source("wind", 0.0).unwrap();
    let bus = network.add_bus("a", 380.0).unwrap();
    let load = network.add_load(Load::new("a", bus)).unwrap();
    network.loads[load.value()].p_set = Series::from_values(&snapshots, &[10.0]);
    network
        .add_generator(
            Generator::new("subsidised", bus, wind)
                .with_costs(1.0, -1.0)
                .extendable(0.0, None),
        )
        .unwrap();

    let err = Lopf::new().solve(&mut network, &snapshots).unwrap_err();
    assert_eq!(
        err,
        SolveError::Unbounded {
            co2_limit: None,
            horizon: 1
        }
    );
    // Nothing is written back on failure
    assert!(network.generators[0].p.is_empty());
    assert!(network.generators[0].p_nom_opt.is_none());
}

#[test]
fn test_line_added_after_topology_is_used() {
    let snapshots = hourly_snapshots(default_start(), 1);
    let mut network = Network::new();
    network.set_snapshots(snapshots.clone()).unwrap();
    let gas = network.add_source("gas", 0.24).unwrap();
    let a = network.add_bus("a", 380.0).unwrap();
    let b = network.add_bus("b", 380.0).unwrap();
    assert_eq!(network.determine_network_topology().len(), 2);

    network
        .add_line(Line::new("a-b", a, b, 0.1).with_s_nom(100.0))
        .unwrap();
    let load = network.add_load(Load::new("b", b)).unwrap();
    network.loads[load.value()].p_set = Series::from_values(&snapshots, &[50.0]);
    network
        .add_generator(Generator::new("gas a", a, gas).with_p_nom(100.0).with_costs(10.0, 0.0))
        .unwrap();

    Lopf::new().solve(&mut network, &snapshots).unwrap();
    assert_eq!(network.sub_networks.len(), 1);
    let flow = network.lines().next().unwrap().p0.get(&snapshots[0]).unwrap();
    assert!((flow - 50.0).abs() < TOL, "flow = {flow}");
    check_power_balance(&network, &snapshots, TOL).unwrap();
}

#[test]
fn test_shorter_resolve_drops_earlier_results() {
    let mut network = congested_pair(3);
    let snapshots = network.snapshots.clone();
    Lopf::new().solve(&mut network, &snapshots).unwrap();
    assert_eq!(network.generators[0].p.len(), 3);

    Lopf::new().solve(&mut network, &snapshots[..1]).unwrap();
    for gen in &network.generators {
        assert_eq!(gen.p.len(), 1);
    }
    assert!(network.buses().all(|b| b.p.get(&snapshots[2]).is_none()));
    let line = network.lines().next().unwrap();
    assert!(line.p0.get(&snapshots[1]).is_none());
    // Load inputs are untouched
    assert_eq!(network.loads[0].p_set.len(), 3);
    check_power_balance(&network, &snapshots[..1], TOL).unwrap();
}

#[test]
fn test_unordered_snapshots_rejected() {
    let mut network = congested_pair(3);
    let snapshots = network.snapshots.clone();
    let shuffled = vec![snapshots[0], snapshots[2], snapshots[1]];
    let err = Lopf::new().solve(&mut network, &shuffled).unwrap_err();
    assert_eq!(err, SolveError::UnorderedSnapshots(2));
}

#[test]
fn test_unknown_and_empty_snapshots() {
    let mut network = congested_pair(2);
    let outside = hourly_snapshots(default_start(), 3);
    let err = Lopf::new().solve(&mut network, &outside).unwrap_err();
    assert_eq!(err, SolveError::UnknownSnapshot(outside[2]));

    let err = Lopf::new().solve(&mut network, &[]).unwrap_err();
    assert_eq!(err, SolveError::NoSnapshots);
}

#[test]
fn test_missing_load_series() {
    let mut network = congested_pair(2);
    network.loads[0].p_set.clear();
    let snapshots = network.snapshots.clone();
    let err = Lopf::new().solve(&mut network, &snapshots).unwrap_err();
    assert!(matches!(err, SolveError::MissingData(msg) if msg.contains("load 'b'")));
}

#[test]
fn test_demo_end_to_end() {
    let config = DemoConfig::default();
    let mut case = demo_case(&config).unwrap();
    let network = &mut case.network;

    assert_eq!(network.sub_networks.len(), 2);
    for sub in &network.sub_networks {
        assert_eq!(sub.buses.len(), config.block_size);
    }

    let snapshots = config.solve_snapshots();
    let summary = Lopf::new().solve(network, &snapshots).unwrap();
    assert!(summary.objective.is_finite());
    assert!(summary.emissions <= config.co2_limit + TOL);

    let report = check_all(network, &snapshots, TOL).unwrap();
    assert!(report.max_imbalance <= TOL);
    assert!((report.emissions - summary.emissions).abs() < 1e-6);

    check_capacity_bounds(network, TOL).unwrap();
    check_co2_cap(network, &snapshots, TOL).unwrap();
    check_storage_balance(network, &snapshots, TOL).unwrap();

    for su in &network.storage_units {
        assert_eq!(su.state_of_charge.get(&snapshots[0]), Some(0.0));
        assert!(su.final_state_of_charge.is_some());
        assert!(su.p_nom_opt.is_some());
    }
    for gen in &network.generators {
        assert_eq!(gen.p.len(), snapshots.len());
    }
    // Unsolved snapshots carry no results
    assert!(network.buses().all(|b| b.p.get(&config.snapshots()[9]).is_none()));
}

#[test]
fn test_scheduled_links_follow_schedule() {
    let config = DemoConfig {
        link_dispatch: LinkDispatch::Scheduled,
        ..DemoConfig::default()
    };
    let mut case = demo_case(&config).unwrap();
    let snapshots = config.solve_snapshots();
    Lopf::new()
        .with_link_dispatch(LinkDispatch::Scheduled)
        .solve(&mut case.network, &snapshots)
        .unwrap();

    for link in case.network.transport_links() {
        for s in &snapshots {
            let flow = link.p0.get(s).unwrap();
            assert_eq!(Some(flow), link.p_set.get(s));
            assert_eq!(link.p1.get(s), Some(-flow));
            assert!(link.s_nom_opt.unwrap() + TOL >= flow.abs());
        }
    }
    check_all(&case.network, &snapshots, TOL).unwrap();
}

#[test]
fn test_same_seed_same_inputs() {
    let config = DemoConfig {
        random_seed: 7,
        ..DemoConfig::default()
    };
    let first = demo_case(&config).unwrap();
    let second = demo_case(&config).unwrap();
    assert_eq!(first.series, second.series);
    for (l1, l2) in first.network.lines().zip(second.network.lines()) {
        assert_eq!(l1.x.to_bits(), l2.x.to_bits());
    }
    for (g1, g2) in first.network.generators.iter().zip(&second.network.generators) {
        assert_eq!(g1.p_max_pu, g2.p_max_pu);
        assert_eq!(g1.p_set, g2.p_set);
    }

    let other = demo_case(&DemoConfig {
        random_seed: 8,
        ..DemoConfig::default()
    })
    .unwrap();
    assert_ne!(first.series, other.series);
}
