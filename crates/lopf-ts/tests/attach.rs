//! Attaching synthetic series to a small network

use lopf_core::{
    default_start, hourly_snapshots, Dispatch, Generator, Line, Load, Network, StorageUnit,
    TransportLink,
};
use lopf_ts::{attach_synthetic_series, SeriesGenerator, SeriesRanges};

fn small_network() -> Network {
    let mut network = Network::new();
    network
        .set_snapshots(hourly_snapshots(default_start(), 6))
        .unwrap();
    let gas = network.add_source("gas", 0.24).unwrap();
    let wind = network.add_source("wind", 0.0).unwrap();
    let a = network.add_bus("a", 380.0).unwrap();
    let b = network.add_bus("b", 380.0).unwrap();
    network.add_line(Line::new("a-b", a, b, 0.3)).unwrap();
    network
        .add_transport_link(TransportLink::new("TL 0", a, b).with_p_limits(1000.0, -900.0, 900.0))
        .unwrap();
    network.add_load(Load::new("a", a)).unwrap();
    network.add_load(Load::new("b", b)).unwrap();
    network
        .add_generator(
            Generator::new("Wind a", a, wind)
                .with_dispatch(Dispatch::Variable)
                .with_p_nom(100.0),
        )
        .unwrap();
    network.add_generator(Generator::new("Gas a", a, gas)).unwrap();
    network.add_storage_unit(StorageUnit::new("Storage b", b)).unwrap();
    network
}

#[test]
fn attaches_every_series() {
    let mut network = small_network();
    let mut generator = SeriesGenerator::new(3);
    let tables = attach_synthetic_series(&mut network, &mut generator, &SeriesRanges::default());

    assert_eq!(tables.load.columns, vec!["a", "b"]);
    assert_eq!(tables.wind.columns, vec!["Wind a"]);
    assert_eq!(tables.transport.columns, vec!["TL 0"]);

    for load in &network.loads {
        assert_eq!(load.p_set.len(), 6);
        assert!(load.p_set.values().all(|v| (0.0..1000.0).contains(&v)));
    }

    let wind = &network.generators[0];
    for (snapshot, availability) in wind.p_max_pu.iter() {
        assert!((0.0..1.0).contains(availability));
        let set_point = wind.p_set.get(snapshot).unwrap();
        assert!((set_point - availability * 100.0).abs() < 1e-12);
    }
    assert!(network.generators[1].p_max_pu.is_empty(), "gas has no availability");

    let link = network.transport_links().next().unwrap();
    assert!(link.p_set.values().all(|v| (-100.0..100.0).contains(&v)));

    let su = &network.storage_units[0];
    assert_eq!(su.state_of_charge.get(&network.snapshots[0]), Some(0.0));
    assert_eq!(su.state_of_charge.len(), 1);
}

#[test]
fn same_seed_reproduces_inputs() {
    let mut first = small_network();
    let mut second = small_network();
    let t1 = attach_synthetic_series(
        &mut first,
        &mut SeriesGenerator::new(11),
        &SeriesRanges::default(),
    );
    let t2 = attach_synthetic_series(
        &mut second,
        &mut SeriesGenerator::new(11),
        &SeriesRanges::default(),
    );

    assert_eq!(t1, t2);
    for (l1, l2) in first.loads.iter().zip(&second.loads) {
        assert_eq!(l1.p_set, l2.p_set);
    }
    assert_eq!(first.generators[0].p_max_pu, second.generators[0].p_max_pu);
}
