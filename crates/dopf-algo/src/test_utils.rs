//! Small feeders and adjacency declarations shared by unit and integration tests.

use dopf_core::{AdjacencyDeclaration, AreaDeclaration, NetworkModel, StorageParams};

/// Chain `1 → 2 → 3 → 4` with `load` at node 4 and one period per entry.
pub fn chain_feeder(load: &[f64]) -> NetworkModel {
    let horizon = load.len();
    let mut net = NetworkModel::new(horizon);
    net.add_node(1, &[])
        .add_node(2, &[])
        .add_node(3, &[])
        .add_node(4, load)
        .add_line(1, 2)
        .add_line(2, 3)
        .add_line(3, 4);
    net
}

/// `area1 = {1, 2}` feeding `area2 = {3, 4}` over tie-line `2 → 3`.
pub fn two_area_declaration() -> AdjacencyDeclaration {
    AdjacencyDeclaration::new(vec![
        AreaDeclaration::root("area1", 1).with_down("area2", "D2", 2),
        AreaDeclaration::child("area2", "area1", "U3", 3),
    ])
}

/// Chain feeder over two periods with a battery at node 3.
pub fn storage_feeder() -> NetworkModel {
    let mut net = chain_feeder(&[10.0, 12.0]).with_storage_params(StorageParams::with_duration(20.0, 4.0));
    net.add_storage(3);
    net.with_price(vec![0.1, 0.3])
}

/// Ten-node branched feeder with storage and flexible loads.
///
/// ```text
///   1 → 2 → 3 ┆→ 4 → 5 ┆→ 9 → 10
///       └───┆→ 6 → 7 → 8
/// ```
///
/// Batteries sit at 5 and 7, flexible loads at 8 and 10. Resource limits
/// stay below every area's own load so no area ever exports upstream.
pub fn branched_feeder() -> NetworkModel {
    let horizon = 4;
    let mut net = NetworkModel::new(horizon);
    let loads: [(usize, [f64; 4]); 10] = [
        (1, [0.0; 4]),
        (2, [4.0, 5.0, 6.0, 5.0]),
        (3, [3.0, 3.5, 4.0, 3.0]),
        (4, [2.0, 2.5, 3.0, 2.0]),
        (5, [6.0, 7.0, 8.0, 6.0]),
        (6, [1.0, 1.0, 1.5, 1.0]),
        (7, [5.0, 6.0, 7.0, 5.5]),
        (8, [4.0, 4.5, 5.0, 4.0]),
        (9, [2.0, 2.0, 2.5, 2.0]),
        (10, [3.0, 3.5, 4.0, 3.0]),
    ];
    for (node, load) in &loads {
        net.add_node(*node, load);
    }
    for (from, to) in [(1, 2), (2, 3), (3, 4), (4, 5), (2, 6), (6, 7), (7, 8), (5, 9), (9, 10)] {
        net.add_line(from, to);
    }
    net.add_storage(5)
        .add_storage(7)
        .add_flexible_load(8, vec![5.0; horizon], vec![3.0; horizon])
        .add_flexible_load(10, vec![5.0; horizon], vec![3.0; horizon]);
    net.with_storage_params(StorageParams::with_duration(5.0, 4.0))
        .with_price(vec![0.1, 0.2, 0.3, 0.15])
}

/// Four areas over [`branched_feeder`]: `area1` is the root, `area2` and
/// `area3` hang off it and `area4` hangs off `area2`.
pub fn branched_declaration() -> AdjacencyDeclaration {
    AdjacencyDeclaration::new(vec![
        AreaDeclaration::root("area1", 1)
            .with_down("area2", "D3", 3)
            .with_down("area3", "D2", 2),
        AreaDeclaration::child("area2", "area1", "U4", 4).with_down("area4", "D5", 5),
        AreaDeclaration::child("area3", "area1", "U6", 6),
        AreaDeclaration::child("area4", "area2", "U9", 9),
    ])
}
