use std::collections::BTreeSet;

use dopf_algo::test_utils::{branched_declaration, branched_feeder};
use dopf_algo::{partition_network, LinkSide, PartitionError};
use dopf_core::{AdjacencyDeclaration, AreaDeclaration, Line, NodeId};

#[test]
fn test_branched_partition_covers_network() {
    let net = branched_feeder();
    let partition = partition_network(&net, &branched_declaration()).unwrap();
    let placeholders = partition.placeholder_nodes();

    let real: BTreeSet<&NodeId> = partition
        .areas
        .iter()
        .flat_map(|a| a.nodes.iter())
        .filter(|n| !placeholders.contains(n))
        .collect();
    let expected: BTreeSet<&NodeId> = net.nodes.iter().collect();
    assert_eq!(real, expected);

    // every network line is either kept whole or is a tie-line
    let ties: BTreeSet<Line> = partition.links.iter().map(|l| l.tie_line()).collect();
    let kept: BTreeSet<&Line> = partition.areas.iter().flat_map(|a| a.lines.iter()).collect();
    for line in &net.lines {
        assert!(kept.contains(line) ^ ties.contains(line), "{line}");
    }
}

#[test]
fn test_branched_partition_shapes() {
    let net = branched_feeder();
    let partition = partition_network(&net, &branched_declaration()).unwrap();

    assert_eq!(partition.root_area().name, "area1");
    assert_eq!(partition.links.len(), 3);

    let area2 = &partition.areas[partition.area_index("area2").unwrap()];
    assert_eq!(area2.substations, vec![NodeId::from("U4")]);
    assert_eq!(area2.storage_nodes, vec![NodeId::from(5)]);
    assert_eq!(area2.down.len(), 1);
    assert_eq!(area2.up.map(|l| l.side), Some(LinkSide::Up));

    let area4 = &partition.areas[partition.area_index("area4").unwrap()];
    assert_eq!(area4.flex_nodes, vec![NodeId::from(10)]);
    assert!(area4.down.is_empty());
    assert_eq!(area4.load[&NodeId::from(10)], net.load[&NodeId::from(10)]);
}

#[test]
fn test_mismatched_up_and_down_declarations() {
    let net = branched_feeder();
    let decl = AdjacencyDeclaration::new(vec![
        AreaDeclaration::root("area1", 1).with_down("area2", "D3", 3),
        AreaDeclaration::child("area2", "area3", "U4", 4),
        AreaDeclaration::child("area3", "area1", "U6", 6),
    ]);
    assert!(matches!(
        partition_network(&net, &decl),
        Err(PartitionError::MismatchedLink { .. })
    ));
}

#[test]
fn test_multiple_roots_are_rejected() {
    let net = branched_feeder();
    let decl = AdjacencyDeclaration::new(vec![
        AreaDeclaration::root("area1", 1),
        AreaDeclaration::root("other", 4),
    ]);
    assert!(matches!(
        partition_network(&net, &decl),
        Err(PartitionError::MultipleRoots(_))
    ));
}
