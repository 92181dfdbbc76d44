//! Feeder partitioning for distributed OPF.
//!
//! The feeder is cut into areas along declared tie-lines. Every tie-line
//! `parent_global → child_global` is replaced by two half-edges ending at
//! placeholder nodes:
//!
//! ```text
//!   before:  ... → P ────────────→ C → ...
//!   after:   ... → P → D(parent)     U(child) → C → ...
//! ```
//!
//! `D` is a leaf of the parent area whose load stands in for the power sent
//! downstream. `U` is a source of the child area acting as a virtual
//! substation. Each area is then the weakly connected component holding its
//! own root id (`U` for children, the real substation for the root).
//!
//! # Example
//!
//! ```ignore
//! use dopf_algo::graph::partition_network;
//!
//! let partition = partition_network(&network, &adjacency)?;
//! for area in &partition.areas {
//!     println!("{}: {} nodes, sources {:?}", area.name, area.nodes.len(), area.substations);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use dopf_core::{AdjacencyDeclaration, Line, NetworkModel, NodeId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Error type for partitioning operations.
///
/// Every variant is a configuration error: the adjacency declaration does not
/// describe a valid tree of areas over the given network.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PartitionError {
    /// Declaration lists no areas at all
    #[error("Area declaration is empty")]
    Empty,

    /// Two declarations share a name
    #[error("Area '{0}' is declared more than once")]
    DuplicateArea(String),

    /// No area without an upstream neighbour
    #[error("No root area declared (every area has an upstream area)")]
    MissingRoot,

    /// More than one area without an upstream neighbour
    #[error("Multiple root areas declared: {0:?}")]
    MultipleRoots(Vec<String>),

    /// Reference to an area that is not declared
    #[error("Area '{area}' references undeclared area '{neighbor}'")]
    DanglingReference { area: String, neighbor: String },

    /// Upstream chain loops back on itself
    #[error("Cyclic adjacency: area '{0}' never reaches the root")]
    CyclicAdjacency(String),

    /// Parent lists a child that does not name the parent upstream (or vice versa)
    #[error("Areas '{parent}' and '{child}' disagree about their up/down relation")]
    MismatchedLink { parent: String, child: String },

    /// The declared tie-line is not a line of the network
    #[error("Tie-line {line} between '{parent}' and '{child}' is not in the network")]
    MissingTieLine {
        parent: String,
        child: String,
        line: Line,
    },

    /// A declared boundary node does not exist in the network
    #[error("Area '{area}' references unknown node '{node}'")]
    UnknownNode { area: String, node: NodeId },

    /// A placeholder id clashes with a real node or another placeholder
    #[error("Boundary placeholder '{node}' of area '{area}' is already in use")]
    PlaceholderCollision { area: String, node: NodeId },

    /// No component contains the area's root id
    #[error("No component contains root id '{node}' of area '{area}'")]
    RootNotFound { area: String, node: NodeId },

    /// Two areas resolved to the same component (a tie was not cut)
    #[error("Areas '{first}' and '{second}' share one component")]
    SharedComponent { first: String, second: String },

    /// Some nodes belong to no declared area
    #[error("Nodes not covered by any area: {0:?}")]
    UncoveredNodes(Vec<NodeId>),
}

/// Direction of a boundary link as seen from one area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSide {
    /// This area is the child; the link feeds it from upstream.
    Up,
    /// This area is the parent; the link feeds a downstream area.
    Down,
}

/// One declared parent→child tie, realised as two placeholder half-edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLink {
    pub parent: String,
    pub child: String,
    /// Placeholder leaf inside the parent area
    pub parent_local: NodeId,
    /// Placeholder source inside the child area
    pub child_local: NodeId,
    /// Parent-side endpoint of the tie-line in the full network
    pub parent_global: NodeId,
    /// Child-side endpoint of the tie-line in the full network
    pub child_global: NodeId,
}

impl BoundaryLink {
    /// The physical tie-line in the unpartitioned network.
    pub fn tie_line(&self) -> Line {
        Line::new(self.parent_global.clone(), self.child_global.clone())
    }

    /// Placeholder id this link uses inside the area on `side`.
    pub fn local_node(&self, side: LinkSide) -> &NodeId {
        match side {
            LinkSide::Up => &self.child_local,
            LinkSide::Down => &self.parent_local,
        }
    }

    /// Area on the other end of the link, seen from `side`.
    pub fn neighbor(&self, side: LinkSide) -> &str {
        match side {
            LinkSide::Up => &self.parent,
            LinkSide::Down => &self.child,
        }
    }
}

/// A link reference held by an area: which link, seen from which side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaLink {
    pub link: usize,
    pub side: LinkSide,
}

/// One area of a partitioned feeder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    /// Nodes of the component, placeholders included
    pub nodes: Vec<NodeId>,
    pub lines: Vec<Line>,
    /// Sources of the component (real or virtual substations)
    pub substations: Vec<NodeId>,
    pub storage_nodes: Vec<NodeId>,
    pub flex_nodes: Vec<NodeId>,
    /// Base load per node; placeholders carry zeros
    pub load: BTreeMap<NodeId, Vec<f64>>,
    /// Upstream link, `None` for the root
    pub up: Option<AreaLink>,
    pub down: Vec<AreaLink>,
}

impl Area {
    /// The whole feeder as one area without boundary links.
    pub fn from_network(name: impl Into<String>, network: &NetworkModel) -> Self {
        let load = network
            .nodes
            .iter()
            .map(|n| {
                let series = network
                    .load
                    .get(n)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; network.horizon]);
                (n.clone(), series)
            })
            .collect();
        Self {
            name: name.into(),
            nodes: network.nodes.clone(),
            lines: network.lines.clone(),
            substations: network.substation_nodes(),
            storage_nodes: network.storage_nodes.clone(),
            flex_nodes: network.flex_nodes.clone(),
            load,
            up: None,
            down: Vec::new(),
        }
    }

    /// Upstream link first, then downstream links in declaration order.
    pub fn links(&self) -> impl Iterator<Item = AreaLink> + '_ {
        self.up.into_iter().chain(self.down.iter().copied())
    }

    pub fn is_root(&self) -> bool {
        self.up.is_none()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.nodes.iter().any(|n| n == node)
    }
}

/// Result of partitioning: areas in declaration order plus their links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaPartition {
    pub areas: Vec<Area>,
    pub links: Vec<BoundaryLink>,
    pub root: usize,
}

impl AreaPartition {
    pub fn root_area(&self) -> &Area {
        &self.areas[self.root]
    }

    pub fn area_index(&self, name: &str) -> Option<usize> {
        self.areas.iter().position(|a| a.name == name)
    }

    /// All placeholder ids introduced by surgery.
    pub fn placeholder_nodes(&self) -> BTreeSet<&NodeId> {
        self.links
            .iter()
            .flat_map(|l| [&l.parent_local, &l.child_local])
            .collect()
    }

    /// Per-area counts for reporting.
    pub fn summary(&self) -> PartitionSummary {
        let placeholders = self.placeholder_nodes();
        let areas = self
            .areas
            .iter()
            .map(|area| AreaSummary {
                name: area.name.clone(),
                nodes: area.nodes.iter().filter(|n| !placeholders.contains(n)).count(),
                lines: area.lines.len(),
                storage_nodes: area.storage_nodes.len(),
                flex_nodes: area.flex_nodes.len(),
                substations: area.substations.clone(),
                upstream: area.up.map(|l| self.links[l.link].parent.clone()),
                downstream: area
                    .down
                    .iter()
                    .map(|l| self.links[l.link].child.clone())
                    .collect(),
            })
            .collect();
        PartitionSummary {
            areas,
            tie_lines: self.links.iter().map(BoundaryLink::tie_line).collect(),
        }
    }
}

/// Reporting view of an [`AreaPartition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub areas: Vec<AreaSummary>,
    pub tie_lines: Vec<Line>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSummary {
    pub name: String,
    /// Real nodes only
    pub nodes: usize,
    pub lines: usize,
    pub storage_nodes: usize,
    pub flex_nodes: usize,
    pub substations: Vec<NodeId>,
    pub upstream: Option<String>,
    pub downstream: Vec<String>,
}

impl fmt::Display for PartitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for area in &self.areas {
            let subs: Vec<&str> = area.substations.iter().map(NodeId::as_str).collect();
            writeln!(
                f,
                "{:<10} nodes={:<4} lines={:<4} storage={:<3} flex={:<3} sources=[{}] up={} down=[{}]",
                area.name,
                area.nodes,
                area.lines,
                area.storage_nodes,
                area.flex_nodes,
                subs.join(","),
                area.upstream.as_deref().unwrap_or("-"),
                area.downstream.join(",")
            )?;
        }
        for line in &self.tie_lines {
            writeln!(f, "tie-line {line}")?;
        }
        Ok(())
    }
}

/// Partition `network` into the areas declared by `adjacency`.
///
/// # Errors
/// Returns [`PartitionError`] when the declaration is not a tree over the
/// network (see the variants for the individual checks).
pub fn partition_network(
    network: &NetworkModel,
    adjacency: &AdjacencyDeclaration,
) -> Result<AreaPartition, PartitionError> {
    let root = validate_declaration(adjacency)?;
    let links = collect_links(adjacency);

    let real_nodes: HashSet<&NodeId> = network.nodes.iter().collect();
    check_link_nodes(&links, &real_nodes)?;

    // Boundary surgery on the line list; order of untouched lines is kept.
    let mut lines = network.lines.clone();
    for link in &links {
        let tie = link.tie_line();
        let position = lines
            .iter()
            .position(|l| *l == tie)
            .ok_or_else(|| PartitionError::MissingTieLine {
                parent: link.parent.clone(),
                child: link.child.clone(),
                line: tie.clone(),
            })?;
        lines.remove(position);
        lines.push(Line::new(link.parent_global.clone(), link.parent_local.clone()));
        lines.push(Line::new(link.child_local.clone(), link.child_global.clone()));
    }

    let mut nodes: Vec<NodeId> = network.nodes.clone();
    for link in &links {
        nodes.push(link.parent_local.clone());
        nodes.push(link.child_local.clone());
    }

    let graph = build_graph(&nodes, &lines);
    let component_of = label_components(&graph);
    let index_of: HashMap<&NodeId, NodeIndex> = graph
        .node_indices()
        .map(|idx| (&graph[idx], idx))
        .collect();

    // Select each area's component through its root id.
    let mut owner: HashMap<usize, &str> = HashMap::new();
    let mut area_component = Vec::with_capacity(adjacency.len());
    for decl in &adjacency.areas {
        let idx = index_of
            .get(&decl.up_local_node)
            .ok_or_else(|| PartitionError::RootNotFound {
                area: decl.name.clone(),
                node: decl.up_local_node.clone(),
            })?;
        let component = component_of[idx.index()];
        if let Some(first) = owner.insert(component, &decl.name) {
            return Err(PartitionError::SharedComponent {
                first: first.to_string(),
                second: decl.name.clone(),
            });
        }
        area_component.push(component);
    }

    let uncovered: Vec<NodeId> = graph
        .node_indices()
        .filter(|idx| !owner.contains_key(&component_of[idx.index()]))
        .map(|idx| graph[idx].clone())
        .collect();
    if !uncovered.is_empty() {
        return Err(PartitionError::UncoveredNodes(uncovered));
    }

    let mut areas = Vec::with_capacity(adjacency.len());
    for (decl, &component) in adjacency.areas.iter().zip(&area_component) {
        let area_nodes: Vec<NodeId> = graph
            .node_indices()
            .filter(|idx| component_of[idx.index()] == component)
            .map(|idx| graph[idx].clone())
            .collect();
        let member: HashSet<&NodeId> = area_nodes.iter().collect();
        let area_lines: Vec<Line> = lines
            .iter()
            .filter(|l| member.contains(&l.to))
            .cloned()
            .collect();

        let heads: HashSet<&NodeId> = area_lines.iter().map(|l| &l.to).collect();
        let substations: Vec<NodeId> = area_nodes
            .iter()
            .filter(|n| !heads.contains(n))
            .cloned()
            .collect();

        let load = area_nodes
            .iter()
            .map(|n| {
                let series = network
                    .load
                    .get(n)
                    .filter(|_| real_nodes.contains(n))
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; network.horizon]);
                (n.clone(), series)
            })
            .collect();

        let up = links
            .iter()
            .position(|l| l.child == decl.name)
            .map(|link| AreaLink {
                link,
                side: LinkSide::Up,
            });
        let down = links
            .iter()
            .enumerate()
            .filter(|(_, l)| l.parent == decl.name)
            .map(|(link, _)| AreaLink {
                link,
                side: LinkSide::Down,
            })
            .collect();

        let area = Area {
            name: decl.name.clone(),
            storage_nodes: restrict(&network.storage_nodes, &member),
            flex_nodes: restrict(&network.flex_nodes, &member),
            nodes: area_nodes,
            lines: area_lines,
            substations,
            load,
            up,
            down,
        };
        debug!(
            area = %area.name,
            nodes = area.nodes.len(),
            lines = area.lines.len(),
            substations = ?area.substations,
            "built area"
        );
        areas.push(area);
    }

    Ok(AreaPartition { areas, links, root })
}

/// Structural checks on the declaration alone. Returns the root index.
fn validate_declaration(adjacency: &AdjacencyDeclaration) -> Result<usize, PartitionError> {
    if adjacency.is_empty() {
        return Err(PartitionError::Empty);
    }

    let mut seen = HashSet::new();
    for decl in &adjacency.areas {
        if !seen.insert(decl.name.as_str()) {
            return Err(PartitionError::DuplicateArea(decl.name.clone()));
        }
    }

    let roots: Vec<usize> = adjacency
        .areas
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_root())
        .map(|(i, _)| i)
        .collect();
    let root = match roots.as_slice() {
        [] => return Err(PartitionError::MissingRoot),
        [only] => *only,
        _ => {
            return Err(PartitionError::MultipleRoots(
                roots
                    .iter()
                    .map(|&i| adjacency.areas[i].name.clone())
                    .collect(),
            ))
        }
    };

    for decl in &adjacency.areas {
        let neighbors = decl
            .up_area
            .iter()
            .chain(decl.down.iter().map(|d| &d.area));
        for neighbor in neighbors {
            if adjacency.area(neighbor).is_none() {
                return Err(PartitionError::DanglingReference {
                    area: decl.name.clone(),
                    neighbor: neighbor.clone(),
                });
            }
        }
    }

    // Each parent→child listing must be mirrored by the child's up_area, and
    // each child must be listed exactly once by its parent.
    for decl in &adjacency.areas {
        for down in &decl.down {
            let child = adjacency.area(&down.area);
            if child.and_then(|c| c.up_area.as_deref()) != Some(decl.name.as_str()) {
                return Err(PartitionError::MismatchedLink {
                    parent: decl.name.clone(),
                    child: down.area.clone(),
                });
            }
        }
        if let Some(parent_name) = &decl.up_area {
            let listed = adjacency
                .area(parent_name)
                .map(|p| p.down.iter().filter(|d| d.area == decl.name).count())
                .unwrap_or(0);
            if listed != 1 {
                return Err(PartitionError::MismatchedLink {
                    parent: parent_name.clone(),
                    child: decl.name.clone(),
                });
            }
        }
    }

    // Walk upstream from every area; a tree reaches the root within n steps.
    for decl in &adjacency.areas {
        let mut current = decl;
        let mut steps = 0;
        while let Some(up) = &current.up_area {
            steps += 1;
            if steps > adjacency.len() {
                return Err(PartitionError::CyclicAdjacency(decl.name.clone()));
            }
            current = adjacency
                .area(up)
                .ok_or_else(|| PartitionError::DanglingReference {
                    area: current.name.clone(),
                    neighbor: up.clone(),
                })?;
        }
    }

    Ok(root)
}

/// One link per parent `down` entry, in declaration order.
fn collect_links(adjacency: &AdjacencyDeclaration) -> Vec<BoundaryLink> {
    let mut links = Vec::new();
    for parent in &adjacency.areas {
        for down in &parent.down {
            if let Some(child) = adjacency.area(&down.area) {
                links.push(BoundaryLink {
                    parent: parent.name.clone(),
                    child: child.name.clone(),
                    parent_local: down.local_node.clone(),
                    child_local: child.up_local_node.clone(),
                    parent_global: down.global_node.clone(),
                    child_global: child.up_global_node.clone(),
                });
            }
        }
    }
    links
}

fn check_link_nodes(
    links: &[BoundaryLink],
    real_nodes: &HashSet<&NodeId>,
) -> Result<(), PartitionError> {
    let mut placeholders: HashSet<&NodeId> = HashSet::new();
    for link in links {
        for (area, node) in [
            (&link.parent, &link.parent_global),
            (&link.child, &link.child_global),
        ] {
            if !real_nodes.contains(node) {
                return Err(PartitionError::UnknownNode {
                    area: area.clone(),
                    node: node.clone(),
                });
            }
        }
        for (area, node) in [
            (&link.parent, &link.parent_local),
            (&link.child, &link.child_local),
        ] {
            if real_nodes.contains(node) || !placeholders.insert(node) {
                return Err(PartitionError::PlaceholderCollision {
                    area: area.clone(),
                    node: node.clone(),
                });
            }
        }
    }
    Ok(())
}

fn build_graph(nodes: &[NodeId], lines: &[Line]) -> DiGraph<NodeId, ()> {
    let mut graph = DiGraph::with_capacity(nodes.len(), lines.len());
    let mut index: HashMap<&NodeId, NodeIndex> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        index.insert(node, graph.add_node(node.clone()));
    }
    for line in lines {
        if let (Some(&a), Some(&b)) = (index.get(&line.from), index.get(&line.to)) {
            graph.add_edge(a, b, ());
        }
    }
    graph
}

/// Weakly connected component label per node index.
fn label_components(graph: &DiGraph<NodeId, ()>) -> Vec<usize> {
    let mut components = UnionFind::new(graph.node_count());
    for edge in graph.edge_references() {
        components.union(edge.source().index(), edge.target().index());
    }
    components.into_labeling()
}

fn restrict(nodes: &[NodeId], member: &HashSet<&NodeId>) -> Vec<NodeId> {
    nodes.iter().filter(|n| member.contains(n)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{branched_declaration, branched_feeder, chain_feeder, two_area_declaration};
    use dopf_core::AreaDeclaration;

    #[test]
    fn test_two_area_split() {
        let net = chain_feeder(&[10.0, 12.0]);
        let partition = partition_network(&net, &two_area_declaration()).unwrap();

        assert_eq!(partition.areas.len(), 2);
        assert_eq!(partition.links.len(), 1);
        let a1 = &partition.areas[0];
        let a2 = &partition.areas[1];
        assert_eq!(a1.substations, vec![NodeId::from(1)]);
        assert_eq!(a2.substations, vec![NodeId::from("U3")]);
        assert!(a1.contains(&NodeId::from("D2")));
        assert!(!a1.contains(&NodeId::from(3)));
        assert_eq!(a1.load[&NodeId::from("D2")], vec![0.0, 0.0]);
        assert_eq!(a2.up.map(|l| l.side), Some(LinkSide::Up));
        assert_eq!(a1.down.len(), 1);
    }

    #[test]
    fn test_every_real_node_in_exactly_one_area() {
        let net = branched_feeder();
        let partition = partition_network(&net, &branched_declaration()).unwrap();
        let placeholders = partition.placeholder_nodes();

        let mut seen: BTreeMap<&NodeId, usize> = BTreeMap::new();
        for area in &partition.areas {
            for node in area.nodes.iter().filter(|n| !placeholders.contains(n)) {
                *seen.entry(node).or_default() += 1;
            }
        }
        assert_eq!(seen.len(), net.nodes.len());
        assert!(seen.values().all(|&count| count == 1));
    }

    #[test]
    fn test_missing_root_is_reported() {
        let net = chain_feeder(&[1.0, 1.0]);
        let decl = AdjacencyDeclaration::new(vec![
            AreaDeclaration::child("a1", "a2", "U1", 1),
            AreaDeclaration::child("a2", "a1", "U3", 3),
        ]);
        assert_eq!(
            partition_network(&net, &decl).unwrap_err(),
            PartitionError::MissingRoot
        );
    }

    #[test]
    fn test_cycle_is_reported() {
        let net = chain_feeder(&[1.0, 1.0]);
        let decl = AdjacencyDeclaration::new(vec![
            AreaDeclaration::root("a0", 1),
            AreaDeclaration::child("a1", "a2", "U2", 2).with_down("a2", "D3", 3),
            AreaDeclaration::child("a2", "a1", "U3", 3).with_down("a1", "D2", 2),
        ]);
        assert!(matches!(
            partition_network(&net, &decl),
            Err(PartitionError::CyclicAdjacency(_))
        ));
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let net = chain_feeder(&[1.0, 1.0]);
        let decl = AdjacencyDeclaration::new(vec![
            AreaDeclaration::root("a1", 1).with_down("ghost", "D2", 2),
        ]);
        assert!(matches!(
            partition_network(&net, &decl),
            Err(PartitionError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_missing_tie_line_is_reported() {
        let net = chain_feeder(&[1.0, 1.0]);
        // 1 -> 3 is not a line of the chain
        let decl = AdjacencyDeclaration::new(vec![
            AreaDeclaration::root("a1", 1).with_down("a2", "D1", 1),
            AreaDeclaration::child("a2", "a1", "U3", 3),
        ]);
        assert!(matches!(
            partition_network(&net, &decl),
            Err(PartitionError::MissingTieLine { .. })
        ));
    }

    #[test]
    fn test_root_id_outside_network_is_reported() {
        let net = chain_feeder(&[1.0, 1.0]);
        let decl = AdjacencyDeclaration::new(vec![AreaDeclaration::root("a1", 42)]);
        assert!(matches!(
            partition_network(&net, &decl),
            Err(PartitionError::RootNotFound { .. })
        ));
    }

    #[test]
    fn test_uncut_network_is_single_area() {
        let net = chain_feeder(&[1.0, 1.0]);
        let decl = AdjacencyDeclaration::new(vec![AreaDeclaration::root("all", 1)]);
        let partition = partition_network(&net, &decl).unwrap();
        assert_eq!(partition.areas[0].nodes.len(), 4);
        assert!(partition.links.is_empty());
    }

    #[test]
    fn test_whole_feeder_area_uses_partition_source_rule() {
        let net = branched_feeder();
        let decl = AdjacencyDeclaration::new(vec![AreaDeclaration::root("all", 1)]);
        let partition = partition_network(&net, &decl).unwrap();
        let whole = Area::from_network("all", &net);
        assert_eq!(whole.substations, partition.areas[0].substations);

        let mut isolated = chain_feeder(&[1.0]);
        isolated.add_node(9, &[2.0]);
        let whole = Area::from_network("all", &isolated);
        assert_eq!(whole.substations, vec![NodeId::from(1), NodeId::from(9)]);
    }

    #[test]
    fn test_summary_counts_real_nodes() {
        let net = chain_feeder(&[1.0, 1.0]);
        let partition = partition_network(&net, &two_area_declaration()).unwrap();
        let summary = partition.summary();
        assert_eq!(summary.areas[0].nodes, 2);
        assert_eq!(summary.areas[1].nodes, 2);
        assert_eq!(summary.tie_lines, vec![Line::new(2, 3)]);
        assert!(summary.to_string().contains("tie-line 2->3"));
    }
}
