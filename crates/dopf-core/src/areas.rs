//! Hand-authored area-adjacency declaration.
//!
//! Each area names its upstream neighbour (none for the root), the pair of
//! boundary identifiers on the upstream side, and its downstream links.
//! Structural validation (single root, tree shape, matching up/down pairs)
//! happens in the partitioner, which knows the network as well.
//!
//! ```toml
//! [[areas]]
//! name = "area1"
//! up_local_node = 1
//! up_global_node = 1
//!
//! [[areas.down]]
//! area = "area2"
//! local_node = "D4"
//! global_node = 4
//!
//! [[areas]]
//! name = "area2"
//! up_area = "area1"
//! up_local_node = "U5"
//! up_global_node = 5
//! ```

use serde::{Deserialize, Serialize};

use crate::network::NodeId;

/// A parent-side tie to one downstream area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownstreamLink {
    /// Name of the child area.
    pub area: String,
    /// Placeholder node id used only inside the parent's model.
    pub local_node: NodeId,
    /// Parent-side endpoint of the tie-line in the full network.
    pub global_node: NodeId,
}

/// One area of the adjacency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaDeclaration {
    pub name: String,
    /// Upstream area, `None` for the root.
    #[serde(default)]
    pub up_area: Option<String>,
    /// For a child: the placeholder feed-in node. For the root: the real
    /// substation node used to pick the root's component.
    pub up_local_node: NodeId,
    /// For a child: the child-side endpoint of the tie-line.
    pub up_global_node: NodeId,
    #[serde(default)]
    pub down: Vec<DownstreamLink>,
}

impl AreaDeclaration {
    /// Root area fed by the real substation `substation`.
    pub fn root(name: impl Into<String>, substation: impl Into<NodeId>) -> Self {
        let substation = substation.into();
        Self {
            name: name.into(),
            up_area: None,
            up_local_node: substation.clone(),
            up_global_node: substation,
            down: Vec::new(),
        }
    }

    /// Child area fed from `up_area` through placeholder `local_node`, which
    /// stands in for the tie-line ending at `global_node`.
    pub fn child(
        name: impl Into<String>,
        up_area: impl Into<String>,
        local_node: impl Into<NodeId>,
        global_node: impl Into<NodeId>,
    ) -> Self {
        Self {
            name: name.into(),
            up_area: Some(up_area.into()),
            up_local_node: local_node.into(),
            up_global_node: global_node.into(),
            down: Vec::new(),
        }
    }

    pub fn with_down(
        mut self,
        area: impl Into<String>,
        local_node: impl Into<NodeId>,
        global_node: impl Into<NodeId>,
    ) -> Self {
        self.down.push(DownstreamLink {
            area: area.into(),
            local_node: local_node.into(),
            global_node: global_node.into(),
        });
        self
    }

    pub fn is_root(&self) -> bool {
        self.up_area.is_none()
    }
}

/// Ordered list of area declarations. Order is preserved in every output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyDeclaration {
    pub areas: Vec<AreaDeclaration>,
}

impl AdjacencyDeclaration {
    pub fn new(areas: Vec<AreaDeclaration>) -> Self {
        Self { areas }
    }

    pub fn area(&self, name: &str) -> Option<&AreaDeclaration> {
        self.areas.iter().find(|a| a.name == name)
    }

    pub fn roots(&self) -> impl Iterator<Item = &AreaDeclaration> {
        self.areas.iter().filter(|a| a.is_root())
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_helpers() {
        let root = AreaDeclaration::root("a1", 1).with_down("a2", "D2", 2);
        assert!(root.is_root());
        assert_eq!(root.down[0].global_node, NodeId::from(2));

        let child = AreaDeclaration::child("a2", "a1", "U3", 3);
        assert_eq!(child.up_area.as_deref(), Some("a1"));
    }

    #[test]
    fn test_parse_toml_declaration() {
        let text = r#"
            [[areas]]
            name = "area1"
            up_local_node = 1
            up_global_node = 1

            [[areas.down]]
            area = "area2"
            local_node = "D4"
            global_node = 4

            [[areas]]
            name = "area2"
            up_area = "area1"
            up_local_node = "U5"
            up_global_node = 5
        "#;
        let decl: AdjacencyDeclaration = toml::from_str(text).unwrap();
        assert_eq!(decl.len(), 2);
        assert_eq!(decl.roots().count(), 1);
        let area2 = decl.area("area2").unwrap();
        assert_eq!(area2.up_local_node, NodeId::from("U5"));
        assert!(area2.down.is_empty());
        assert_eq!(decl.areas[0].down[0].local_node.as_str(), "D4");
    }
}
