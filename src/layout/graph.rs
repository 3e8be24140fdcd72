//! Layout graph: one sized node per entity, one port-to-port edge per relationship.

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::model::{Entity, Relationship};

/// Position of a node inside [`LayoutGraph::nodes`].
pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub field: String,
    /// Distance from the node's top edge, on the trailing edge.
    pub offset_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRef {
    pub node: NodeIndex,
    pub port: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEdge {
    pub id: String,
    pub source: PortRef,
    pub target: PortRef,
}

impl LayoutEdge {
    pub fn is_self_loop(&self) -> bool {
        self.source.node == self.target.node
    }
}

/// Immutable input of one layout run. Later phases keep their results in
/// separate vectors indexed by [`NodeIndex`].
#[derive(Debug, Clone)]
pub struct LayoutGraph {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    index: HashMap<String, NodeIndex>,
    /// Edge indices leaving each node, in relationship order, self-loops excluded.
    out_edges: Vec<Vec<usize>>,
    in_edges: Vec<Vec<usize>>,
}

impl LayoutNode {
    pub fn port(&self, field: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.field == field)
    }
}

impl LayoutGraph {
    pub fn new(entities: &[Entity], relationships: &[Relationship], config: &LayoutConfig) -> Self {
        let nodes: Vec<LayoutNode> = entities
            .iter()
            .map(|entity| {
                let ports = entity
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(i, f)| Port {
                        field: f.name.clone(),
                        offset_y: config.header_height + i as f64 * config.per_field_height,
                    })
                    .collect();
                LayoutNode {
                    id: entity.id.clone(),
                    width: config.node_width,
                    height: config.base_height
                        + entity.fields.len() as f64 * config.per_field_height,
                    ports,
                }
            })
            .collect();

        let index: HashMap<String, NodeIndex> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let resolve = |entity: &str, field: &str| -> Option<PortRef> {
            let node = *index.get(entity)?;
            let port = nodes[node].ports.iter().position(|p| p.field == field)?;
            Some(PortRef { node, port })
        };

        // The model already dropped unresolved relationships; filter again so
        // the graph stays well-formed when built from hand-made models.
        let edges: Vec<LayoutEdge> = relationships
            .iter()
            .filter_map(|r| {
                Some(LayoutEdge {
                    id: r.id.clone(),
                    source: resolve(&r.source.entity, &r.source.field)?,
                    target: resolve(&r.target.entity, &r.target.field)?,
                })
            })
            .collect();

        let mut out_edges = vec![Vec::new(); nodes.len()];
        let mut in_edges = vec![Vec::new(); nodes.len()];
        for (i, edge) in edges.iter().enumerate() {
            if edge.is_self_loop() {
                continue;
            }
            out_edges[edge.source.node].push(i);
            in_edges[edge.target.node].push(i);
        }

        Self {
            nodes,
            edges,
            index,
            out_edges,
            in_edges,
        }
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Non-self-loop edges leaving `node`, in relationship order.
    pub fn out_edges(&self, node: NodeIndex) -> &[usize] {
        &self.out_edges[node]
    }

    pub fn in_edges(&self, node: NodeIndex) -> &[usize] {
        &self.in_edges[node]
    }

    /// Nodes joined to `node` by an edge in either direction.
    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let successors = self.out_edges[node].iter().map(|&e| self.edges[e].target.node);
        let predecessors = self.in_edges[node].iter().map(|&e| self.edges[e].source.node);
        successors.chain(predecessors)
    }
}
