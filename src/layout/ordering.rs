//! Crossing minimization by layer sweeps.
//!
//! Nodes are reordered inside their `(component, rank)` layer by the median
//! position of their neighbours in the adjacent, already ordered layer, with
//! the barycenter standing in when the neighbour count is even. Each iteration
//! sweeps down then up. The best ordering seen so far is kept, which makes the
//! result never worse than the entity order it starts from.

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::cancel::Budget;
use crate::error::LayoutError;

use super::graph::{LayoutGraph, NodeIndex};
use super::layering::Layering;

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    /// Position of each node inside its layer.
    pub orders: Vec<usize>,
    /// `layers[component][rank]` lists node indices top to bottom.
    pub layers: Vec<Vec<Vec<NodeIndex>>>,
    pub crossings: usize,
    pub iterations: usize,
    /// Sweeping stopped early because the run's time budget ran out.
    pub timed_out: bool,
}

impl Ordering {
    pub fn orders_by_id(&self, graph: &LayoutGraph) -> IndexMap<String, usize> {
        graph
            .nodes()
            .iter()
            .zip(&self.orders)
            .map(|(n, &o)| (n.id.clone(), o))
            .collect()
    }
}

/// Neighbours one rank up and one rank down. Edges spanning several ranks or
/// joining nodes of the same rank do not take part.
struct Adjacent {
    up: Vec<Vec<NodeIndex>>,
    down: Vec<Vec<NodeIndex>>,
}

impl Adjacent {
    fn new(graph: &LayoutGraph, ranks: &[usize]) -> Self {
        let n = graph.node_count();
        let mut up = vec![Vec::new(); n];
        let mut down = vec![Vec::new(); n];

        for edge in graph.edges() {
            let (a, b) = (edge.source.node, edge.target.node);
            if ranks[b] == ranks[a] + 1 {
                down[a].push(b);
                up[b].push(a);
            } else if ranks[a] == ranks[b] + 1 {
                down[b].push(a);
                up[a].push(b);
            }
        }

        Self { up, down }
    }
}

pub fn order_layers(
    graph: &LayoutGraph,
    layering: &Layering,
    passes: usize,
    budget: &Budget,
) -> Result<Ordering, LayoutError> {
    let depths = layering.component_depths();
    let mut layers: Vec<Vec<Vec<NodeIndex>>> =
        depths.iter().map(|&depth| vec![Vec::new(); depth]).collect();
    for node in 0..graph.node_count() {
        layers[layering.components[node]][layering.ranks[node]].push(node);
    }

    let adjacent = Adjacent::new(graph, &layering.ranks);
    let mut pos = positions(graph.node_count(), &layers);

    let mut best_crossings = count_crossings(&layers, &adjacent, &pos);
    let mut best_layers = layers.clone();
    let mut iterations = 0;
    let mut timed_out = false;

    debug!(crossings = best_crossings, passes; "Starting crossing minimization");

    while iterations < passes && best_crossings > 0 {
        budget.check_cancelled()?;
        if budget.is_expired() {
            warn!(iterations, crossings = best_crossings; "Crossing minimization hit the time budget");
            timed_out = true;
            break;
        }
        iterations += 1;

        let mut changed = false;
        for component in layers.iter_mut() {
            for rank in 1..component.len() {
                changed |= sweep_layer(&mut component[rank], &adjacent.up, &mut pos);
            }
        }
        for component in layers.iter_mut() {
            for rank in (0..component.len().saturating_sub(1)).rev() {
                changed |= sweep_layer(&mut component[rank], &adjacent.down, &mut pos);
            }
        }

        let crossings = count_crossings(&layers, &adjacent, &pos);
        trace!(iteration = iterations, crossings, changed; "Sweep finished");
        if crossings < best_crossings {
            best_crossings = crossings;
            best_layers = layers.clone();
        }
        if !changed {
            break;
        }
    }

    Ok(Ordering {
        orders: positions(graph.node_count(), &best_layers),
        layers: best_layers,
        crossings: best_crossings,
        iterations,
        timed_out,
    })
}

fn positions(node_count: usize, layers: &[Vec<Vec<NodeIndex>>]) -> Vec<usize> {
    let mut pos = vec![0; node_count];
    for layer in layers.iter().flatten() {
        for (i, &node) in layer.iter().enumerate() {
            pos[node] = i;
        }
    }
    pos
}

/// Median of the neighbours' positions, or their mean for an even count.
fn sort_key(neighbors: &[NodeIndex], pos: &[usize]) -> Option<f64> {
    let mut p: Vec<usize> = neighbors.iter().map(|&v| pos[v]).collect();
    if p.is_empty() {
        return None;
    }
    p.sort_unstable();
    if p.len() % 2 == 1 {
        Some(p[p.len() / 2] as f64)
    } else {
        Some(p.iter().sum::<usize>() as f64 / p.len() as f64)
    }
}

/// Reorder one layer; ties keep the previous order. Returns whether it moved.
fn sweep_layer(layer: &mut [NodeIndex], neighbors: &[Vec<NodeIndex>], pos: &mut [usize]) -> bool {
    let mut keyed: Vec<(f64, NodeIndex)> = layer
        .iter()
        .map(|&v| (sort_key(&neighbors[v], pos).unwrap_or(pos[v] as f64), v))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut changed = false;
    for (i, &(_, node)) in keyed.iter().enumerate() {
        if layer[i] != node {
            changed = true;
            layer[i] = node;
        }
        pos[node] = i;
    }
    changed
}

/// Crossings between every pair of adjacent layers.
fn count_crossings(layers: &[Vec<Vec<NodeIndex>>], adjacent: &Adjacent, pos: &[usize]) -> usize {
    let mut total = 0;
    for component in layers {
        for upper in component.iter().take(component.len().saturating_sub(1)) {
            let mut segments: Vec<(usize, usize)> = upper
                .iter()
                .flat_map(|&u| adjacent.down[u].iter().map(move |&v| (u, v)))
                .map(|(u, v)| (pos[u], pos[v]))
                .collect();
            segments.sort_unstable();
            for (i, &(_, low_i)) in segments.iter().enumerate() {
                total += segments[i + 1..]
                    .iter()
                    .filter(|&&(_, low_j)| low_j < low_i)
                    .count();
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::config::LayoutConfig;
    use crate::layout::layering::assign_layers;
    use crate::model::SchemaModel;
    use crate::schema::{ParsedEntity, ParsedField, ParsedRelationship, ParsedSchema};
    use std::time::Duration;

    fn graph(entities: &[&str], edges: &[(&str, &str)]) -> LayoutGraph {
        let parsed = ParsedSchema {
            entities: entities
                .iter()
                .map(|id| ParsedEntity::new(*id, vec![ParsedField::new("id", "int")]))
                .collect(),
            relationships: edges
                .iter()
                .enumerate()
                .map(|(i, (s, t))| ParsedRelationship::new(format!("r{i}"), (*s, "id"), (*t, "id")))
                .collect(),
        };
        let model = SchemaModel::build(&parsed).unwrap();
        LayoutGraph::new(&model.entities, &model.relationships, &LayoutConfig::default())
    }

    fn order(g: &LayoutGraph, passes: usize) -> Ordering {
        let layering = assign_layers(g);
        order_layers(g, &layering, passes, &Budget::unbounded()).unwrap()
    }

    #[test]
    fn test_unconnected_nodes_keep_entity_order() {
        let g = graph(&["a", "b", "c"], &[]);
        let ordering = order(&g, 8);

        assert_eq!(ordering.crossings, 0);
        assert_eq!(ordering.iterations, 0);
        // Three single-node components.
        assert_eq!(ordering.orders, [0, 0, 0]);
    }

    #[test]
    fn test_removes_simple_crossing() {
        // root -> a, root -> b, a -> d, b -> c: c and d start crossed.
        let g = graph(
            &["root", "a", "b", "c", "d"],
            &[("root", "a"), ("root", "b"), ("a", "d"), ("b", "c")],
        );
        let before = order(&g, 0);
        let after = order(&g, 8);

        assert_eq!(before.crossings, 1);
        assert_eq!(after.crossings, 0);
        let orders = after.orders_by_id(&g);
        assert!(orders["d"] < orders["c"]);
    }

    #[test]
    fn test_shared_parent_is_stable() {
        let g = graph(&["p", "x", "y", "z"], &[("p", "x"), ("p", "y"), ("p", "z")]);
        let ordering = order(&g, 8);

        let orders = ordering.orders_by_id(&g);
        assert_eq!((orders["x"], orders["y"], orders["z"]), (0, 1, 2));
    }

    #[test]
    fn test_median_and_barycenter_keys() {
        let pos = [0, 4, 1, 2];
        assert_eq!(sort_key(&[0, 1, 2], &pos), Some(1.0));
        assert_eq!(sort_key(&[0, 1], &pos), Some(2.0));
        assert_eq!(sort_key(&[], &pos), None);
    }

    #[test]
    fn test_cancelled_run_stops() {
        let g = graph(
            &["root", "a", "b", "c", "d"],
            &[("root", "a"), ("root", "b"), ("a", "d"), ("b", "c")],
        );
        let layering = assign_layers(&g);
        let token = CancelToken::new();
        token.cancel();

        let result = order_layers(&g, &layering, 8, &Budget::new(token, None));
        assert_eq!(result, Err(LayoutError::Cancelled));
    }

    #[test]
    fn test_expired_budget_keeps_initial_order() {
        let g = graph(
            &["root", "a", "b", "c", "d"],
            &[("root", "a"), ("root", "b"), ("a", "d"), ("b", "c")],
        );
        let layering = assign_layers(&g);
        let budget = Budget::new(CancelToken::new(), Some(Duration::ZERO));

        let ordering = order_layers(&g, &layering, 8, &budget).unwrap();
        assert!(ordering.timed_out);
        assert_eq!(ordering.crossings, 1);
    }
}
