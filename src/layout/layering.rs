//! Rank assignment: components, feedback edges and longest-path layering.

use std::collections::VecDeque;

use indexmap::IndexMap;

use super::graph::{LayoutGraph, NodeIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct Layering {
    /// Rank per node; 0 for nodes without predecessors.
    pub ranks: Vec<usize>,
    /// Connected component per node, numbered by first entity.
    pub components: Vec<usize>,
    pub component_count: usize,
    /// Per edge: reversed for ranking only.
    pub feedback: Vec<bool>,
}

impl Layering {
    /// Number of ranks used by each component.
    pub fn component_depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.component_count];
        for (node, &rank) in self.ranks.iter().enumerate() {
            let c = self.components[node];
            depths[c] = depths[c].max(rank + 1);
        }
        depths
    }

    pub fn ranks_by_id(&self, graph: &LayoutGraph) -> IndexMap<String, usize> {
        graph
            .nodes()
            .iter()
            .zip(&self.ranks)
            .map(|(n, &r)| (n.id.clone(), r))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

pub fn assign_layers(graph: &LayoutGraph) -> Layering {
    let (components, component_count) = connected_components(graph);
    let feedback = feedback_edges(graph);
    let ranks = longest_path_ranks(graph, &feedback);

    Layering {
        ranks,
        components,
        component_count,
        feedback,
    }
}

fn connected_components(graph: &LayoutGraph) -> (Vec<usize>, usize) {
    let n = graph.node_count();
    let mut component = vec![usize::MAX; n];
    let mut count = 0;

    for root in 0..n {
        if component[root] != usize::MAX {
            continue;
        }
        component[root] = count;
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            for next in graph.neighbors(node) {
                if component[next] == usize::MAX {
                    component[next] = count;
                    queue.push_back(next);
                }
            }
        }
        count += 1;
    }

    (component, count)
}

/// Mark edges that close a cycle during a depth-first walk in entity order.
/// Uses an explicit stack so long foreign-key chains cannot overflow.
fn feedback_edges(graph: &LayoutGraph) -> Vec<bool> {
    let n = graph.node_count();
    let mut feedback = vec![false; graph.edges().len()];
    let mut state = vec![Visit::New; n];

    for root in 0..n {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::OnStack;
        let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            let Some(&edge) = graph.out_edges(node).get(cursor) else {
                state[node] = Visit::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            let target = graph.edges()[edge].target.node;
            match state[target] {
                Visit::OnStack => feedback[edge] = true,
                Visit::New => {
                    state[target] = Visit::OnStack;
                    stack.push((target, 0));
                }
                Visit::Done => {}
            }
        }
    }

    feedback
}

fn longest_path_ranks(graph: &LayoutGraph, feedback: &[bool]) -> Vec<usize> {
    let n = graph.node_count();
    let mut successors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];

    for (i, edge) in graph.edges().iter().enumerate() {
        if edge.is_self_loop() {
            continue;
        }
        let (from, to) = if feedback[i] {
            (edge.target.node, edge.source.node)
        } else {
            (edge.source.node, edge.target.node)
        };
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut ranks = vec![0usize; n];
    let mut ready: VecDeque<NodeIndex> = (0..n).filter(|&v| in_degree[v] == 0).collect();

    while let Some(node) = ready.pop_front() {
        for &next in &successors[node] {
            ranks[next] = ranks[next].max(ranks[node] + 1);
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push_back(next);
            }
        }
    }

    ranks
}
