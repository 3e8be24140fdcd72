//! Node placement: ranks become columns, orders become stacked rows.

use crate::config::LayoutConfig;

use super::graph::LayoutGraph;
use super::ordering::Ordering;
use super::types::Point;

/// Result of node placement phase.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePlacement {
    /// Top-left corner per node index.
    pub positions: Vec<Point>,
    pub width: f64,
    pub height: f64,
}

/// Place nodes column by column.
///
/// Each rank's x is the previous rank's x plus its widest node plus
/// `inter_layer_spacing`. Inside a rank nodes are stacked with
/// `intra_layer_spacing` and the whole stack is centered on the component's
/// tallest rank. Components follow each other along the x axis.
pub fn place_nodes(graph: &LayoutGraph, ordering: &Ordering, config: &LayoutConfig) -> NodePlacement {
    let nodes = graph.nodes();
    let mut positions = vec![Point::default(); nodes.len()];
    let mut cursor_x = config.origin_x;
    let mut max_right: f64 = 0.0;
    let mut max_bottom: f64 = 0.0;

    for component in &ordering.layers {
        let stack_heights: Vec<f64> = component
            .iter()
            .map(|layer| {
                let heights: f64 = layer.iter().map(|&n| nodes[n].height).sum();
                heights + layer.len().saturating_sub(1) as f64 * config.intra_layer_spacing
            })
            .collect();
        let tallest = stack_heights.iter().copied().fold(0.0, f64::max);

        let mut x = cursor_x;
        let mut right = cursor_x;
        for (layer, stack_height) in component.iter().zip(&stack_heights) {
            let rank_width = layer.iter().map(|&n| nodes[n].width).fold(0.0, f64::max);
            let mut y = config.origin_y + (tallest - stack_height) / 2.0;

            for &n in layer {
                positions[n] = Point::new(x, y);
                max_bottom = max_bottom.max(y + nodes[n].height);
                y += nodes[n].height + config.intra_layer_spacing;
            }

            right = x + rank_width;
            x = right + config.inter_layer_spacing;
        }

        max_right = max_right.max(right);
        cursor_x = right + config.inter_layer_spacing;
    }

    let (width, height) = if nodes.is_empty() {
        (0.0, 0.0)
    } else {
        (max_right + config.origin_x, max_bottom + config.origin_y)
    };

    NodePlacement {
        positions,
        width,
        height,
    }
}
