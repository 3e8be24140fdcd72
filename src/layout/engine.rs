//! Layout engine core implementation.

use log::{debug, info, trace};

use crate::cancel::{Budget, CancelToken};
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::model::SchemaModel;
use crate::schema::ParsedSchema;

use super::anchors::calculate_edge_anchors;
use super::graph::LayoutGraph;
use super::layering::assign_layers;
use super::ordering::order_layers;
use super::placement::place_nodes;
use super::types::{LayoutResult, NodeGeometry, Size};

/// Layout engine configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute a layout without cancellation, honoring the configured time budget.
    pub fn layout(&self, schema: &ParsedSchema) -> Result<LayoutResult, LayoutError> {
        self.run(schema, &CancelToken::new())
    }

    /// Compute a layout that stops early once `cancel` is set.
    pub fn run(&self, schema: &ParsedSchema, cancel: &CancelToken) -> Result<LayoutResult, LayoutError> {
        let budget = Budget::new(cancel.clone(), self.config.time_budget());
        self.run_with_budget(schema, &budget)
    }

    pub fn run_with_budget(&self, schema: &ParsedSchema, budget: &Budget) -> Result<LayoutResult, LayoutError> {
        // Phase 1: Schema model
        let model = SchemaModel::build(schema)?;

        // Phase 2: Graph
        let graph = LayoutGraph::new(&model.entities, &model.relationships, &self.config);
        debug!(nodes = graph.node_count(), edges = graph.edges().len(); "Layout graph built");

        // Phase 3: Ranks
        let layering = assign_layers(&graph);
        debug!(
            components = layering.component_count,
            feedback_edges = layering.feedback.iter().filter(|f| **f).count();
            "Layers assigned"
        );
        budget.checkpoint("layering")?;

        // Phase 4: Order within ranks
        let ordering = order_layers(
            &graph,
            &layering,
            self.config.crossing_minimization_passes,
            budget,
        )?;
        debug!(
            crossings = ordering.crossings,
            iterations = ordering.iterations,
            timed_out = ordering.timed_out;
            "Layers ordered"
        );
        budget.check_cancelled()?;

        // Phase 5: Coordinates and edge anchors
        let placement = place_nodes(&graph, &ordering, &self.config);
        let edge_hints = calculate_edge_anchors(&graph, &placement.positions);
        budget.check_cancelled()?;

        let mut result = LayoutResult {
            width: placement.width,
            height: placement.height,
            edge_hints,
            ..LayoutResult::default()
        };
        for (i, node) in graph.nodes().iter().enumerate() {
            result.positions.insert(node.id.clone(), placement.positions[i]);
            result.nodes.insert(
                node.id.clone(),
                NodeGeometry {
                    size: Size {
                        width: node.width,
                        height: node.height,
                    },
                    port_offsets: node.ports.iter().map(|p| p.offset_y).collect(),
                    rank: layering.ranks[i],
                    order: ordering.orders[i],
                },
            );
        }

        info!(
            nodes = result.positions.len(),
            edges = result.edge_hints.len(),
            width = result.width,
            height = result.height;
            "Layout computed"
        );
        trace!(result:?; "Layout result");

        Ok(result)
    }
}
