//! Edge anchors: straight port-to-port hints in final coordinates.

use indexmap::IndexMap;

use super::graph::{LayoutEdge, LayoutGraph, LayoutNode};
use super::types::{EdgeHint, Point};

/// Horizontal reach of a self-reference loop beyond the trailing edge.
const LOOP_OFFSET: f64 = 25.0;

/// Calculate anchor points for every edge, keyed by relationship id.
///
/// The anchor y is always `node.y + port offset` so the line meets the row of
/// its field. The x side faces the other node: a forward edge leaves the
/// source's trailing edge and enters the target's leading edge, a backward one
/// does the opposite, and nodes sharing a column both use their trailing edge.
pub fn calculate_edge_anchors(graph: &LayoutGraph, positions: &[Point]) -> IndexMap<String, EdgeHint> {
    graph
        .edges()
        .iter()
        .map(|edge| (edge.id.clone(), anchor_edge(graph, edge, positions)))
        .collect()
}

fn anchor_edge(graph: &LayoutGraph, edge: &LayoutEdge, positions: &[Point]) -> EdgeHint {
    let nodes = graph.nodes();
    let (source, target) = (&nodes[edge.source.node], &nodes[edge.target.node]);
    let (source_pos, target_pos) = (positions[edge.source.node], positions[edge.target.node]);
    let source_offset = source.ports[edge.source.port].offset_y;
    let target_offset = target.ports[edge.target.port].offset_y;

    let trailing = |node: &LayoutNode, pos: Point, offset: f64| Point::new(pos.x + node.width, pos.y + offset);
    let leading = |pos: Point, offset: f64| Point::new(pos.x, pos.y + offset);

    let (source_point, target_point) = if target_pos.x > source_pos.x {
        (
            trailing(source, source_pos, source_offset),
            leading(target_pos, target_offset),
        )
    } else if target_pos.x < source_pos.x {
        (
            leading(source_pos, source_offset),
            trailing(target, target_pos, target_offset),
        )
    } else {
        (
            trailing(source, source_pos, source_offset),
            trailing(target, target_pos, target_offset),
        )
    };

    let waypoints = if edge.is_self_loop() {
        route_self_ref(source_point, target_point)
    } else {
        Vec::new()
    };

    EdgeHint {
        source_point,
        target_point,
        source_offset,
        target_offset,
        waypoints,
    }
}

/// Loop out past the trailing edge and back, so the renderer has a visible
/// path even when both ports share a row.
fn route_self_ref(from: Point, to: Point) -> Vec<Point> {
    let x = from.x.max(to.x) + LOOP_OFFSET;
    vec![Point::new(x, from.y), Point::new(x, to.y)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::model::SchemaModel;
    use crate::schema::{ParsedEntity, ParsedField, ParsedRelationship, ParsedSchema};

    fn graph(relationships: Vec<ParsedRelationship>) -> LayoutGraph {
        let parsed = ParsedSchema {
            entities: vec![
                ParsedEntity::new("users", vec![ParsedField::new("id", "int").primary_key()]),
                ParsedEntity::new(
                    "orders",
                    vec![
                        ParsedField::new("id", "int").primary_key(),
                        ParsedField::new("user_id", "int").foreign_key(),
                        ParsedField::new("parent_id", "int").foreign_key(),
                    ],
                ),
            ],
            relationships,
        };
        let model = SchemaModel::build(&parsed).unwrap();
        LayoutGraph::new(&model.entities, &model.relationships, &LayoutConfig::default())
    }

    #[test]
    fn test_forward_edge_uses_facing_sides() {
        let g = graph(vec![ParsedRelationship::new("r", ("users", "id"), ("orders", "user_id"))]);
        let positions = [Point::new(100.0, 50.0), Point::new(580.0, 20.0)];

        let hints = calculate_edge_anchors(&g, &positions);
        let hint = &hints["r"];
        assert_eq!(hint.source_point, Point::new(380.0, 100.0));
        assert_eq!(hint.target_point, Point::new(580.0, 100.0));
        assert_eq!((hint.source_offset, hint.target_offset), (50.0, 80.0));
        assert!(hint.waypoints.is_empty());
    }

    #[test]
    fn test_backward_edge_swaps_sides() {
        let g = graph(vec![ParsedRelationship::new("r", ("users", "id"), ("orders", "user_id"))]);
        let positions = [Point::new(580.0, 50.0), Point::new(100.0, 50.0)];

        let hint = &calculate_edge_anchors(&g, &positions)["r"];
        assert_eq!(hint.source_point, Point::new(580.0, 100.0));
        assert_eq!(hint.target_point, Point::new(380.0, 130.0));
    }

    #[test]
    fn test_self_reference_loops_outside() {
        let g = graph(vec![ParsedRelationship::new(
            "tree",
            ("orders", "id"),
            ("orders", "parent_id"),
        )]);
        let positions = [Point::new(100.0, 50.0), Point::new(580.0, 50.0)];

        let hint = &calculate_edge_anchors(&g, &positions)["tree"];
        assert_eq!(hint.source_point, Point::new(860.0, 100.0));
        assert_eq!(hint.target_point, Point::new(860.0, 160.0));
        assert_eq!(
            hint.waypoints,
            [Point::new(885.0, 100.0), Point::new(885.0, 160.0)]
        );
    }
}
