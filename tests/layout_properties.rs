use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use erd_layout::cancel::Budget;
use erd_layout::layout::layering::assign_layers;
use erd_layout::layout::ordering::order_layers;
use erd_layout::layout::LayoutGraph;
use erd_layout::model::SchemaModel;
use erd_layout::schema::{ParsedEntity, ParsedField, ParsedRelationship, ParsedSchema};
use erd_layout::{LayoutConfig, LayoutEngine, LayoutResult};

// ===================
// Strategies
// ===================

/// Entities `t0..tn` with 0-4 extra columns after `id`; relationships between
/// arbitrary pairs, self-references and cycles included unless `acyclic`.
fn schema_strategy(acyclic: bool) -> impl Strategy<Value = ParsedSchema> {
    (1usize..14)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(0usize..5, n),
                prop::collection::vec((0..n, 0..n), 0..=n * 2),
            )
        })
        .prop_map(move |(columns, pairs)| build_schema(&columns, &pairs, acyclic))
}

fn build_schema(columns: &[usize], pairs: &[(usize, usize)], acyclic: bool) -> ParsedSchema {
    let entities = columns
        .iter()
        .enumerate()
        .map(|(i, &extra)| {
            let mut fields = vec![ParsedField::new("id", "int").primary_key()];
            fields.extend((1..=extra).map(|c| ParsedField::new(format!("c{c}"), "text")));
            ParsedEntity::new(format!("t{i}"), fields)
        })
        .collect();

    let relationships = pairs
        .iter()
        .filter(|(s, t)| !acyclic || s < t)
        .enumerate()
        .map(|(j, (s, t))| {
            ParsedRelationship::new(
                format!("r{j}"),
                (format!("t{s}").as_str(), "id"),
                (format!("t{t}").as_str(), "id"),
            )
        })
        .collect();

    ParsedSchema {
        entities,
        relationships,
    }
}

fn layout(schema: &ParsedSchema) -> Result<LayoutResult, TestCaseError> {
    LayoutEngine::default()
        .layout(schema)
        .map_err(|e| TestCaseError::fail(e.to_string()))
}

// ===================
// Property Test Functions
// ===================

/// Node bounding boxes are pairwise disjoint.
fn check_no_overlap(schema: &ParsedSchema) -> Result<(), TestCaseError> {
    let result = layout(schema)?;
    let boxes: Vec<_> = result
        .positions
        .iter()
        .map(|(id, p)| (id, p, result.nodes[id].size))
        .collect();

    for (i, (a_id, a, a_size)) in boxes.iter().enumerate() {
        for (b_id, b, b_size) in &boxes[i + 1..] {
            let disjoint = a.x + a_size.width <= b.x
                || b.x + b_size.width <= a.x
                || a.y + a_size.height <= b.y
                || b.y + b_size.height <= a.y;
            prop_assert!(disjoint, "{} overlaps {}", a_id, b_id);
        }
    }
    Ok(())
}

/// On acyclic input every relationship points to an equal or later rank.
fn check_ranks_follow_relationships(schema: &ParsedSchema) -> Result<(), TestCaseError> {
    let result = layout(schema)?;
    for rel in &schema.relationships {
        let source = result.nodes[&rel.source_entity].rank;
        let target = result.nodes[&rel.target_entity].rank;
        prop_assert!(source <= target, "{}: rank {} -> {}", rel.id, source, target);
        prop_assert!(result.positions[&rel.source_entity].x <= result.positions[&rel.target_entity].x);
    }
    Ok(())
}

fn check_deterministic(schema: &ParsedSchema) -> Result<(), TestCaseError> {
    let first = layout(schema)?;
    let second = layout(schema)?;
    prop_assert_eq!(first, second);
    Ok(())
}

/// Cyclic input still yields a finite, in-bounds layout with every edge hinted.
fn check_cycles_terminate(schema: &ParsedSchema) -> Result<(), TestCaseError> {
    let result = layout(schema)?;
    prop_assert_eq!(result.positions.len(), schema.entities.len());
    prop_assert_eq!(result.edge_hints.len(), schema.relationships.len());
    for p in result.positions.values() {
        prop_assert!(p.x.is_finite() && p.y.is_finite());
        prop_assert!(p.x >= 0.0 && p.y >= 0.0);
        prop_assert!(p.x <= result.width && p.y <= result.height);
    }
    for node in result.nodes.values() {
        prop_assert!(node.rank < schema.entities.len());
    }
    Ok(())
}

/// Sweeping never ends with more crossings than the initial ordering.
fn check_sweeps_never_add_crossings(schema: &ParsedSchema) -> Result<(), TestCaseError> {
    let model = SchemaModel::build(schema).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let graph = LayoutGraph::new(&model.entities, &model.relationships, &LayoutConfig::default());
    let layering = assign_layers(&graph);

    let initial = order_layers(&graph, &layering, 0, &Budget::unbounded())
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let swept = order_layers(&graph, &layering, 8, &Budget::unbounded())
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    prop_assert!(swept.crossings <= initial.crossings);
    Ok(())
}

proptest! {
    #[test]
    fn no_two_nodes_overlap(schema in schema_strategy(false)) {
        check_no_overlap(&schema)?;
    }

    #[test]
    fn ranks_follow_relationships_when_acyclic(schema in schema_strategy(true)) {
        check_ranks_follow_relationships(&schema)?;
    }

    #[test]
    fn layout_is_deterministic(schema in schema_strategy(false)) {
        check_deterministic(&schema)?;
    }

    #[test]
    fn cyclic_schemas_terminate(schema in schema_strategy(false)) {
        check_cycles_terminate(&schema)?;
    }

    #[test]
    fn sweeps_never_add_crossings(schema in schema_strategy(false)) {
        check_sweeps_never_add_crossings(&schema)?;
    }
}
