//! Data structures exchanged between layout phases and with the renderer.

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Geometry the renderer needs to draw one relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeHint {
    pub source_point: Point,
    pub target_point: Point,
    /// Port offset from the source node's top edge.
    pub source_offset: f64,
    /// Port offset from the target node's top edge.
    pub target_offset: f64,
    /// Intermediate points, only present for self-references.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub waypoints: Vec<Point>,
}

/// Dimensions and port offsets of a placed node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGeometry {
    pub size: Size,
    pub port_offsets: Vec<f64>,
    pub rank: usize,
    pub order: usize,
}

/// The complete layout result.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    /// Top-left corner per entity id, in entity order.
    pub positions: IndexMap<String, Point>,
    pub nodes: IndexMap<String, NodeGeometry>,
    /// Per relationship id, in relationship order.
    pub edge_hints: IndexMap<String, EdgeHint>,
    pub width: f64,
    pub height: f64,
}

impl LayoutResult {
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
