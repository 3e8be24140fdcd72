//! Layered layout of the schema graph.
//!
//! Phases, each in its own module:
//!   1. [`graph`]: sized nodes with one port per field
//!   2. [`layering`]: feedback edges and longest-path ranks
//!   3. [`ordering`]: crossing minimization inside each rank
//!   4. [`placement`]: ranks to columns, orders to stacked rows
//!   5. [`anchors`]: port-to-port edge hints
//!
//! [`LayoutEngine`] runs them in sequence.

pub mod anchors;
pub mod engine;
pub mod graph;
pub mod layering;
pub mod ordering;
pub mod placement;
pub mod types;

pub use engine::LayoutEngine;
pub use graph::LayoutGraph;
pub use types::{EdgeHint, LayoutResult, NodeGeometry, Point, Size};
