//! Layout configuration.
//!
//! Every option only changes geometry; none of them can make a layout
//! incorrect. [`LayoutConfig`] deserializes from camelCase JSON (the shape
//! the browser sends) as well as from TOML, with every field optional.
//!
//! ```
//! # use erd_layout::config::LayoutConfig;
//! let config: LayoutConfig = serde_json::from_str(r#"{"nodeWidth": 320}"#).unwrap();
//! assert_eq!(config.node_width, 320.0);
//! assert_eq!(config.per_field_height, 30.0);
//! ```

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub node_width: f64,
    /// Height of a node with no fields.
    pub base_height: f64,
    /// Offset of the first port from the node's top edge.
    pub header_height: f64,
    pub per_field_height: f64,
    /// Gap between the right edge of one rank and the left edge of the next.
    pub inter_layer_spacing: f64,
    /// Vertical gap between nodes sharing a rank.
    pub intra_layer_spacing: f64,
    /// Upper bound on down+up sweep iterations.
    pub crossing_minimization_passes: usize,
    pub origin_x: f64,
    pub origin_y: f64,
    /// Wall-clock budget for a single run, unbounded when absent.
    pub time_budget_ms: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 280.0,
            base_height: 50.0,
            header_height: 50.0,
            per_field_height: 30.0,
            inter_layer_spacing: 200.0,
            intra_layer_spacing: 150.0,
            crossing_minimization_passes: 8,
            origin_x: 100.0,
            origin_y: 50.0,
            time_budget_ms: None,
        }
    }
}

impl LayoutConfig {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    /// Replace values that would break the no-overlap guarantee (negative or
    /// non-finite sizes and spacings) with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        fn fix(name: &str, value: &mut f64, fallback: f64, allow_zero: bool) {
            let ok = value.is_finite() && (*value > 0.0 || (allow_zero && *value == 0.0));
            if !ok {
                warn!(option = name, value = *value, fallback; "Invalid layout option replaced");
                *value = fallback;
            }
        }

        fix("nodeWidth", &mut self.node_width, defaults.node_width, false);
        fix("baseHeight", &mut self.base_height, defaults.base_height, false);
        fix("headerHeight", &mut self.header_height, defaults.header_height, true);
        fix("perFieldHeight", &mut self.per_field_height, defaults.per_field_height, true);
        fix("interLayerSpacing", &mut self.inter_layer_spacing, defaults.inter_layer_spacing, true);
        fix("intraLayerSpacing", &mut self.intra_layer_spacing, defaults.intra_layer_spacing, true);
        if !self.origin_x.is_finite() {
            self.origin_x = defaults.origin_x;
        }
        if !self.origin_y.is_finite() {
            self.origin_y = defaults.origin_y;
        }
        self
    }
}
