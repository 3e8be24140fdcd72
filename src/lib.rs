pub mod cancel;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod schema;
#[cfg(not(target_arch = "wasm32"))]
pub mod service;

use wasm_bindgen::prelude::*;

pub use cancel::CancelToken;
pub use config::LayoutConfig;
pub use error::{LayoutError, SchemaError};
pub use layout::{LayoutEngine, LayoutResult};
pub use orchestrator::{LayoutState, Orchestrator};
pub use schema::ParsedSchema;

use orchestrator::RunTicket;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_config(config_json: Option<&str>) -> Result<LayoutConfig, String> {
    #[allow(unused_mut)]
    let mut config: LayoutConfig = match config_json {
        Some(json) => serde_json::from_str(json).map_err(|e| format!("Invalid layout config: {e}"))?,
        None => LayoutConfig::default(),
    };
    // No monotonic clock on wasm32-unknown-unknown.
    #[cfg(target_arch = "wasm32")]
    if config.time_budget_ms.take().is_some() {
        log::warn!("Ignoring timeBudgetMs on wasm");
    }
    Ok(config)
}

/// Lay out a schema JSON document once and return the layout as JSON.
#[wasm_bindgen(js_name = "layoutSchema")]
pub fn layout_schema(schema_json: &str, config_json: Option<String>) -> Result<String, String> {
    let schema = ParsedSchema::from_json(schema_json).map_err(|e| format!("Invalid schema: {e}"))?;
    let engine = LayoutEngine::new(parse_config(config_json.as_deref())?);
    let layout = engine.layout(&schema).map_err(|e| e.to_string())?;
    layout.to_json(false).map_err(|e| e.to_string())
}

/// Layout state of one open diagram.
///
/// Runs execute synchronously inside `requestLayout`/`relayout`; the last
/// good layout survives failed runs.
#[wasm_bindgen]
pub struct DiagramLayout {
    engine: LayoutEngine,
    orchestrator: Orchestrator,
}

#[wasm_bindgen]
impl DiagramLayout {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<DiagramLayout, String> {
        Ok(Self {
            engine: LayoutEngine::new(parse_config(config_json.as_deref())?),
            orchestrator: Orchestrator::new(),
        })
    }

    /// Lay out a new schema snapshot. `on_result` receives the layout JSON,
    /// `on_error` the message of a failed run.
    #[wasm_bindgen(js_name = "requestLayout")]
    pub fn request_layout(
        &mut self,
        schema_json: &str,
        on_result: &js_sys::Function,
        on_error: &js_sys::Function,
    ) -> Result<(), JsValue> {
        let schema = ParsedSchema::from_json(schema_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid schema: {e}")))?;
        let ticket = self.orchestrator.on_schema_changed(schema);
        self.drive(ticket, on_result, on_error)
    }

    /// Recompute the layout of the latest snapshot.
    pub fn relayout(&mut self, on_result: &js_sys::Function, on_error: &js_sys::Function) -> Result<(), JsValue> {
        let ticket = self.orchestrator.relayout();
        self.drive(ticket, on_result, on_error)
    }

    /// Last published layout as JSON.
    pub fn current(&self) -> Option<String> {
        self.orchestrator
            .current()
            .and_then(|layout| layout.to_json(false).ok())
    }
}

impl DiagramLayout {
    fn drive(
        &mut self,
        mut ticket: Option<RunTicket>,
        on_result: &js_sys::Function,
        on_error: &js_sys::Function,
    ) -> Result<(), JsValue> {
        while let Some(run) = ticket {
            let completion = match self.engine.run(&run.snapshot, &run.cancel) {
                Ok(result) => self.orchestrator.on_run_succeeded(run.id, result),
                Err(error) => self.orchestrator.on_run_failed(run.id, error),
            };
            if let Some(layout) = &completion.published {
                let json = layout.to_json(false).map_err(|e| JsValue::from_str(&e.to_string()))?;
                on_result.call1(&JsValue::NULL, &JsValue::from_str(&json))?;
            }
            if let Some(error) = &completion.error {
                on_error.call1(&JsValue::NULL, &JsValue::from_str(&error.to_string()))?;
            }
            ticket = completion.next;
        }
        Ok(())
    }
}
