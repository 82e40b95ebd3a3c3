//! WASM bindings for health-insurance card field extraction.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use carteira_core::card::rules::{self, OperatorDetector};
use carteira_core::registry::profiles_from_json;
use carteira_core::{CardParser, ExtractionResult, OperatorRegistry};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract card fields from OCR text with the built-in operators.
///
/// Returns `{ operator_name, card_number, plan_name, trace, completeness }`.
#[wasm_bindgen]
pub fn extract_card_from_text(text: &str) -> Result<JsValue, JsValue> {
    to_js(&carteira_core::extract(text))
}

/// Operators and rule counts of the built-in registry.
#[wasm_bindgen]
pub fn coverage_report() -> Result<JsValue, JsValue> {
    to_js(&carteira_core::coverage_report())
}

/// Reduce a card number to its digits.
#[wasm_bindgen]
pub fn normalize_number(raw: &str) -> String {
    rules::normalize_number(raw)
}

/// Card extractor class for browser use.
#[wasm_bindgen]
pub struct CardExtractor {
    parser: CardParser,
}

#[wasm_bindgen]
impl CardExtractor {
    /// Create an extractor over the built-in operators.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: CardParser::new(),
        }
    }

    /// Create an extractor with extra operator profiles appended to the
    /// built-in ones. `profiles_json` is a JSON array of profile specs.
    #[wasm_bindgen]
    pub fn with_profiles(profiles_json: &str) -> Result<CardExtractor, JsValue> {
        let extra = profiles_from_json(profiles_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let registry = OperatorRegistry::builtin()
            .extend(extra)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self {
            parser: CardParser::with_registry(registry.into()),
        })
    }

    /// Configure the generic fallback rules.
    #[wasm_bindgen]
    pub fn set_generic_fallback(&mut self, enabled: bool) {
        self.parser = self.parser.clone().with_generic_fallback(enabled);
    }

    /// Configure recording of shadowed rules in the trace.
    #[wasm_bindgen]
    pub fn set_trace_shadowed(&mut self, enabled: bool) {
        self.parser = self.parser.clone().with_shadow_tracing(enabled);
    }

    /// Extract card fields from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text))
    }

    /// Extract card fields along with timing.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, text: &str) -> Result<JsValue, JsValue> {
        #[derive(Serialize)]
        struct ExtractOutput {
            result: ExtractionResult,
            operators_known: usize,
            processing_time_ms: f64,
        }

        let start = js_sys::Date::now();
        let result = self.parser.parse(text);

        to_js(&ExtractOutput {
            result,
            operators_known: self.parser.registry().profiles().len(),
            processing_time_ms: js_sys::Date::now() - start,
        })
    }

    /// Name of the detected operator, if any.
    #[wasm_bindgen]
    pub fn detect_operator(&self, text: &str) -> Option<String> {
        OperatorDetector::new(self.parser.registry())
            .detect(text)
            .profile
            .map(|p| p.name.clone())
    }

    /// Share of fields (0.0 to 1.0) extracted from the text.
    #[wasm_bindgen]
    pub fn completeness(&self, text: &str) -> f64 {
        self.parser.parse(text).completeness()
    }

    /// Names of the registered operators in detection order.
    #[wasm_bindgen]
    pub fn operators(&self) -> Vec<String> {
        self.parser
            .registry()
            .profiles()
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }
}

impl Default for CardExtractor {
    fn default() -> Self {
        Self::new()
    }
}
