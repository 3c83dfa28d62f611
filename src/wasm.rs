use wasm_bindgen::prelude::*;

use crate::{Fragment, Reconciler};

#[wasm_bindgen]
pub fn init() {
    // Initialize panic hook for better error messages
    console_error_panic_hook::set_once();
}

/// Fold a JSON array of fragment documents and return the reconciled view
#[wasm_bindgen]
pub fn fold_fragments(fragments_json: &str) -> Result<JsValue, JsError> {
    let fragments: Vec<Fragment> = serde_json::from_str(fragments_json)
        .map_err(|e| JsError::new(&format!("Error parsing fragments: {:#?}", e)))?;

    let mut reconciler = Reconciler::new();
    for fragment in fragments {
        reconciler
            .absorb(fragment)
            .map_err(|e| JsError::new(&format!("Error folding fragment: {}", e)))?;
    }
    let view = reconciler
        .snapshot()
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(serde_wasm_bindgen::to_value(&view)?)
}
