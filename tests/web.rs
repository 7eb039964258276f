#![cfg(target_arch = "wasm32")]

use deepguard_viz::analysis::{AnalysisResult, Verdict};
use deepguard_viz::config::AppConfig;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn set_config_payload_parses() {
    let config = AppConfig::from_json(r#"{"scene":"network","analysis":{"origin":"http://localhost:8000"}}"#).unwrap();
    assert_eq!(config.analysis.endpoint(), "http://localhost:8000/analyze");
}

#[wasm_bindgen_test]
fn verdict_normalization_matches_native() {
    let value = serde_json::json!({"verdict": "fake", "score": 0.83});
    let result = AnalysisResult::from_response(&value);
    assert_eq!(result.verdict, Verdict::Fake);
    assert_eq!(result.fake_percent(), 83);
}
