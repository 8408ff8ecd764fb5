//! Shared fixtures: identity scaler, scripted predictor, ready-made contexts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::config::AppConfig;
use super::context::AppContext;
use super::error::PipelineError;
use super::features::{FEATURE_COUNT, FEATURE_LAYOUT};
use super::model::scaler::ScalerArtifact;
use super::model::{Predictor, RawPrediction, ScalerState, SequenceTensor};

/// Predictor returning a fixed output and recording what it was called with
pub struct StubPredictor {
    output: RawPrediction,
    pub calls: Arc<AtomicUsize>,
    pub last_input: Arc<Mutex<Option<SequenceTensor>>>,
}

impl StubPredictor {
    pub fn new(tool: &[f32], machining: f32, visual: f32) -> Self {
        Self {
            output: RawPrediction {
                tool_condition: tool.to_vec(),
                machining_finalized: machining,
                visual_inspection: visual,
            },
            calls: Arc::new(AtomicUsize::new(0)),
            last_input: Arc::new(Mutex::new(None)),
        }
    }
}

impl Predictor for StubPredictor {
    fn predict(&self, sequence: &SequenceTensor) -> Result<RawPrediction, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock() = Some(sequence.clone());
        Ok(self.output.clone())
    }

    fn backend(&self) -> &str {
        "stub"
    }
}

/// Predictor that always fails, as a broken runtime would
pub struct FailingPredictor;

impl Predictor for FailingPredictor {
    fn predict(&self, _sequence: &SequenceTensor) -> Result<RawPrediction, PipelineError> {
        Err(PipelineError::Prediction("session crashed".to_string()))
    }
}

pub fn scaler(mean: f64, scale: f64) -> ScalerState {
    let artifact = ScalerArtifact {
        feature_names: Some(FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect()),
        mean: vec![mean; FEATURE_COUNT],
        scale: vec![scale; FEATURE_COUNT],
    };
    match ScalerState::from_artifact(artifact, PathBuf::from("test-scaler.json")) {
        Ok(state) => state,
        Err(e) => panic!("fixture scaler rejected: {}", e),
    }
}

pub fn config(time_steps: usize) -> AppConfig {
    AppConfig {
        time_steps,
        ..AppConfig::default()
    }
}

pub fn context(config: AppConfig, predictor: impl Predictor + 'static) -> AppContext {
    AppContext::with_predictor(config, scaler(0.0, 1.0), Box::new(predictor))
}

/// CSV with every feature in canonical order; cell value = row * 10 + column
pub fn csv(rows: usize) -> String {
    let mut text = FEATURE_LAYOUT.join(",");
    text.push('\n');
    for r in 0..rows {
        let cells: Vec<String> = (0..FEATURE_COUNT).map(|c| (r * 10 + c).to_string()).collect();
        text.push_str(&cells.join(","));
        text.push('\n');
    }
    text
}
