//! Application Context - Artifacts loaded once at startup
//!
//! Immutable after construction and passed by reference into every pipeline
//! call. Replaces process-wide model/scaler globals.

use super::config::AppConfig;
use super::error::ArtifactLoadError;
use super::model::{OnnxPredictor, Predictor, ScalerState};

pub struct AppContext {
    config: AppConfig,
    scaler: ScalerState,
    predictor: Box<dyn Predictor>,
}

impl AppContext {
    /// Load scaler and ONNX model from the configured paths. Any failure is fatal.
    pub fn load(config: AppConfig) -> Result<Self, ArtifactLoadError> {
        config.validate()?;

        let scaler = ScalerState::load(&config.scaler_path)?;
        let predictor = OnnxPredictor::load(&config.model_options())?;

        Ok(Self::with_predictor(config, scaler, Box::new(predictor)))
    }

    /// Build a context around an already constructed predictor
    pub fn with_predictor(config: AppConfig, scaler: ScalerState, predictor: Box<dyn Predictor>) -> Self {
        log::debug!(
            "Context ready: backend={}, T={}, classes={}, window={}",
            predictor.backend(),
            config.time_steps,
            config.tool_classes,
            config.batch_window
        );

        Self {
            config,
            scaler,
            predictor,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scaler(&self) -> &ScalerState {
        &self.scaler
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::logic::features::FEATURE_LAYOUT;

    #[test]
    fn test_load_rejects_zero_time_steps() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            model_path: dir.path().join("model.onnx"),
            scaler_path: dir.path().join("scaler.json"),
            time_steps: 0,
            ..AppConfig::default()
        };

        // Fails before either artifact is looked up
        assert!(matches!(
            AppContext::load(config),
            Err(ArtifactLoadError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_fails_without_scaler() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            model_path: dir.path().join("model.onnx"),
            scaler_path: dir.path().join("scaler.json"),
            ..AppConfig::default()
        };

        assert!(matches!(
            AppContext::load(config),
            Err(ArtifactLoadError::NotFound(p)) if p.ends_with("scaler.json")
        ));
    }

    #[test]
    fn test_load_fails_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let scaler_path = dir.path().join("scaler.json");
        let mut file = std::fs::File::create(&scaler_path).unwrap();
        let json = serde_json::json!({
            "feature_names": FEATURE_LAYOUT,
            "mean": vec![0.0; FEATURE_LAYOUT.len()],
            "scale": vec![1.0; FEATURE_LAYOUT.len()],
        });
        write!(file, "{}", json).unwrap();

        let config = AppConfig {
            model_path: dir.path().join("model.onnx"),
            scaler_path,
            ..AppConfig::default()
        };

        assert!(matches!(
            AppContext::load(config),
            Err(ArtifactLoadError::NotFound(p)) if p.ends_with("model.onnx")
        ));
    }
}
