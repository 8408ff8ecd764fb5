//! Inference Engine - ONNX Runtime Integration
//!
//! Load và chạy ONNX model (Keras LSTM exported with tf2onnx).
//! Tách riêng sau trait `Predictor` để dễ swap model hoặc dùng stub trong tests.

use std::fs::File;
use std::path::{Path, PathBuf};

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::sequence::{expected_shape, SequenceTensor};
use crate::logic::error::{ArtifactLoadError, PipelineError};
use crate::logic::features::FEATURE_COUNT;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Raw outputs of the three prediction heads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    /// Class probabilities for tool condition
    pub tool_condition: Vec<f32>,
    /// Probability that machining finalized
    pub machining_finalized: f32,
    /// Probability that the part passed visual inspection
    pub visual_inspection: f32,
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String,
    pub sequence_length: usize,
    pub features: usize,
    pub output_names: Vec<String>,
    pub sha256: String,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// What the loader needs to know about the model artifact
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub path: PathBuf,
    pub time_steps: usize,
    /// Expected SHA-256 of the model file (hex)
    pub expected_sha256: Option<String>,
    /// Output names for tool / machining / visual heads, in that order
    pub output_names: Option<Vec<String>>,
}

// ============================================================================
// PREDICTOR TRAIT
// ============================================================================

/// Capability interface over the loaded model: one forward pass, three heads.
pub trait Predictor: Send + Sync {
    fn predict(&self, sequence: &SequenceTensor) -> Result<RawPrediction, PipelineError>;

    /// Backend name for status reporting
    fn backend(&self) -> &str {
        "custom"
    }

    fn metadata(&self) -> Option<&ModelMetadata> {
        None
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxPredictor {
    // Session::run needs exclusive access
    session: Mutex<Session>,
    output_names: [String; 3],
    metadata: ModelMetadata,
}

impl OnnxPredictor {
    /// Load ONNX model từ file
    pub fn load(options: &ModelOptions) -> Result<Self, ArtifactLoadError> {
        let path = options.path.as_path();
        log::info!("Loading ONNX model from: {}", path.display());

        if !path.exists() {
            return Err(ArtifactLoadError::NotFound(path.to_path_buf()));
        }

        let sha256 = compute_file_hash(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(expected) = &options.expected_sha256 {
            verify_checksum(expected, &sha256)?;
            log::info!("Model checksum verified");
        }

        let session = Session::builder()
            .map_err(|e| ArtifactLoadError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ArtifactLoadError::Runtime(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| ArtifactLoadError::Runtime(format!("Failed to load model: {}", e)))?;

        let input_dims: Vec<i64> = session
            .inputs
            .first()
            .and_then(|input| input.input_type.tensor_shape())
            .map(|shape| shape.to_vec())
            .ok_or_else(|| ArtifactLoadError::Runtime("model has no tensor input".to_string()))?;
        check_input_dims(&input_dims, options.time_steps)?;

        let declared: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let output_names = select_outputs(&declared, options.output_names.as_deref())?;

        log::info!(
            "ONNX model loaded successfully (outputs: {})",
            output_names.join(", ")
        );

        let metadata = ModelMetadata {
            model_path: path.display().to_string(),
            model_type: "lstm".to_string(),
            sequence_length: options.time_steps,
            features: FEATURE_COUNT,
            output_names: output_names.to_vec(),
            sha256,
            loaded_at: chrono::Utc::now(),
        };

        Ok(Self {
            session: Mutex::new(session),
            output_names,
            metadata,
        })
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, sequence: &SequenceTensor) -> Result<RawPrediction, PipelineError> {
        let expected = expected_shape(self.metadata.sequence_length);
        if sequence.dim() != expected {
            return Err(PipelineError::Shape(format!(
                "model expects input {:?}, got {:?}",
                expected,
                sequence.dim()
            )));
        }

        let input_tensor = Value::from_array(sequence.clone())
            .map_err(|e| PipelineError::Prediction(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PipelineError::Prediction(format!("Inference failed: {}", e)))?;

        let mut heads: Vec<Vec<f32>> = Vec::with_capacity(3);
        for name in &self.output_names {
            let output = outputs
                .get(name)
                .ok_or_else(|| PipelineError::Prediction(format!("No output '{}'", name)))?;
            let tensor = output
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Prediction(format!("Extract error: {}", e)))?;
            heads.push(tensor.1.to_vec());
        }

        raw_from_heads(heads)
    }

    fn backend(&self) -> &str {
        "onnx"
    }

    fn metadata(&self) -> Option<&ModelMetadata> {
        Some(&self.metadata)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Turn the three extracted head buffers into a RawPrediction (batch of one)
fn raw_from_heads(heads: Vec<Vec<f32>>) -> Result<RawPrediction, PipelineError> {
    let [tool, machining, visual]: [Vec<f32>; 3] = heads
        .try_into()
        .map_err(|h: Vec<Vec<f32>>| PipelineError::Shape(format!("expected 3 outputs, got {}", h.len())))?;

    if tool.len() < 2 {
        return Err(PipelineError::Shape(format!(
            "tool condition head has {} values, expected class probabilities",
            tool.len()
        )));
    }

    // More than one value means the output was mapped to the wrong head
    let scalar = |head: &[f32], name: &str| match head {
        [value] => Ok(*value),
        _ => Err(PipelineError::Shape(format!(
            "{} head has {} values, expected 1",
            name,
            head.len()
        ))),
    };

    Ok(RawPrediction {
        machining_finalized: scalar(machining.as_slice(), "machining finalized")?,
        visual_inspection: scalar(visual.as_slice(), "visual inspection")?,
        tool_condition: tool,
    })
}

/// Check the model's declared input against `(1, T, FEATURE_COUNT)`.
///
/// Dynamic dimensions (reported as -1) are accepted.
fn check_input_dims(dims: &[i64], time_steps: usize) -> Result<(), ArtifactLoadError> {
    let expected = expected_shape(time_steps);
    let expected = [expected.0, expected.1, expected.2];

    let fixed_mismatch = dims
        .iter()
        .zip(expected.iter())
        .any(|(&dim, &want)| dim > 0 && dim as usize != want);

    if dims.len() != expected.len() || fixed_mismatch {
        return Err(ArtifactLoadError::ModelShape(format!(
            "model input is {:?}, configured for [1, {}, {}]",
            dims, time_steps, FEATURE_COUNT
        )));
    }
    Ok(())
}

/// Pick the three head names: configured ones, or the first three declared outputs
fn select_outputs(declared: &[String], configured: Option<&[String]>) -> Result<[String; 3], ArtifactLoadError> {
    let chosen: Vec<String> = match configured {
        Some(names) => {
            if let Some(missing) = names.iter().find(|n| !declared.contains(*n)) {
                return Err(ArtifactLoadError::Runtime(format!(
                    "model has no output named '{}' (declared: {})",
                    missing,
                    declared.join(", ")
                )));
            }
            names.to_vec()
        }
        None => declared.iter().take(3).cloned().collect(),
    };

    chosen.try_into().map_err(|names: Vec<String>| {
        ArtifactLoadError::Runtime(format!(
            "model must expose 3 outputs (tool, machining, visual), found {}",
            names.len()
        ))
    })
}

/// Compute SHA256 hash of file
fn compute_file_hash(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn verify_checksum(expected: &str, actual: &str) -> Result<(), ArtifactLoadError> {
    if expected.trim().eq_ignore_ascii_case(actual) {
        Ok(())
    } else {
        Err(ArtifactLoadError::ChecksumMismatch {
            expected: expected.trim().to_lowercase(),
            actual: actual.to_string(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_raw_from_heads() {
        let raw = raw_from_heads(vec![vec![0.7, 0.2, 0.1], vec![0.8], vec![0.1]]).unwrap();
        assert_eq!(raw.tool_condition, vec![0.7, 0.2, 0.1]);
        assert_eq!(raw.machining_finalized, 0.8);
        assert_eq!(raw.visual_inspection, 0.1);
    }

    #[test]
    fn test_raw_from_heads_arity() {
        assert!(matches!(
            raw_from_heads(vec![vec![0.7, 0.3], vec![0.8]]),
            Err(PipelineError::Shape(_))
        ));
        assert!(matches!(
            raw_from_heads(vec![vec![0.7, 0.3], vec![], vec![0.1]]),
            Err(PipelineError::Shape(_))
        ));
        assert!(matches!(
            raw_from_heads(vec![vec![1.0], vec![0.8], vec![0.1]]),
            Err(PipelineError::Shape(_))
        ));
    }

    #[test]
    fn test_raw_from_heads_rejects_multi_value_scalar() {
        let err = raw_from_heads(vec![vec![0.7, 0.2, 0.1], vec![0.8, 0.1], vec![0.1]]).unwrap_err();
        assert!(matches!(err, PipelineError::Shape(_)));
        assert!(err.to_string().contains("machining finalized head has 2 values"), "{}", err);

        assert!(matches!(
            raw_from_heads(vec![vec![0.7, 0.2, 0.1], vec![0.8], vec![0.1, 0.8, 0.1]]),
            Err(PipelineError::Shape(_))
        ));
    }

    #[test]
    fn test_check_input_dims() {
        assert!(check_input_dims(&[1, 10, 16], 10).is_ok());
        assert!(check_input_dims(&[-1, -1, 16], 25).is_ok());
        assert!(check_input_dims(&[-1, 10, -1], 10).is_ok());

        assert!(matches!(
            check_input_dims(&[1, 10, 16], 20),
            Err(ArtifactLoadError::ModelShape(_))
        ));
        assert!(matches!(
            check_input_dims(&[1, 10, 15], 10),
            Err(ArtifactLoadError::ModelShape(_))
        ));
        assert!(matches!(
            check_input_dims(&[4, 10, 16], 10),
            Err(ArtifactLoadError::ModelShape(_))
        ));
        assert!(matches!(
            check_input_dims(&[10, 16], 10),
            Err(ArtifactLoadError::ModelShape(_))
        ));
    }

    #[test]
    fn test_select_outputs_declared_order() {
        let declared = names(&["tool_condition", "machining_finalized", "passed_visual_inspection"]);
        let chosen = select_outputs(&declared, None).unwrap();
        assert_eq!(chosen[0], "tool_condition");
        assert_eq!(chosen[2], "passed_visual_inspection");
    }

    #[test]
    fn test_select_outputs_configured() {
        let declared = names(&["visual", "tool", "machining"]);
        let configured = names(&["tool", "machining", "visual"]);
        let chosen = select_outputs(&declared, Some(configured.as_slice())).unwrap();
        assert_eq!(chosen.to_vec(), configured);

        let wrong = names(&["tool", "machining", "quality"]);
        assert!(select_outputs(&declared, Some(wrong.as_slice())).is_err());
    }

    #[test]
    fn test_select_outputs_too_few() {
        let declared = names(&["dense_1", "dense_2"]);
        assert!(select_outputs(&declared, None).is_err());
    }

    #[test]
    fn test_checksum() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "abc").unwrap();

        let hash = compute_file_hash(file.path()).unwrap();
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        assert!(verify_checksum(&hash.to_uppercase(), &hash).is_ok());
        assert!(matches!(
            verify_checksum("00", &hash),
            Err(ArtifactLoadError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let options = ModelOptions {
            path: dir.path().join("my_lstm_model.onnx"),
            time_steps: 10,
            expected_sha256: None,
            output_names: None,
        };
        assert!(matches!(
            OnnxPredictor::load(&options),
            Err(ArtifactLoadError::NotFound(_))
        ));
    }

    fn fixture_options(time_steps: usize) -> ModelOptions {
        ModelOptions {
            path: Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/three_heads.onnx"),
            time_steps,
            expected_sha256: None,
            output_names: None,
        }
    }

    #[test]
    fn test_onnx_predict_three_heads() {
        let predictor = OnnxPredictor::load(&fixture_options(10)).unwrap();
        assert_eq!(predictor.backend(), "onnx");

        let metadata = predictor.metadata().unwrap();
        assert_eq!(
            metadata.output_names,
            names(&["tool_condition", "machining_finalized", "visual_inspection"])
        );
        assert_eq!(metadata.sha256.len(), 64);

        let sequence = SequenceTensor::from_elem(expected_shape(10), 0.75);
        let raw = predictor.predict(&sequence).unwrap();
        assert_eq!(raw.tool_condition.len(), 3);
        assert!((raw.tool_condition[1] - 0.8).abs() < 1e-6);
        assert!((raw.machining_finalized - 0.75).abs() < 1e-6);
        assert!((raw.visual_inspection - 0.9).abs() < 1e-6);

        // Same session serves the next request
        let zeros = SequenceTensor::zeros(expected_shape(10));
        assert_eq!(predictor.predict(&zeros).unwrap().machining_finalized, 0.0);
    }

    #[test]
    fn test_onnx_outputs_by_configured_name() {
        let mut options = fixture_options(10);
        options.output_names = Some(names(&["tool_condition", "visual_inspection", "machining_finalized"]));

        let predictor = OnnxPredictor::load(&options).unwrap();
        let sequence = SequenceTensor::from_elem(expected_shape(10), 0.25);
        let raw = predictor.predict(&sequence).unwrap();

        // Heads swapped by configuration
        assert!((raw.machining_finalized - 0.9).abs() < 1e-6);
        assert!((raw.visual_inspection - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_onnx_rejects_mismatched_time_steps() {
        assert!(matches!(
            OnnxPredictor::load(&fixture_options(20)),
            Err(ArtifactLoadError::ModelShape(_))
        ));
    }

    #[test]
    fn test_onnx_predict_wrong_tensor_shape() {
        let predictor = OnnxPredictor::load(&fixture_options(10)).unwrap();
        let sequence = SequenceTensor::zeros(expected_shape(9));
        assert!(matches!(predictor.predict(&sequence), Err(PipelineError::Shape(_))));
    }

    #[test]
    fn test_checksum_checked_before_session() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not an onnx model").unwrap();

        let options = ModelOptions {
            path: file.path().to_path_buf(),
            time_steps: 10,
            expected_sha256: Some("deadbeef".to_string()),
            output_names: None,
        };
        assert!(matches!(
            OnnxPredictor::load(&options),
            Err(ArtifactLoadError::ChecksumMismatch { .. })
        ));
    }
}
