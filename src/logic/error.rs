//! Error Types - Pipeline and Artifact errors
//!
//! Per-request errors (`PipelineError`) are recovered at the request
//! boundary in `api::commands`. `ArtifactLoadError` only happens at startup
//! and is fatal.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// SCHEMA ERRORS
// ============================================================================

/// Supplied data does not satisfy the fixed 16-feature schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required feature(s): {}", .missing.join(", "))]
    MissingFeatures { missing: Vec<String> },

    #[error("unknown feature '{name}'")]
    UnknownFeature { name: String },
}

// ============================================================================
// PIPELINE ERRORS
// ============================================================================

/// Which pipeline stage a request failed in (shown to the requester)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Schema,
    Input,
    Prediction,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Schema => write!(f, "schema"),
            Stage::Input => write!(f, "input"),
            Stage::Prediction => write!(f, "prediction"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Unparseable table, non-numeric or non-finite values
    #[error("invalid input: {0}")]
    Input(String),

    /// Row count, tensor shape or model output arity mismatch
    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl PipelineError {
    /// Stage reported to the requester. Shape errors surface as prediction errors.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Schema(_) => Stage::Schema,
            PipelineError::Input(_) => Stage::Input,
            PipelineError::Shape(_) | PipelineError::Prediction(_) => Stage::Prediction,
        }
    }
}

// ============================================================================
// ARTIFACT ERRORS
// ============================================================================

/// Model or scaler could not be loaded. No prediction is possible after this.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed scaler artifact {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("feature order not confirmed: {0}")]
    LayoutMismatch(String),

    #[error("invalid scaler parameters: {0}")]
    InvalidParameters(String),

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("model input shape mismatch: {0}")]
    ModelShape(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("ONNX runtime: {0}")]
    Runtime(String),
}
