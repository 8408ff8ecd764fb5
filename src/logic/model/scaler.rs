//! Feature Normalizer - Fitted scaler artifact
//!
//! Chuẩn hóa features bằng tham số đã fit lúc training.
//! `normalized = (raw - mean) / scale`, parameters fixed at load time.
//!
//! Artifact format is the JSON export of the fitted scaler:
//!
//! ```json
//! { "feature_names": ["feedrate", ...], "mean": [...], "scale": [...] }
//! ```
//!
//! sklearn attribute names (`feature_names_in_`, `mean_`, `scale_`) are
//! accepted too, so `json.dump({k: getattr(scaler, k).tolist() ...})` works as is.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::logic::error::{ArtifactLoadError, PipelineError};
use crate::logic::features::layout::{feature_name, first_order_mismatch, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::features::FeatureVector;

// ============================================================================
// ARTIFACT
// ============================================================================

/// On-disk scaler representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    #[serde(default, alias = "feature_names_in_")]
    pub feature_names: Option<Vec<String>>,
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

// ============================================================================
// SCALER STATE
// ============================================================================

/// Immutable, validated scaler parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScalerState {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
    source: PathBuf,
}

impl ScalerState {
    /// Load and validate the scaler artifact
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        log::info!("Loading scaler from: {}", path.display());

        if !path.exists() {
            return Err(ArtifactLoadError::NotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let artifact: ScalerArtifact =
            serde_json::from_str(&text).map_err(|source| ArtifactLoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let state = Self::from_artifact(artifact, path.to_path_buf())?;
        log::info!("Scaler loaded ({} features, order confirmed)", FEATURE_COUNT);
        Ok(state)
    }

    /// Validate an artifact already in memory
    pub fn from_artifact(artifact: ScalerArtifact, source: PathBuf) -> Result<Self, ArtifactLoadError> {
        let names = artifact.feature_names.ok_or_else(|| {
            ArtifactLoadError::LayoutMismatch(
                "scaler artifact does not record the feature names it was fit on".to_string(),
            )
        })?;

        if let Some(position) = first_order_mismatch(&names) {
            let found = names.get(position).map(String::as_str).unwrap_or("<end>");
            let expected = feature_name(position).unwrap_or("<end>");
            return Err(ArtifactLoadError::LayoutMismatch(format!(
                "position {}: scaler has '{}', expected '{}'",
                position, found, expected
            )));
        }

        let mean = to_fixed(&artifact.mean, "mean")?;
        let scale = to_fixed(&artifact.scale, "scale")?;

        if let Some(i) = mean.iter().position(|m| !m.is_finite()) {
            return Err(ArtifactLoadError::InvalidParameters(format!(
                "mean of '{}' is not finite",
                FEATURE_LAYOUT[i]
            )));
        }
        if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(ArtifactLoadError::InvalidParameters(format!(
                "scale of '{}' must be finite and non-zero",
                FEATURE_LAYOUT[i]
            )));
        }

        Ok(Self { mean, scale, source })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Normalize one row given in canonical order
    pub fn transform_slice(&self, raw: &[f32]) -> Result<[f32; FEATURE_COUNT], PipelineError> {
        if raw.len() != FEATURE_COUNT {
            return Err(PipelineError::Shape(format!(
                "scaler expects {} columns, got {}",
                FEATURE_COUNT,
                raw.len()
            )));
        }

        let mut normalized = [0.0f32; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            if !raw[i].is_finite() {
                return Err(PipelineError::Input(format!(
                    "'{}' must be a finite number",
                    FEATURE_LAYOUT[i]
                )));
            }
            normalized[i] = ((raw[i] as f64 - self.mean[i]) / self.scale[i]) as f32;
        }

        Ok(normalized)
    }

    /// Normalize a feature vector
    pub fn transform(&self, vector: &FeatureVector) -> Result<FeatureVector, PipelineError> {
        self.transform_slice(vector.as_slice()).map(FeatureVector::from_values)
    }

    /// Normalize a table of vectors
    pub fn transform_rows(&self, rows: &[FeatureVector]) -> Result<Vec<FeatureVector>, PipelineError> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}

fn to_fixed(values: &[f64], field: &str) -> Result<[f64; FEATURE_COUNT], ArtifactLoadError> {
    values.try_into().map_err(|_| {
        ArtifactLoadError::InvalidParameters(format!(
            "'{}' has {} entries, expected {}",
            field,
            values.len(),
            FEATURE_COUNT
        ))
    })
}

// ============================================================================
// TESTS
// ============================================================================
