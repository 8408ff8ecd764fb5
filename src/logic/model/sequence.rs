//! Sequence Builder - Shapes normalized rows into model input
//!
//! The LSTM consumes `(batch=1, T, FEATURE_COUNT)`. Batch input supplies real
//! consecutive readings; manual input is a single reading repeated T times.

use std::str::FromStr;

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::logic::error::PipelineError;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

/// Model input tensor, shape `(1, T, FEATURE_COUNT)`
pub type SequenceTensor = Array3<f32>;

/// How a batch upload is matched against T
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchWindow {
    /// Row count must equal T
    #[default]
    Exact,
    /// At least T rows; the last T rows are used
    Latest,
}

impl FromStr for BatchWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "latest" | "last" | "tail" => Ok(Self::Latest),
            other => Err(format!("unknown batch window '{}', expected exact or latest", other)),
        }
    }
}

impl std::fmt::Display for BatchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Latest => write!(f, "latest"),
        }
    }
}

/// Expected tensor dimensions for a given T
pub fn expected_shape(time_steps: usize) -> (usize, usize, usize) {
    (1, time_steps, FEATURE_COUNT)
}

/// Build a sequence from consecutive normalized rows
pub fn from_rows(
    rows: &[FeatureVector],
    time_steps: usize,
    window: BatchWindow,
) -> Result<SequenceTensor, PipelineError> {
    check_time_steps(time_steps)?;

    let selected = match window {
        BatchWindow::Exact if rows.len() == time_steps => rows,
        BatchWindow::Exact => {
            return Err(PipelineError::Shape(format!(
                "model expects exactly {} rows, input has {}",
                time_steps,
                rows.len()
            )));
        }
        BatchWindow::Latest if rows.len() >= time_steps => &rows[rows.len() - time_steps..],
        BatchWindow::Latest => {
            return Err(PipelineError::Shape(format!(
                "model expects at least {} rows, input has {}",
                time_steps,
                rows.len()
            )));
        }
    };

    to_tensor(selected.len(), selected.iter())
}

/// Repeat one normalized reading T times
pub fn replicate(vector: &FeatureVector, time_steps: usize) -> Result<SequenceTensor, PipelineError> {
    check_time_steps(time_steps)?;
    to_tensor(time_steps, std::iter::repeat(vector).take(time_steps))
}

fn check_time_steps(time_steps: usize) -> Result<(), PipelineError> {
    if time_steps == 0 {
        return Err(PipelineError::Shape("time steps must be at least 1".to_string()));
    }
    Ok(())
}

fn to_tensor<'a>(
    seq_len: usize,
    rows: impl Iterator<Item = &'a FeatureVector>,
) -> Result<SequenceTensor, PipelineError> {
    let mut input_data = Vec::with_capacity(seq_len * FEATURE_COUNT);
    for vec in rows {
        input_data.extend_from_slice(vec.as_slice());
    }

    Array3::<f32>::from_shape_vec(expected_shape(seq_len), input_data)
        .map_err(|e| PipelineError::Shape(format!("array error: {}", e)))
}
