//! Inference Pipeline - validate → normalize → sequence → predict → decode
//!
//! One request runs to completion synchronously. Nothing here keeps state
//! between calls: the result is a pure function of the input and the
//! artifacts held by `AppContext`.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::AppContext;
use super::error::PipelineError;
use super::features::{schema, FeatureTable, FeatureVector};
use super::model::{decoder, sequence, DecodedResult, RawPrediction, SequenceTensor};

/// Where the request's readings came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Uploaded table of consecutive readings
    Batch,
    /// One manually entered reading, repeated T times
    Manual,
}

/// Everything the presentation shell needs to render one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub request_id: Uuid,
    pub mode: InputMode,
    pub result: DecodedResult,
    pub raw: RawPrediction,
    pub rows_received: usize,
    pub time_steps: usize,
    pub inference_time_us: u64,
}

/// Run a batch (table) request
pub fn run_batch(ctx: &AppContext, table: &FeatureTable) -> Result<PredictionReport, PipelineError> {
    schema::validate_columns(table.columns())?;

    let rows = table.project()?;
    log::debug!("Batch input: {} rows", rows.len());

    let normalized = ctx.scaler().transform_rows(&rows)?;
    let config = ctx.config();
    let tensor = sequence::from_rows(&normalized, config.time_steps, config.batch_window)?;

    infer(ctx, &tensor, InputMode::Batch, rows.len())
}

/// Run a single-reading (manual entry) request
pub fn run_single(ctx: &AppContext, fields: &BTreeMap<String, f32>) -> Result<PredictionReport, PipelineError> {
    let vector = FeatureVector::from_named(fields)?;
    log::debug!("Manual input: {}", vector.to_log_entry());

    let normalized = ctx.scaler().transform(&vector)?;
    let tensor = sequence::replicate(&normalized, ctx.config().time_steps)?;

    infer(ctx, &tensor, InputMode::Manual, 1)
}

fn infer(
    ctx: &AppContext,
    tensor: &SequenceTensor,
    mode: InputMode,
    rows_received: usize,
) -> Result<PredictionReport, PipelineError> {
    let start_time = Instant::now();
    let raw = ctx.predictor().predict(tensor)?;
    let inference_time_us = start_time.elapsed().as_micros() as u64;

    let result = decoder::decode(&raw, ctx.config().tool_classes)?;

    let report = PredictionReport {
        request_id: Uuid::new_v4(),
        mode,
        result,
        raw,
        rows_received,
        time_steps: tensor.dim().1,
        inference_time_us,
    };

    log::info!(
        "Prediction {} ({:?}): tool={}, machining={}, visual={} in {}us",
        report.request_id,
        mode,
        result.tool_condition,
        result.machining_label(),
        result.visual_inspection,
        inference_time_us
    );

    Ok(report)
}
