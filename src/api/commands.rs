//! Commands - API cho Presentation Shell
//!
//! Each command runs one request to completion and never returns an error:
//! failures come back as `CommandResponse::Error` naming the stage, so the
//! loaded artifacts stay usable for the next request.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::engine_status::EngineStatus;
use crate::logic::context::AppContext;
use crate::logic::error::{PipelineError, Stage};
use crate::logic::features::{schema, FeatureTable, FEATURE_LAYOUT};
use crate::logic::pipeline::{self, PredictionReport};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One labeled numeric field of the manual entry form
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub default: f32,
}

/// Result of one request as seen by the requester
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandResponse {
    Success {
        report: PredictionReport,
    },
    Error {
        stage: Stage,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expected_columns: Option<Vec<String>>,
    },
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResponse::Success { .. })
    }

    /// Plain-text rendering for a terminal
    pub fn render_text(&self) -> String {
        match self {
            CommandResponse::Success { report } => {
                let result = &report.result;
                let visual = if result.visual_override {
                    format!("{} (worn tool)", result.visual_inspection)
                } else {
                    result.visual_inspection.to_string()
                };

                format!(
                    "Predictions\n  Tool Condition:      {}\n  Machining Finalized: {}\n  Visual Inspection:   {}\n",
                    result.tool_condition,
                    result.machining_label(),
                    visual
                )
            }
            CommandResponse::Error {
                stage,
                message,
                expected_columns,
            } => {
                let mut text = format!("Error [{}]: {}\n", stage, message);
                if let Some(columns) = expected_columns {
                    text.push_str(&format!("Expected Columns: {}\n", columns.join(", ")));
                }
                text
            }
        }
    }
}

// ============================================================================
// PREDICTION COMMANDS
// ============================================================================

/// Chạy dự đoán trên CSV upload (T dòng liên tiếp)
pub fn predict_from_csv(ctx: &AppContext, text: &str) -> CommandResponse {
    let result = FeatureTable::parse_csv(text).and_then(|table| {
        log::info!(
            "CSV received: {} rows, {} columns",
            table.row_count(),
            table.columns().len()
        );
        pipeline::run_batch(ctx, &table)
    });
    respond(result)
}

/// Read a CSV file and predict on it
pub fn predict_from_file(ctx: &AppContext, path: &Path) -> CommandResponse {
    match std::fs::read_to_string(path) {
        Ok(text) => predict_from_csv(ctx, &text),
        Err(e) => respond(Err(PipelineError::Input(format!(
            "cannot read {}: {}",
            path.display(),
            e
        )))),
    }
}

/// Chạy dự đoán trên form nhập tay: 16 fields, mặc định 0.0
pub fn predict_from_fields(ctx: &AppContext, values: &[(String, f32)]) -> CommandResponse {
    let mut fields: BTreeMap<String, f32> = manual_form()
        .into_iter()
        .map(|f| (f.name.to_string(), f.default))
        .collect();

    for (name, value) in values {
        fields.insert(name.clone(), *value);
    }

    respond(pipeline::run_single(ctx, &fields))
}

// ============================================================================
// INFO COMMANDS
// ============================================================================

/// Manual entry form: one field per feature, in canonical order
pub fn manual_form() -> Vec<FormField> {
    FEATURE_LAYOUT
        .iter()
        .map(|name| FormField { name: *name, default: 0.0 })
        .collect()
}

/// Required CSV columns
pub fn required_features() -> Vec<String> {
    schema::required_features().iter().map(|s| s.to_string()).collect()
}

pub fn engine_status(ctx: &AppContext) -> EngineStatus {
    EngineStatus::collect(ctx)
}

// ============================================================================
// HELPERS
// ============================================================================

fn respond(result: Result<PredictionReport, PipelineError>) -> CommandResponse {
    match result {
        Ok(report) => CommandResponse::Success { report },
        Err(e) => {
            let stage = e.stage();
            log::warn!("Request failed at {} stage: {}", stage, e);

            match e {
                PipelineError::Schema(schema) => CommandResponse::Error {
                    stage,
                    message: format!(
                        "Input does not contain all required feature columns ({})",
                        schema
                    ),
                    expected_columns: Some(required_features()),
                },
                other => CommandResponse::Error {
                    stage,
                    message: format!("Error processing input: {}", other),
                    expected_columns: None,
                },
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
