//! Result Decoder - Raw model outputs → labels
//!
//! Deterministic post-processing, no learned parameters:
//! - tool condition: argmax over class probabilities
//! - machining finalized: round-half-up → Yes/No
//! - visual inspection: round-half-up → Passed/Failed, forced to Failed
//!   whenever the tool is Worn

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::inference::RawPrediction;
use crate::logic::error::PipelineError;

// ============================================================================
// LABELS
// ============================================================================

/// Decoded wear state of the milling tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolCondition {
    Good,
    Unworn,
    Worn,
    Damaged,
}

impl ToolCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Unworn => "Unworn",
            Self::Worn => "Worn",
            Self::Damaged => "Damaged",
        }
    }
}

impl std::fmt::Display for ToolCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which class layout the tool-condition head was trained with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolClassScheme {
    /// Good / Worn / Damaged
    #[default]
    ThreeClass,
    /// Unworn / Worn
    TwoClass,
}

impl ToolClassScheme {
    /// Labels indexed by model class id
    pub fn labels(&self) -> &'static [ToolCondition] {
        match self {
            Self::ThreeClass => &[ToolCondition::Good, ToolCondition::Worn, ToolCondition::Damaged],
            Self::TwoClass => &[ToolCondition::Unworn, ToolCondition::Worn],
        }
    }
}

impl FromStr for ToolClassScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "three" | "3" | "three_class" | "good-worn-damaged" => Ok(Self::ThreeClass),
            "two" | "2" | "two_class" | "unworn-worn" => Ok(Self::TwoClass),
            other => Err(format!("unknown tool class scheme '{}', expected three or two", other)),
        }
    }
}

impl std::fmt::Display for ToolClassScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThreeClass => write!(f, "three"),
            Self::TwoClass => write!(f, "two"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualInspection {
    Passed,
    Failed,
}

impl std::fmt::Display for VisualInspection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "Passed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Decoded prediction, created fresh per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedResult {
    pub tool_condition: ToolCondition,
    pub machining_finalized: bool,
    pub visual_inspection: VisualInspection,
    /// True when a worn tool overrode the model's own visual verdict
    pub visual_override: bool,
}

impl DecodedResult {
    pub fn machining_label(&self) -> &'static str {
        if self.machining_finalized {
            "Yes"
        } else {
            "No"
        }
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Round a probability to 0 or 1; exactly 0.5 rounds up
pub fn round_half_up(p: f32) -> u8 {
    if p >= 0.5 {
        1
    } else {
        0
    }
}

/// Index of the largest value; the first index wins ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Decode raw outputs. Pure function of its inputs.
pub fn decode(raw: &RawPrediction, scheme: ToolClassScheme) -> Result<DecodedResult, PipelineError> {
    let labels = scheme.labels();

    if raw.tool_condition.len() != labels.len() {
        return Err(PipelineError::Shape(format!(
            "tool condition head has {} classes, scheme '{}' expects {}",
            raw.tool_condition.len(),
            scheme,
            labels.len()
        )));
    }

    let all_finite = raw.tool_condition.iter().all(|v| v.is_finite())
        && raw.machining_finalized.is_finite()
        && raw.visual_inspection.is_finite();
    if !all_finite {
        return Err(PipelineError::Prediction("model produced non-finite output".to_string()));
    }

    let tool_index = argmax(&raw.tool_condition)
        .ok_or_else(|| PipelineError::Shape("tool condition head is empty".to_string()))?;
    let tool_condition = labels[tool_index];

    let machining_finalized = round_half_up(raw.machining_finalized) == 1;

    let model_visual = if round_half_up(raw.visual_inspection) == 1 {
        VisualInspection::Passed
    } else {
        VisualInspection::Failed
    };

    // A worn tool is assumed to produce inspection failures
    let (visual_inspection, visual_override) = if tool_condition == ToolCondition::Worn {
        (VisualInspection::Failed, model_visual == VisualInspection::Passed)
    } else {
        (model_visual, false)
    };

    Ok(DecodedResult {
        tool_condition,
        machining_finalized,
        visual_inspection,
        visual_override,
    })
}

// ============================================================================
// TESTS
// ============================================================================
