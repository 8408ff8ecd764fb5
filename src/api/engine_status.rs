//! Engine Status - what the shell shows about the loaded artifacts

use serde::{Deserialize, Serialize};

use crate::logic::context::AppContext;
use crate::logic::features::LayoutInfo;
use crate::logic::model::{BatchWindow, ModelMetadata, ToolClassScheme};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub feature_version: u8,
    pub layout_hash: u32,
    pub feature_count: usize,

    pub model: ModelStatus,
    pub scaler: ScalerStatus,
    pub decoding: DecodingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub engine: String, // "onnx" | test backends
    pub loaded: bool,
    pub metadata: Option<ModelMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerStatus {
    pub path: String,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodingStatus {
    pub time_steps: usize,
    pub tool_classes: ToolClassScheme,
    pub tool_labels: Vec<String>,
    pub batch_window: BatchWindow,
    pub rounding: String,
}

impl EngineStatus {
    pub fn collect(ctx: &AppContext) -> Self {
        let layout = LayoutInfo::current();
        let config = ctx.config();
        let predictor = ctx.predictor();

        Self {
            feature_version: layout.version,
            layout_hash: layout.hash,
            feature_count: layout.feature_count,
            model: ModelStatus {
                engine: predictor.backend().to_string(),
                loaded: true,
                metadata: predictor.metadata().cloned(),
            },
            scaler: ScalerStatus {
                path: ctx.scaler().source().display().to_string(),
                feature_names: layout.feature_names,
            },
            decoding: DecodingStatus {
                time_steps: config.time_steps,
                tool_classes: config.tool_classes,
                tool_labels: config
                    .tool_classes
                    .labels()
                    .iter()
                    .map(|l| l.to_string())
                    .collect(),
                batch_window: config.batch_window,
                rounding: "half_up".to_string(),
            },
        }
    }
}
