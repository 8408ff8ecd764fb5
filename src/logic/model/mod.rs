//! Model Module - AI/ML Inference Engine
//!
//! Scaler → sequence → predictor → decoder.
//! Dễ dàng swap model: mọi thứ phía sau trait `Predictor`.

pub mod decoder;
pub mod inference;
pub mod scaler;
pub mod sequence;

// Re-export common types
pub use decoder::{DecodedResult, ToolClassScheme, ToolCondition, VisualInspection};
pub use inference::{ModelMetadata, ModelOptions, OnnxPredictor, Predictor, RawPrediction};
pub use scaler::ScalerState;
pub use sequence::{BatchWindow, SequenceTensor};
