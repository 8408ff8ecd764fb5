//! Logic Module - Inference pipeline
//!
//! Chứa toàn bộ pipeline: schema → scaler → sequence → model → decoder.
//!
//! ## Layout
//! - `features/` - Feature schema, vectors, CSV tables
//! - `model/` - Scaler, sequence builder, ONNX predictor, decoder
//! - `pipeline` - Request orchestration
//! - `context` - Artifacts loaded once at startup

pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;

pub mod features;
pub mod model;

#[cfg(test)]
pub(crate) mod test_support;
