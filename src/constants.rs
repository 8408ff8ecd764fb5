//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Artifact paths and the sequence length are the only knobs most
//! deployments ever touch.

/// Default ONNX model path (Keras LSTM exported with tf2onnx)
pub const DEFAULT_MODEL_PATH: &str = "my_lstm_model.onnx";

/// Default scaler artifact path (JSON export of the fitted scaler)
pub const DEFAULT_SCALER_PATH: &str = "scaler.json";

/// Default number of time steps the model was trained on (T)
pub const DEFAULT_TIME_STEPS: usize = 10;

/// Prefix shared by every environment variable we read
pub const ENV_PREFIX: &str = "TOOLWEAR_";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "CNC Tool Wear Prediction";
