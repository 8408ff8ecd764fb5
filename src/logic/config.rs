//! Configuration - Artifact paths and model shape
//!
//! Loaded once at startup from `TOOLWEAR_*` environment variables (a `.env`
//! file is honoured through dotenvy in `main`). CLI flags override afterwards.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use super::error::ArtifactLoadError;
use super::model::{BatchWindow, ModelOptions, ToolClassScheme};
use crate::constants::{DEFAULT_MODEL_PATH, DEFAULT_SCALER_PATH, DEFAULT_TIME_STEPS, ENV_PREFIX};

/// Application configuration
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// ONNX model file
    pub model_path: PathBuf,

    /// Scaler JSON file
    pub scaler_path: PathBuf,

    /// Time steps per prediction (T)
    pub time_steps: usize,

    /// Class layout of the tool-condition head
    pub tool_classes: ToolClassScheme,

    /// How batch uploads are matched against T
    pub batch_window: BatchWindow,

    /// Expected SHA-256 of the model file
    pub model_sha256: Option<String>,

    /// Output names for tool / machining / visual heads
    pub output_names: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
            time_steps: DEFAULT_TIME_STEPS,
            tool_classes: ToolClassScheme::default(),
            batch_window: BatchWindow::default(),
            model_sha256: None,
            output_names: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key → value source (keys without prefix)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            model_path: get("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            scaler_path: get("SCALER_PATH").map(PathBuf::from).unwrap_or(defaults.scaler_path),
            time_steps: parse_or("TIME_STEPS", get("TIME_STEPS"), defaults.time_steps),
            tool_classes: parse_or("TOOL_CLASSES", get("TOOL_CLASSES"), defaults.tool_classes),
            batch_window: parse_or("BATCH_WINDOW", get("BATCH_WINDOW"), defaults.batch_window),
            model_sha256: get("MODEL_SHA256"),
            output_names: get("OUTPUT_NAMES").map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        }
    }

    /// Reject settings no model can run with. Called before any artifact is read.
    pub fn validate(&self) -> Result<(), ArtifactLoadError> {
        if self.time_steps == 0 {
            return Err(ArtifactLoadError::InvalidConfig(format!(
                "{}TIME_STEPS must be at least 1",
                ENV_PREFIX
            )));
        }

        if let Some(names) = &self.output_names {
            if names.len() != 3 {
                return Err(ArtifactLoadError::InvalidConfig(format!(
                    "{}OUTPUT_NAMES needs 3 names (tool, machining, visual), got {}",
                    ENV_PREFIX,
                    names.len()
                )));
            }
        }

        Ok(())
    }

    /// Options handed to the model loader
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            path: self.model_path.clone(),
            time_steps: self.time_steps,
            expected_sha256: self.model_sha256.clone(),
            output_names: self.output_names.clone(),
        }
    }
}

/// Parse a value, falling back to the default with a warning when it is invalid
fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}{}='{}' is invalid ({}), using {}", ENV_PREFIX, name, raw, e, default);
                default
            }
        },
    }
}
