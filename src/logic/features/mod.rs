//! Features Module - Feature schema and input shaping
//!
//! Layout, vector and table types plus the schema validator.
//! Nothing here knows about the model or the scaler.

pub mod layout;
pub mod schema;
pub mod table;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT};
pub use schema::required_features;
pub use table::FeatureTable;
pub use vector::FeatureVector;
