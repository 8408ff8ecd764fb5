//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The order below is the order the scaler and the LSTM were fit on.
//! Scaler artifacts must list exactly these names in exactly this order,
//! otherwise loading fails.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the model input
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Spindle / machine (0-4) ===
    "feedrate",                 // 0: Programmed feed rate
    "Y1_OutputCurrent",         // 1: Y axis drive output current
    "clamp_pressure",           // 2: Workpiece clamp pressure
    "X1_OutputCurrent",         // 3: X axis drive output current
    "M1_CURRENT_FEEDRATE",      // 4: Spindle current feed rate

    // === Positions (5-9) ===
    "X1_CommandPosition",       // 5
    "X1_ActualPosition",        // 6
    "X1_OutputVoltage",         // 7
    "Y1_CommandPosition",       // 8
    "Y1_ActualPosition",        // 9

    // === X axis dynamics (10-13) ===
    "X1_ActualVelocity",        // 10
    "X1_ActualAcceleration",    // 11
    "X1_CommandVelocity",       // 12
    "X1_CommandAcceleration",   // 13

    // === Electrical (14-15) ===
    "X1_CurrentFeedback",       // 14
    "X1_DCBusVoltage",          // 15
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 16;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches between artifacts and this build
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Check that an artifact was fit on exactly this layout (same names, same order).
///
/// Returns the first position where the orders diverge, if any.
pub fn first_order_mismatch<S: AsRef<str>>(names: &[S]) -> Option<usize> {
    if names.len() != FEATURE_COUNT {
        return Some(names.len().min(FEATURE_COUNT));
    }

    names
        .iter()
        .zip(FEATURE_LAYOUT.iter())
        .position(|(actual, expected)| actual.as_ref() != *expected)
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================
