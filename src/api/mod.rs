//! API Module
//!
//! Request boundary between the presentation shell and the inference
//! pipeline. Every per-request failure is caught here and turned into a
//! message; nothing below this layer talks to the user.
//!
//! Structure:
//! - commands.rs: prediction requests, manual form, schema listing
//! - engine_status.rs: loaded artifact information

pub mod commands;
pub mod engine_status;

pub use commands::*;
pub use engine_status::EngineStatus;
