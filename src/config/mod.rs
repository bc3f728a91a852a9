//! Configuration management for the label engine
//!
//! - **engine**: `EngineConfig`, the JSON config file with defaults and validation
//! - **profile**: `LabelProfile`, the per-map label kind selected at configuration time

pub mod engine;
pub mod profile;

// Re-export commonly used types
pub use engine::EngineConfig;
pub use profile::LabelProfile;
