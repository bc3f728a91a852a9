//! Collision-avoiding label placement for interactive maps
//!
//! Labels arrive in batches from a host map. Each gets a stable id, a screen
//! offset chosen by a greedy candidate search, and optionally a manual offset
//! set by dragging. Placements are saved per map scope.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod drag;
pub mod engine;
mod event_handler;
pub mod font;
pub mod identity;
pub mod layout;
pub mod metrics;
pub mod outcome;
pub mod persistence;
pub mod registry;
pub mod scheduler;
pub mod scope;
pub mod snapping;
pub mod surface;
pub mod types;

pub use config::{EngineConfig, LabelProfile};
pub use engine::{LabelEngine, StyleEdit};
pub use identity::{LabelId, identify};
pub use outcome::Outcome;
pub use scope::Scope;
pub use surface::{HostSurface, InputEvent, MemorySurface};
pub use types::{AnchorPoint, BackgroundStyle, BoundingBox, FontWeight, LabelRequest, LabelStyle, Offset, ScreenPoint};
