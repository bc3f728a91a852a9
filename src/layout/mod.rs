//! Collision-avoiding label placement

pub mod candidates;
pub mod optimizer;
pub mod scoring;

pub use candidates::CandidatePatterns;
pub use optimizer::{LayoutItem, LayoutStats, OptimizedLayout, PlacementOptimizer};
pub use scoring::CollisionScorer;
