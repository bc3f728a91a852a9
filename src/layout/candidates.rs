use tracing::debug;

use crate::constants::candidates::{DEDUP_EPSILON, STRATEGIC_OFFSETS};
use crate::types::Offset;

/// Precomputed offsets tried, in order, when placing a label.
/// The first entry is always the zero offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePatterns {
    patterns: Vec<Offset>,
}

/// Round to 1/1000 px so trigonometric noise does not produce
/// near-duplicates (adding 0.0 turns -0.0 into 0.0)
fn snap(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0 + 0.0
}

impl CandidatePatterns {
    /// Rings are walked innermost first. Each ring starts straight above the
    /// anchor and proceeds clockwise.
    pub fn new(ring_radii: &[f32], angles_per_ring: usize) -> Self {
        let mut patterns = vec![Offset::ZERO];
        let angles = angles_per_ring.max(1);

        for &radius in ring_radii {
            if !(radius.is_finite() && radius > 0.0) {
                continue;
            }
            for k in 0..angles {
                let theta = std::f32::consts::FRAC_PI_2 - (k as f32) * std::f32::consts::TAU / angles as f32;
                push_unique(&mut patterns, Offset::new(snap(radius * theta.cos()), snap(radius * theta.sin())));
            }
        }

        for &(dx, dy) in STRATEGIC_OFFSETS {
            push_unique(&mut patterns, Offset::new(dx, dy));
        }

        debug!(count = patterns.len(), rings = ring_radii.len(), angles = angles, "Built candidate patterns");
        Self { patterns }
    }

    pub fn patterns(&self) -> &[Offset] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn push_unique(patterns: &mut Vec<Offset>, candidate: Offset) {
    let duplicate = patterns
        .iter()
        .any(|p| (p.x - candidate.x).abs() < DEDUP_EPSILON && (p.y - candidate.y).abs() < DEDUP_EPSILON);
    if !duplicate {
        patterns.push(candidate);
    }
}
