use std::collections::HashMap;
use tracing::trace;

use crate::constants::scoring::{
    BACKGROUND_FACTOR, BASE_FONT_SIZE, BELOW_PENALTY, BOLD_FACTOR, DISTANCE_PENALTY, LEFT_PENALTY, SCORE_CEILING,
    TEXT_LENGTH_CAP, TEXT_LENGTH_FACTOR,
};
use crate::identity::LabelId;
use crate::types::{BoundingBox, LabelStyle, Offset};

/// Importance of a label: visually dominant labels weigh more, so others move
/// out of their way
pub fn importance_weight(style: &LabelStyle, text: &str) -> f32 {
    let mut weight = style.font_size.max(0.0) / BASE_FONT_SIZE;
    if style.font_weight.is_bold() {
        weight *= BOLD_FACTOR;
    }
    if style.background.enabled {
        weight *= BACKGROUND_FACTOR;
    }
    let length = text.chars().count().min(TEXT_LENGTH_CAP) as f32;
    weight * (1.0 + length / TEXT_LENGTH_CAP as f32 * TEXT_LENGTH_FACTOR)
}

/// Preference for staying put, then above, then right
pub fn position_penalty(offset: Offset) -> f32 {
    let mut penalty = offset.length_squared() * DISTANCE_PENALTY;
    if offset.y < 0.0 {
        penalty += BELOW_PENALTY;
    }
    if offset.x < 0.0 {
        penalty += LEFT_PENALTY;
    }
    penalty
}

/// Scores candidate boxes and owns the importance-weight side table
#[derive(Debug, Default)]
pub struct CollisionScorer {
    weights: HashMap<LabelId, f32>,
}

impl CollisionScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached weight for `id`, computed on first use
    pub fn weight(&mut self, id: &LabelId, style: &LabelStyle, text: &str) -> f32 {
        if let Some(weight) = self.weights.get(id) {
            return *weight;
        }
        let weight = importance_weight(style, text);
        trace!(label = %id, weight = weight, "Computed importance weight");
        self.weights.insert(id.clone(), weight);
        weight
    }

    /// Drop a cached weight after a style change
    pub fn invalidate(&mut self, id: &LabelId) {
        self.weights.remove(id);
    }

    pub fn clear(&mut self) {
        self.weights.clear();
    }

    pub fn cached_weights(&self) -> usize {
        self.weights.len()
    }

    /// Weighted overlap of `candidate` with `others`, plus the position
    /// penalty of `offset`. Zero means no overlap at the anchor.
    pub fn score(&self, candidate: &BoundingBox, offset: Offset, others: &[(BoundingBox, f32)]) -> f32 {
        let mut overlap = 0.0;
        for (other, weight) in others {
            overlap += candidate.overlap_area(other) * weight;
            if overlap > SCORE_CEILING {
                overlap = SCORE_CEILING;
                break;
            }
        }
        overlap + position_penalty(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BackgroundStyle, FontWeight};

    fn style(size: f32, weight: FontWeight, background: bool) -> LabelStyle {
        let background = if background { BackgroundStyle::enabled() } else { BackgroundStyle::disabled() };
        LabelStyle::new(size, weight, background)
    }

    #[test]
    fn test_weight_increases_with_emphasis() {
        let base = importance_weight(&style(10.0, FontWeight::Normal, false), "Oakland");
        assert!(importance_weight(&style(12.0, FontWeight::Normal, false), "Oakland") > base);
        assert!(importance_weight(&style(10.0, FontWeight::Bold, false), "Oakland") > base);
        assert!(importance_weight(&style(10.0, FontWeight::Normal, true), "Oakland") > base);
        assert!(importance_weight(&style(10.0, FontWeight::Normal, false), "Oakland Hills") > base);
    }

    #[test]
    fn test_text_length_contribution_is_capped() {
        let s = style(10.0, FontWeight::Normal, false);
        let capped = importance_weight(&s, &"x".repeat(30));
        assert_eq!(importance_weight(&s, &"x".repeat(200)), capped);
        assert!((capped - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_position_penalty_prefers_above_right() {
        assert_eq!(position_penalty(Offset::ZERO), 0.0);
        let up = position_penalty(Offset::new(0.0, 12.0));
        let down = position_penalty(Offset::new(0.0, -12.0));
        let right = position_penalty(Offset::new(12.0, 0.0));
        let left = position_penalty(Offset::new(-12.0, 0.0));
        assert!(up < down);
        assert!(right < left);
        assert!(up < position_penalty(Offset::new(0.0, 20.0)));
    }

    #[test]
    fn test_score_zero_without_overlap() {
        let scorer = CollisionScorer::new();
        let candidate = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let others = [(BoundingBox::new(20.0, 0.0, 10.0, 10.0), 2.0)];
        assert_eq!(scorer.score(&candidate, Offset::ZERO, &others), 0.0);
    }

    #[test]
    fn test_score_weights_overlap_area() {
        let scorer = CollisionScorer::new();
        let candidate = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let others = [
            (BoundingBox::new(5.0, 5.0, 10.0, 10.0), 2.0),
            (BoundingBox::new(0.0, 8.0, 10.0, 10.0), 0.5),
        ];
        // 25 * 2.0 + 20 * 0.5
        assert_eq!(scorer.score(&candidate, Offset::ZERO, &others), 60.0);
    }

    #[test]
    fn test_score_stops_at_ceiling() {
        let scorer = CollisionScorer::new();
        let candidate = BoundingBox::new(0.0, 0.0, 2000.0, 2000.0);
        let others = vec![(candidate, 1.0); 4];
        assert_eq!(scorer.score(&candidate, Offset::ZERO, &others), SCORE_CEILING);
    }

    #[test]
    fn test_weight_side_table_invalidation() {
        let mut scorer = CollisionScorer::new();
        let id = LabelId::new("a");
        let normal = style(10.0, FontWeight::Normal, false);
        let bold = style(10.0, FontWeight::Bold, false);

        let first = scorer.weight(&id, &normal, "Alameda");
        // Cached value wins until invalidated
        assert_eq!(scorer.weight(&id, &bold, "Alameda"), first);
        scorer.invalidate(&id);
        assert!(scorer.weight(&id, &bold, "Alameda") > first);
        assert_eq!(scorer.cached_weights(), 1);
    }
}
