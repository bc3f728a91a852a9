//! Greedy placement of labels in priority order
//!
//! Labels that have never been placed are positioned one at a time, largest
//! first, each scored against the labels already settled (full weight) and
//! those still waiting (half weight). A global pass that re-places every
//! movable label only runs when a cheap pre-check finds enough overlapping
//! pairs in the batch.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::constants::optimizer::{GLOBAL_PASS_FRACTION, GLOBAL_PASS_MAX_PAIRS};
use crate::constants::scoring::UNPLACED_WEIGHT_FACTOR;
use crate::identity::LabelId;
use crate::layout::candidates::CandidatePatterns;
use crate::layout::scoring::CollisionScorer;
use crate::metrics::TextSize;
use crate::types::{BoundingBox, Offset, ScreenPoint};

/// One label as the optimizer sees it
#[derive(Debug, Clone)]
pub struct LayoutItem {
    pub id: LabelId,
    /// Projected anchor position on the surface
    pub anchor: ScreenPoint,
    /// Label box size including padding and halo
    pub size: TextSize,
    pub weight: f32,
    /// Sort key, larger is placed first
    pub priority: f32,
    pub offset: Offset,
    /// Already positioned by an earlier batch
    pub placed: bool,
}

impl LayoutItem {
    pub fn bounding_box(&self, offset: Offset) -> BoundingBox {
        BoundingBox::centered(self.anchor.displaced(offset), self.size.width, self.size.height)
    }
}

/// Score of the chosen offset next to the score the label had at its anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementScore {
    pub chosen: f32,
    pub at_anchor: f32,
    pub attempts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutStats {
    pub labels: usize,
    pub optimized: usize,
    pub overlapping_before: usize,
    pub overlapping_after: usize,
    pub global_pass: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OptimizedLayout {
    pub offsets: HashMap<LabelId, Offset>,
    pub scores: HashMap<LabelId, PlacementScore>,
    pub stats: LayoutStats,
}

#[derive(Debug, Clone)]
pub struct PlacementOptimizer {
    patterns: CandidatePatterns,
    good_enough_score: f32,
    max_attempts: usize,
}

/// Pairs of boxes with a positive overlap area
pub fn count_overlapping_pairs(boxes: &[BoundingBox]) -> usize {
    let mut pairs = 0;
    for (i, a) in boxes.iter().enumerate() {
        pairs += boxes[i + 1..].iter().filter(|b| a.intersects(b)).count();
    }
    pairs
}

/// Global pass threshold: min(ceil(0.2 * N), 5) overlapping pairs
pub fn should_run_global_pass(overlapping_pairs: usize, label_count: usize) -> bool {
    if label_count == 0 {
        return false;
    }
    let threshold = ((label_count as f32 * GLOBAL_PASS_FRACTION).ceil() as usize).min(GLOBAL_PASS_MAX_PAIRS);
    overlapping_pairs >= threshold.max(1)
}

/// Indices sorted by descending priority; equal priorities keep input order
fn priority_order(items: &[LayoutItem]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].priority.total_cmp(&items[a].priority));
    order
}

impl PlacementOptimizer {
    pub fn new(patterns: CandidatePatterns, good_enough_score: f32, max_attempts: usize) -> Self {
        Self {
            patterns,
            good_enough_score,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn patterns(&self) -> &CandidatePatterns {
        &self.patterns
    }

    /// Place `items`; `fixed` labels (manual overrides) are obstacles only.
    pub fn optimize(&self, scorer: &CollisionScorer, items: &[LayoutItem], fixed: &[LayoutItem]) -> OptimizedLayout {
        let mut offsets: Vec<Offset> = items.iter().map(|item| item.offset).collect();
        let mut scores = HashMap::new();
        let order = priority_order(items);
        let label_count = items.len() + fixed.len();
        let overlapping_before = self.count_pairs(items, &offsets, fixed);

        // Local pass: only labels never placed before
        let mut settled: Vec<bool> = items.iter().map(|item| item.placed).collect();
        let mut optimized = 0;
        for &idx in &order {
            if settled[idx] {
                continue;
            }
            let (offset, score) = self.place(scorer, idx, items, &offsets, &settled, fixed);
            offsets[idx] = offset;
            scores.insert(items[idx].id.clone(), score);
            settled[idx] = true;
            optimized += 1;
        }

        let pairs = self.count_pairs(items, &offsets, fixed);
        let global_pass = should_run_global_pass(pairs, label_count);
        if global_pass {
            debug!(pairs = pairs, labels = label_count, "Running global placement pass");
            let mut settled = vec![false; items.len()];
            for &idx in &order {
                let (offset, score) = self.place(scorer, idx, items, &offsets, &settled, fixed);
                offsets[idx] = offset;
                scores.insert(items[idx].id.clone(), score);
                settled[idx] = true;
            }
            optimized = items.len();
        }

        let stats = LayoutStats {
            labels: label_count,
            optimized,
            overlapping_before,
            overlapping_after: self.count_pairs(items, &offsets, fixed),
            global_pass,
        };
        info!(
            labels = stats.labels,
            optimized = stats.optimized,
            overlapping_before = stats.overlapping_before,
            overlapping_after = stats.overlapping_after,
            global_pass = stats.global_pass,
            "Optimized label layout"
        );

        OptimizedLayout {
            offsets: items.iter().map(|item| item.id.clone()).zip(offsets).collect(),
            scores,
            stats,
        }
    }

    fn place(
        &self,
        scorer: &CollisionScorer,
        idx: usize,
        items: &[LayoutItem],
        offsets: &[Offset],
        settled: &[bool],
        fixed: &[LayoutItem],
    ) -> (Offset, PlacementScore) {
        let item = &items[idx];
        let mut others: Vec<(BoundingBox, f32)> = fixed
            .iter()
            .map(|other| (other.bounding_box(other.offset), other.weight))
            .collect();
        for (j, other) in items.iter().enumerate() {
            if j == idx {
                continue;
            }
            let factor = if settled[j] { 1.0 } else { UNPLACED_WEIGHT_FACTOR };
            others.push((other.bounding_box(offsets[j]), other.weight * factor));
        }

        let mut best = (Offset::ZERO, f32::INFINITY);
        let mut at_anchor = f32::INFINITY;
        let mut attempts = 0;
        for candidate in self.patterns.patterns().iter().take(self.max_attempts) {
            attempts += 1;
            let score = scorer.score(&item.bounding_box(*candidate), *candidate, &others);
            if candidate.is_zero() {
                at_anchor = score;
            }
            // Strict comparison keeps the earlier candidate on ties
            if score < best.1 {
                best = (*candidate, score);
            }
            if score <= self.good_enough_score {
                break;
            }
        }

        debug!(label = %item.id, x = best.0.x, y = best.0.y, score = best.1, attempts = attempts, "Placed label");
        (
            best.0,
            PlacementScore {
                chosen: best.1,
                at_anchor,
                attempts,
            },
        )
    }

    fn count_pairs(&self, items: &[LayoutItem], offsets: &[Offset], fixed: &[LayoutItem]) -> usize {
        let boxes: Vec<BoundingBox> = items
            .iter()
            .zip(offsets)
            .map(|(item, offset)| item.bounding_box(*offset))
            .chain(fixed.iter().map(|item| item.bounding_box(item.offset)))
            .collect();
        count_overlapping_pairs(&boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::candidates::{ANGLES_PER_RING, RING_RADII};
    use crate::constants::optimizer::{GOOD_ENOUGH_SCORE, MAX_ATTEMPTS};

    fn optimizer() -> PlacementOptimizer {
        PlacementOptimizer::new(CandidatePatterns::new(&RING_RADII, ANGLES_PER_RING), GOOD_ENOUGH_SCORE, MAX_ATTEMPTS)
    }

    fn item(id: &str, x: f32, y: f32, width: f32, height: f32, weight: f32) -> LayoutItem {
        LayoutItem {
            id: LabelId::new(id),
            anchor: ScreenPoint::new(x, y),
            size: TextSize { width, height },
            weight,
            priority: width * height,
            offset: Offset::ZERO,
            placed: false,
        }
    }

    fn final_boxes(items: &[LayoutItem], layout: &OptimizedLayout) -> Vec<BoundingBox> {
        items.iter().map(|i| i.bounding_box(layout.offsets[&i.id])).collect()
    }

    #[test]
    fn test_global_pass_threshold() {
        assert!(!should_run_global_pass(0, 0));
        assert!(should_run_global_pass(1, 3));
        assert!(!should_run_global_pass(0, 3));
        // ceil(0.2 * 20) = 4
        assert!(!should_run_global_pass(3, 20));
        assert!(should_run_global_pass(4, 20));
        // capped at 5 pairs
        assert!(should_run_global_pass(5, 100));
        assert!(!should_run_global_pass(4, 100));
    }

    #[test]
    fn test_count_overlapping_pairs() {
        let boxes = [
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(5.0, 5.0, 10.0, 10.0),
            BoundingBox::new(8.0, 8.0, 10.0, 10.0),
            BoundingBox::new(100.0, 100.0, 10.0, 10.0),
        ];
        assert_eq!(count_overlapping_pairs(&boxes), 3);
    }

    #[test]
    fn test_isolated_labels_stay_at_anchor() {
        let items = vec![item("a", 0.0, 0.0, 40.0, 12.0, 1.0), item("b", 200.0, 0.0, 40.0, 12.0, 1.0)];
        let layout = optimizer().optimize(&CollisionScorer::new(), &items, &[]);
        assert_eq!(layout.offsets[&LabelId::new("a")], Offset::ZERO);
        assert_eq!(layout.offsets[&LabelId::new("b")], Offset::ZERO);
        assert!(!layout.stats.global_pass);
    }

    #[test]
    fn test_reoptimizing_non_overlapping_set_is_stable() {
        let mut items = vec![
            item("a", 100.0, 100.0, 45.0, 13.0, 1.1),
            item("b", 100.0, 100.0, 45.0, 13.0, 1.1),
            item("c", 300.0, 300.0, 60.0, 15.0, 1.5),
        ];
        let opt = optimizer();
        let scorer = CollisionScorer::new();
        let first = opt.optimize(&scorer, &items, &[]);
        // "a" wins the tie and clears "b" on the 20px ring straight up
        assert_eq!(first.offsets[&LabelId::new("a")], Offset::new(0.0, 20.0));
        assert_eq!(first.offsets[&LabelId::new("b")], Offset::ZERO);
        assert_eq!(first.stats.overlapping_after, 0);

        for item in &mut items {
            item.offset = first.offsets[&item.id];
            item.placed = true;
        }
        let second = opt.optimize(&scorer, &items, &[]);
        assert_eq!(second.offsets, first.offsets);
        assert_eq!(second.stats.optimized, 0);
    }

    #[test]
    fn test_chosen_score_never_worse_than_anchor() {
        let items: Vec<LayoutItem> = (0..6)
            .map(|i| item(&format!("l{}", i), 100.0 + i as f32 * 4.0, 100.0 + i as f32 * 3.0, 50.0, 14.0, 1.2))
            .collect();
        let layout = optimizer().optimize(&CollisionScorer::new(), &items, &[]);
        for score in layout.scores.values() {
            assert!(score.chosen <= score.at_anchor);
        }
    }

    #[test]
    fn test_larger_label_placed_first() {
        // "big" goes first and steps above the waiting "near" label, which
        // then fits at its anchor
        let big = item("big", 100.0, 100.0, 100.0, 15.0, 2.0);
        let small = item("small", 100.0, 200.0, 45.0, 13.0, 1.1);
        let near = item("near", 110.0, 104.0, 45.0, 13.0, 1.1);
        let items = vec![small, near, big];
        let layout = optimizer().optimize(&CollisionScorer::new(), &items, &[]);
        let boxes = final_boxes(&items, &layout);
        assert_eq!(count_overlapping_pairs(&boxes), 0);
        assert_eq!(layout.offsets[&LabelId::new("big")], Offset::new(0.0, 12.0));
        assert_eq!(layout.offsets[&LabelId::new("near")], Offset::ZERO);
        assert_eq!(layout.offsets[&LabelId::new("small")], Offset::ZERO);
    }

    #[test]
    fn test_fixed_labels_are_obstacles_only() {
        let fixed = item("fixed", 100.0, 100.0, 60.0, 14.0, 1.0);
        let movable = item("movable", 100.0, 100.0, 60.0, 14.0, 1.0);
        let layout = optimizer().optimize(&CollisionScorer::new(), std::slice::from_ref(&movable), &[fixed.clone()]);

        assert!(!layout.offsets.contains_key(&fixed.id));
        let moved = movable.bounding_box(layout.offsets[&movable.id]);
        assert!(!moved.intersects(&fixed.bounding_box(fixed.offset)));
    }

    #[test]
    fn test_equal_priority_keeps_input_order() {
        let items = vec![item("first", 0.0, 0.0, 10.0, 10.0, 1.0), item("second", 0.0, 0.0, 10.0, 10.0, 1.0)];
        assert_eq!(priority_order(&items), vec![0, 1]);
    }
}
