use crate::identity::LabelId;
use crate::types::BoundingBox;

#[derive(Debug)]
struct SnapCandidate {
    delta: f32,
    distance: f32,
}

/// Find the best snap adjustment for a dragged label box.
/// Returns the screen (dx, dy) to add to the box if snapping should occur.
pub fn find_snap_delta(dragged: BoundingBox, others: &[(LabelId, BoundingBox)], threshold: f32) -> Option<(f32, f32)> {
    if threshold <= 0.0 {
        return None; // Snapping disabled
    }

    let mut best_x: Option<SnapCandidate> = None;
    let mut best_y: Option<SnapCandidate> = None;

    for (_, other) in others {
        // Left edge to right edge, right edge to left edge, then alignments
        check_snap(&mut best_x, dragged.left(), other.right(), threshold);
        check_snap(&mut best_x, dragged.right(), other.left(), threshold);
        check_snap(&mut best_x, dragged.left(), other.left(), threshold);
        check_snap(&mut best_x, dragged.right(), other.right(), threshold);

        check_snap(&mut best_y, dragged.top(), other.bottom(), threshold);
        check_snap(&mut best_y, dragged.bottom(), other.top(), threshold);
        check_snap(&mut best_y, dragged.top(), other.top(), threshold);
        check_snap(&mut best_y, dragged.bottom(), other.bottom(), threshold);
    }

    match (best_x, best_y) {
        (None, None) => None,
        (x, y) => Some((x.map_or(0.0, |s| s.delta), y.map_or(0.0, |s| s.delta))),
    }
}

fn check_snap(best: &mut Option<SnapCandidate>, edge: f32, target: f32, threshold: f32) {
    let distance = (edge - target).abs();
    if distance <= threshold {
        let candidate = SnapCandidate {
            delta: target - edge,
            distance,
        };

        // Keep this candidate if it's closer than the current best
        if best.as_ref().is_none_or(|b| candidate.distance < b.distance) {
            *best = Some(candidate);
        }
    }
}
