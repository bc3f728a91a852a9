use std::time::Instant;
use tracing::debug;

use crate::drag::DragOutcome;
use crate::engine::LabelEngine;
use crate::outcome::Outcome;
use crate::surface::{HostSurface, InputEvent};

/// Route one input event through the drag controller and apply its effect
pub fn handle_event<S: HostSurface>(engine: &mut LabelEngine<S>, event: InputEvent, now: Instant) -> Outcome {
    let drag_outcome = match event {
        InputEvent::PointerDown { position } => {
            let hit = engine.hit_label(position);
            engine.drag_controller().pointer_down(position, hit)
        }
        InputEvent::PointerMove { position } => engine.drag_controller().pointer_move(position, now),
        InputEvent::PointerUp { position } => engine.drag_controller().pointer_up(position),
        InputEvent::PointerLeave { position } => engine.drag_controller().pointer_leave(position),
        InputEvent::Escape => engine.drag_controller().escape(),
    };

    let result = match drag_outcome {
        DragOutcome::None => return Outcome::ok("No change"),
        DragOutcome::Ignored => {
            debug!(?event, "Input ignored while a drag is active");
            return Outcome::ok("Ignored while dragging");
        }
        DragOutcome::Selected { label_id } => {
            // Map pan would fight the drag
            engine.set_navigation(false);
            Ok(format!("Selected {}", label_id))
        }
        DragOutcome::Deselected { label_id } => {
            engine.set_navigation(true);
            Ok(format!("Deselected {}", label_id))
        }
        DragOutcome::Moved { label_id, offset } => engine
            .preview_drag(&label_id, offset)
            .map(|shown| format!("Moved {} to ({:.1}, {:.1})", label_id, shown.x, shown.y)),
        DragOutcome::Committed { label_id, offset } => {
            engine.set_navigation(true);
            engine
                .commit_drag(&label_id, offset, now)
                .map(|saved| format!("Placed {} at ({:.1}, {:.1})", label_id, saved.x, saved.y))
        }
        DragOutcome::Cancelled { label_id, offset } => {
            engine.set_navigation(true);
            engine.restore_label(&label_id, offset).map(|()| format!("Restored {}", label_id))
        }
    };

    match result {
        Ok(message) => Outcome::ok(message),
        Err(e) => Outcome::from_error(&e),
    }
}
