//! Pointer-driven manual placement
//!
//! `Idle -> Selected -> Dragging -> Idle`, or `Selected -> Idle` on deselect.
//! At most one session exists; it lives inside the state, so a second
//! selection cannot start while a drag is in progress.

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::identity::LabelId;
use crate::types::{Offset, ScreenPoint};

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub label_id: LabelId,
    /// Offset when the label was selected; restored on cancel
    pub original_offset: Offset,
    pub start_pointer: ScreenPoint,
    pub current_offset: Offset,
    /// Pointer button is held
    pressed: bool,
    last_update: Option<Instant>,
}

impl DragSession {
    fn new(label_id: LabelId, offset: Offset, pointer: ScreenPoint) -> Self {
        Self {
            label_id,
            original_offset: offset,
            start_pointer: pointer,
            current_offset: offset,
            pressed: true,
            last_update: None,
        }
    }

    /// Baseline plus pointer travel, with screen y flipped to offset y
    pub fn offset_at(&self, pointer: ScreenPoint) -> Offset {
        Offset::new(
            self.original_offset.x + (pointer.x - self.start_pointer.x),
            self.original_offset.y - (pointer.y - self.start_pointer.y),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Selected(DragSession),
    Dragging(DragSession),
}

/// What the host should do after an input
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    None,
    Selected { label_id: LabelId },
    Deselected { label_id: LabelId },
    /// Apply `offset` to the label now
    Moved { label_id: LabelId, offset: Offset },
    /// Drag finished; persist `offset`
    Committed { label_id: LabelId, offset: Offset },
    /// Drag aborted; put the label back at `offset`
    Cancelled { label_id: LabelId, offset: Offset },
    /// Input arrived in a state that does not accept it
    Ignored,
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    move_threshold: f32,
    min_update_interval: Duration,
}

impl DragController {
    pub fn new(move_threshold: f32, min_update_interval: Duration) -> Self {
        Self {
            state: DragState::Idle,
            move_threshold: move_threshold.max(0.0),
            min_update_interval,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Idle => None,
            DragState::Selected(session) | DragState::Dragging(session) => Some(session),
        }
    }

    /// A label is selected or being dragged
    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// `hit` is the label under the pointer (already filtered to the active
    /// scope) together with its current offset
    pub fn pointer_down(&mut self, position: ScreenPoint, hit: Option<(LabelId, Offset)>) -> DragOutcome {
        if self.is_dragging() {
            return DragOutcome::Ignored;
        }
        if let Some((label_id, offset)) = hit {
            debug!(label = %label_id, x = position.x, y = position.y, "Label selected");
            self.state = DragState::Selected(DragSession::new(label_id.clone(), offset, position));
            return DragOutcome::Selected { label_id };
        }
        match std::mem::take(&mut self.state) {
            DragState::Selected(session) => DragOutcome::Deselected {
                label_id: session.label_id,
            },
            _ => DragOutcome::None,
        }
    }

    pub fn pointer_move(&mut self, position: ScreenPoint, now: Instant) -> DragOutcome {
        let threshold = self.move_threshold;
        let interval = self.min_update_interval;
        let started = match &mut self.state {
            DragState::Idle => return DragOutcome::None,
            DragState::Selected(session) => {
                if !session.pressed || session.start_pointer.distance_to(position) <= threshold {
                    return DragOutcome::None;
                }
                let mut session = session.clone();
                session.current_offset = session.offset_at(position);
                session.last_update = Some(now);
                session
            }
            DragState::Dragging(session) => {
                let offset = session.offset_at(position);
                session.current_offset = offset;
                if let Some(last) = session.last_update
                    && now.saturating_duration_since(last) < interval
                {
                    return DragOutcome::None;
                }
                session.last_update = Some(now);
                return DragOutcome::Moved {
                    label_id: session.label_id.clone(),
                    offset,
                };
            }
        };

        info!(label = %started.label_id, "Drag started");
        let outcome = DragOutcome::Moved {
            label_id: started.label_id.clone(),
            offset: started.current_offset,
        };
        self.state = DragState::Dragging(started);
        outcome
    }

    /// Pointer released over the surface
    pub fn pointer_up(&mut self, position: ScreenPoint) -> DragOutcome {
        if self.is_dragging() {
            return self.commit(position);
        }
        if let DragState::Selected(session) = &mut self.state {
            // Click without drag keeps the selection
            session.pressed = false;
        }
        DragOutcome::None
    }

    /// Pointer left the surface; an active drag is committed where it is
    pub fn pointer_leave(&mut self, position: ScreenPoint) -> DragOutcome {
        if self.is_dragging() {
            return self.commit(position);
        }
        DragOutcome::None
    }

    pub fn escape(&mut self) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragOutcome::None,
            DragState::Selected(session) => DragOutcome::Deselected {
                label_id: session.label_id,
            },
            DragState::Dragging(session) => {
                info!(label = %session.label_id, x = session.original_offset.x, y = session.original_offset.y, "Drag cancelled");
                DragOutcome::Cancelled {
                    label_id: session.label_id,
                    offset: session.original_offset,
                }
            }
        }
    }

    /// Drop any session without an outcome (scope change, drag mode off)
    pub fn reset(&mut self) -> Option<DragSession> {
        match std::mem::take(&mut self.state) {
            DragState::Idle => None,
            DragState::Selected(session) | DragState::Dragging(session) => Some(session),
        }
    }

    fn commit(&mut self, position: ScreenPoint) -> DragOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return DragOutcome::None;
        };
        let offset = session.offset_at(position);
        info!(label = %session.label_id, x = offset.x, y = offset.y, "Drag committed");
        DragOutcome::Committed {
            label_id: session.label_id,
            offset,
        }
    }
}
