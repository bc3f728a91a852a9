//! Host rendering surface seam
//!
//! The engine never draws. It asks the host to project anchors, hit-test
//! pointer positions, and move or restyle the labels it manages.

use anyhow::{Result, bail};
use std::collections::BTreeMap;
use tracing::trace;

use crate::identity::LabelId;
use crate::types::{AnchorPoint, BoundingBox, LabelStyle, Offset, ScreenPoint};

/// Pointer and keyboard input delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { position: ScreenPoint },
    PointerMove { position: ScreenPoint },
    PointerUp { position: ScreenPoint },
    PointerLeave { position: ScreenPoint },
    Escape,
}

pub trait HostSurface {
    /// Screen position of `anchor`, or None when it cannot be projected
    fn anchor_to_screen(&self, anchor: AnchorPoint) -> Option<ScreenPoint>;

    /// Label drawn at `point`, if any
    fn hit_test(&self, point: ScreenPoint) -> Option<LabelId>;

    /// Move a label; `bounds` is its resulting box on screen
    fn apply_offset(&mut self, id: &LabelId, offset: Offset, bounds: BoundingBox) -> Result<()>;

    fn apply_style(&mut self, id: &LabelId, style: &LabelStyle, visible: bool) -> Result<()>;

    /// Pan/zoom gestures are turned off while a label is being dragged
    fn set_navigation_enabled(&mut self, enabled: bool);
}

/// What a [`MemorySurface`] knows about one label
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLabel {
    pub offset: Offset,
    pub bounds: BoundingBox,
    pub style: Option<LabelStyle>,
    pub visible: bool,
}

/// Planar in-memory host: `screen = origin + (lng, lat) * scale`.
/// Used by the CLI and by tests.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    scale: f32,
    origin: ScreenPoint,
    labels: BTreeMap<LabelId, SurfaceLabel>,
    navigation_enabled: bool,
    available: bool,
    offset_updates: usize,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::with_projection(1.0, ScreenPoint::new(0.0, 0.0))
    }

    pub fn with_projection(scale: f32, origin: ScreenPoint) -> Self {
        Self {
            scale,
            origin,
            labels: BTreeMap::new(),
            navigation_enabled: true,
            available: true,
            offset_updates: 0,
        }
    }

    /// Simulate the host going away; every mutation then fails
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn label(&self, id: &LabelId) -> Option<&SurfaceLabel> {
        self.labels.get(id)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&LabelId, &SurfaceLabel)> {
        self.labels.iter()
    }

    pub fn navigation_enabled(&self) -> bool {
        self.navigation_enabled
    }

    /// Number of offset updates applied so far
    pub fn offset_updates(&self) -> usize {
        self.offset_updates
    }
}

impl HostSurface for MemorySurface {
    fn anchor_to_screen(&self, anchor: AnchorPoint) -> Option<ScreenPoint> {
        if !anchor.is_finite() {
            return None;
        }
        Some(ScreenPoint::new(
            self.origin.x + anchor.lng as f32 * self.scale,
            self.origin.y + anchor.lat as f32 * self.scale,
        ))
    }

    fn hit_test(&self, point: ScreenPoint) -> Option<LabelId> {
        self.labels
            .iter()
            .find(|(_, label)| label.visible && label.bounds.contains(point))
            .map(|(id, _)| id.clone())
    }

    fn apply_offset(&mut self, id: &LabelId, offset: Offset, bounds: BoundingBox) -> Result<()> {
        if !self.available {
            bail!("surface unavailable");
        }
        trace!(label = %id, x = offset.x, y = offset.y, "Surface offset applied");
        let label = self.labels.entry(id.clone()).or_insert(SurfaceLabel {
            offset,
            bounds,
            style: None,
            visible: true,
        });
        label.offset = offset;
        label.bounds = bounds;
        self.offset_updates += 1;
        Ok(())
    }

    fn apply_style(&mut self, id: &LabelId, style: &LabelStyle, visible: bool) -> Result<()> {
        if !self.available {
            bail!("surface unavailable");
        }
        let Some(label) = self.labels.get_mut(id) else {
            bail!("label {} is not on the surface", id);
        };
        label.style = Some(style.clone());
        label.visible = visible;
        Ok(())
    }

    fn set_navigation_enabled(&mut self, enabled: bool) {
        self.navigation_enabled = enabled;
    }
}
