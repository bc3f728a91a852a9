//! Label layout engine
//!
//! One engine serves one host map at a time. It owns the label registry, the
//! placement records, the metrics cache and the cooperative timers. Public
//! operations report storage and surface failures through [`Outcome`]; the
//! in-memory records stay authoritative when storage fails.

use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::constants::validation::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::drag::{DragController, DragState};
use crate::event_handler;
use crate::identity::{LabelId, identify};
use crate::layout::{CandidatePatterns, CollisionScorer, LayoutItem, LayoutStats, PlacementOptimizer};
use crate::metrics::{TextMeasurer, TextMetrics};
use crate::outcome::Outcome;
use crate::persistence::{KeyValueStore, PersistenceStore, PlacementRecord, RecordSet};
use crate::registry::{LabelRegistry, Registration};
use crate::scheduler::{AutosaveScheduler, Debouncer};
use crate::scope::Scope;
use crate::snapping;
use crate::surface::{HostSurface, InputEvent};
use crate::types::{BackgroundStyle, BoundingBox, FontWeight, LabelRequest, LabelStyle, Offset, ScreenPoint};

const SURFACE_UNAVAILABLE: &str = "host surface unavailable";

/// Partial style change; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleEdit {
    pub font_size: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub background: Option<BackgroundStyle>,
}

pub struct LabelEngine<S: HostSurface> {
    config: EngineConfig,
    scope: Scope,
    metrics: TextMetrics,
    optimizer: PlacementOptimizer,
    scorer: CollisionScorer,
    registry: LabelRegistry,
    store: PersistenceStore,
    records: HashMap<LabelId, PlacementRecord>,
    autosave: AutosaveScheduler,
    refresh: Debouncer,
    drag: DragController,
    drag_enabled: bool,
    zoom: Option<f32>,
    stats: LayoutStats,
    surface: Option<S>,
}

impl<S: HostSurface> LabelEngine<S> {
    /// Build an engine for `scope` and load its saved records
    pub fn new(
        config: EngineConfig,
        scope: Scope,
        measurer: Box<dyn TextMeasurer>,
        backend: Box<dyn KeyValueStore>,
        now: Instant,
    ) -> Self {
        let patterns = CandidatePatterns::new(&config.ring_radii, config.angles_per_ring);
        let optimizer = PlacementOptimizer::new(patterns, config.good_enough_score, config.max_attempts);
        let mut engine = Self {
            metrics: TextMetrics::new(measurer, config.metrics_cache_capacity),
            optimizer,
            scorer: CollisionScorer::new(),
            registry: LabelRegistry::new(),
            store: PersistenceStore::new(backend, config.storage_base_key.clone()),
            records: HashMap::new(),
            autosave: AutosaveScheduler::new(config.autosave_interval(), config.edit_debounce(), now),
            refresh: Debouncer::new(config.refresh_debounce()),
            drag: DragController::new(config.drag_move_threshold_px, config.drag_min_update_interval()),
            drag_enabled: false,
            zoom: None,
            stats: LayoutStats::default(),
            surface: None,
            scope,
            config,
        };

        info!(scope = %engine.scope, profile = engine.config.profile.name(), "Label engine created");
        let loaded = engine.load();
        if !loaded.success {
            warn!(message = %loaded.message, "Starting without saved layout");
        }
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Connect the host surface and apply every known label to it
    pub fn attach_surface(&mut self, surface: S) -> Outcome {
        self.surface = Some(surface);
        match self.project().and_then(|_| self.apply_all()) {
            Ok(()) => Outcome::ok("Surface attached"),
            Err(e) => Outcome::from_error(&e),
        }
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Current offset of a managed label
    pub fn offset(&self, id: &LabelId) -> Option<Offset> {
        self.registry.get(id).map(|handle| handle.offset)
    }

    pub fn record(&self, id: &LabelId) -> Option<&PlacementRecord> {
        self.records.get(id)
    }

    /// Managed labels in the active scope, in registration order
    pub fn label_ids(&self) -> Vec<LabelId> {
        self.registry.in_scope(&self.scope).map(|handle| handle.id.clone()).collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }

    /// Register requests, place the ones without an override, and apply
    /// everything to the surface. Unidentifiable requests are skipped.
    pub fn process_batch(&mut self, requests: &[LabelRequest]) -> Vec<LabelId> {
        let mut ids: Vec<LabelId> = Vec::with_capacity(requests.len());
        for request in requests {
            let Some(id) = identify(request) else {
                warn!(text = %request.text, "Skipping label without a usable identity");
                continue;
            };

            match self.registry.register(id.clone(), request.clone(), &self.scope) {
                Registration::New => {
                    if let Some(record) = self.records.get(&id) {
                        // Saved placement wins over automatic layout
                        self.registry.set_offset(&id, record.offset, true);
                    }
                }
                Registration::Updated { style_changed: true } => {
                    self.scorer.invalidate(&id);
                    self.restyle_from_request(&id);
                }
                Registration::Updated { style_changed: false } => {}
            }

            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        if let Err(e) = self.layout() {
            warn!(error = %format!("{:#}", e), labels = ids.len(), "Labels registered but not laid out");
        }
        ids
    }

    /// Save now when `force` is set or a flush is due; otherwise schedule a
    /// debounced save of pending changes
    pub fn save(&mut self, force: bool, now: Instant) -> Outcome {
        if force || self.autosave.poll(now) {
            return self.flush(now);
        }
        if self.autosave.is_dirty() {
            self.autosave.note_edit(now);
            return Outcome::ok("Save scheduled");
        }
        Outcome::ok("Nothing to save")
    }

    /// Read the active scope's records and apply them as overrides
    pub fn load(&mut self) -> Outcome {
        let records = match self.store.load(&self.scope) {
            Ok(records) => records,
            Err(e) => {
                error!(scope = %self.scope, error = %format!("{:#}", e), "Failed to load label layout");
                return Outcome::from_error(&e);
            }
        };

        let count = records.len();
        for record in records {
            if let Some(handle) = self.registry.get_mut(&record.label_id)
                && handle.scope.matches(&self.scope)
            {
                handle.offset = record.offset;
                handle.manual = true;
                self.scorer.invalidate(&record.label_id);
            }
            self.records.insert(record.label_id.clone(), record);
        }

        if self.surface.is_some()
            && !self.registry.is_empty()
            && let Err(e) = self.project().and_then(|_| self.apply_all())
        {
            return Outcome::from_error(&e);
        }
        Outcome::ok(format!("Loaded {} labels", count))
    }

    /// Delete every record of the active scope and lay the labels out afresh
    pub fn reset(&mut self) -> Outcome {
        self.cancel_drag();
        let stored = self.store.clear_scope(&self.scope);

        let scope = self.scope.clone();
        self.records.retain(|_, record| !record.scope.matches(&scope));
        for id in self.label_ids() {
            self.registry.set_offset(&id, Offset::ZERO, false);
            self.scorer.invalidate(&id);
        }
        self.autosave.discard();
        info!(scope = %self.scope, "Label layout reset");

        let laid_out = if self.surface.is_some() { self.layout() } else { Ok(()) };
        match (stored, laid_out) {
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %format!("{:#}", e), "Reset incomplete");
                Outcome::from_error(&e)
            }
            (Ok(removed), Ok(())) => Outcome::ok(format!("Reset {} stored labels", removed)),
        }
    }

    /// Drop one label's record and place it again automatically
    pub fn reset_one(&mut self, id: &LabelId) -> Outcome {
        let Some(handle) = self.registry.get(id) else {
            return Outcome::failure(format!("Unknown label {}", id));
        };
        if !handle.scope.matches(&self.scope) {
            debug!(label = %id, "Reset skipped for label from another scope");
            return Outcome::ok("Label belongs to another scope");
        }
        if self.drag.session().is_some_and(|s| &s.label_id == id) {
            self.cancel_drag();
        }

        let stored = self.store.remove(&self.scope, std::slice::from_ref(id));
        self.records.remove(id);
        self.registry.set_offset(id, Offset::ZERO, false);
        self.scorer.invalidate(id);
        info!(label = %id, "Label reset");

        let laid_out = if self.surface.is_some() { self.layout() } else { Ok(()) };
        match (stored, laid_out) {
            (Err(e), _) | (_, Err(e)) => Outcome::from_error(&e),
            (Ok(_), Ok(())) => Outcome::ok(format!("Reset {}", id)),
        }
    }

    /// Switch to another map. Pending edits of the old scope are flushed,
    /// derived caches dropped, and the new scope's records loaded.
    pub fn set_scope(
        &mut self,
        project_id: Option<String>,
        map_configuration_id: Option<String>,
        map_type: Option<String>,
        now: Instant,
    ) -> Outcome {
        let scope = Scope::new(project_id, map_configuration_id, map_type);
        if scope == self.scope {
            return Outcome::ok("Scope unchanged");
        }

        if self.autosave.is_dirty() {
            let flushed = self.flush(now);
            if !flushed.success {
                warn!(message = %flushed.message, "Unsaved changes of previous scope were not stored");
            }
        }
        self.cancel_drag();
        self.registry.clear();
        self.records.clear();
        self.metrics.clear();
        self.scorer.clear();
        self.autosave.discard();
        self.refresh.cancel();
        self.stats = LayoutStats::default();

        info!(from = %self.scope, to = %scope, "Scope changed");
        self.scope = scope;
        self.load()
    }

    pub fn enable_drag_mode(&mut self, enabled: bool) -> Outcome {
        if enabled && self.surface.is_none() {
            return Outcome::failure(SURFACE_UNAVAILABLE);
        }
        if !enabled {
            self.cancel_drag();
        }
        self.drag_enabled = enabled;
        info!(enabled = enabled, "Drag mode changed");
        Outcome::ok(if enabled { "Drag mode enabled" } else { "Drag mode disabled" })
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    /// Feed one host input event through the drag controller
    pub fn handle_event(&mut self, event: InputEvent, now: Instant) -> Outcome {
        if !self.drag_enabled {
            return Outcome::ok("Drag mode disabled");
        }
        if self.surface.is_none() {
            return Outcome::failure(SURFACE_UNAVAILABLE);
        }
        event_handler::handle_event(self, event, now)
    }

    pub fn set_style(&mut self, id: &LabelId, edit: StyleEdit, now: Instant) -> Outcome {
        if let Some(outcome) = self.check_editable(id) {
            return outcome;
        }
        let Some(record) = self.ensure_record(id) else {
            return Outcome::failure(format!("Unknown label {}", id));
        };
        if let Some(size) = edit.font_size {
            record.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
        if let Some(weight) = edit.font_weight {
            record.font_weight = weight;
        }
        if let Some(background) = edit.background {
            record.background_style = background;
        }
        record.touch();
        info!(label = %id, font_size = record.font_size, bold = record.font_weight.is_bold(), "Label style edited");

        self.scorer.invalidate(id);
        self.autosave.note_edit(now);
        match self.apply_label(id) {
            Ok(()) => Outcome::ok(format!("Styled {}", id)),
            Err(e) => Outcome::from_error(&e),
        }
    }

    pub fn set_visible(&mut self, id: &LabelId, visible: bool, now: Instant) -> Outcome {
        if let Some(outcome) = self.check_editable(id) {
            return outcome;
        }
        let Some(record) = self.ensure_record(id) else {
            return Outcome::failure(format!("Unknown label {}", id));
        };
        record.visible = visible;
        record.touch();

        self.autosave.note_edit(now);
        match self.apply_label(id) {
            Ok(()) => Outcome::ok(format!("{} {}", if visible { "Showed" } else { "Hid" }, id)),
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Labels are hidden while the zoom is below the profile's minimum
    pub fn set_zoom(&mut self, zoom: f32) -> Outcome {
        self.zoom = Some(zoom);
        if self.surface.is_none() {
            return Outcome::failure(SURFACE_UNAVAILABLE);
        }
        match self.apply_all() {
            Ok(()) => Outcome::ok(format!("Zoom {}", zoom)),
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// The host map moved; labels are re-projected once movement settles
    pub fn request_refresh(&mut self, now: Instant) {
        self.refresh.request(now);
    }

    /// Drive the refresh debounce and autosave timers
    pub fn tick(&mut self, now: Instant) -> Outcome {
        let mut messages = Vec::new();
        let mut success = true;

        if self.refresh.poll(now) {
            match self.project().and_then(|_| self.apply_all()) {
                Ok(()) => messages.push("Refreshed labels".to_string()),
                Err(e) => {
                    success = false;
                    messages.push(format!("{:#}", e));
                }
            }
        }
        if self.autosave.poll(now) {
            let flushed = self.flush(now);
            success &= flushed.success;
            messages.push(flushed.message);
        }

        if messages.is_empty() {
            Outcome::ok("Idle")
        } else if success {
            Outcome::ok(messages.join("; "))
        } else {
            Outcome::failure(messages.join("; "))
        }
    }

    /// Active scope's records in the persisted layout format
    pub fn export_layout(&self) -> Result<String> {
        let set: RecordSet = self
            .records
            .values()
            .filter(|record| record.scope.matches(&self.scope))
            .map(|record| (record.label_id.clone(), record.clone()))
            .collect();
        serde_json::to_string_pretty(&set).context("Failed to serialize layout")
    }

    /// Merge an exported layout; records of other scopes are skipped
    pub fn import_layout(&mut self, json: &str, now: Instant) -> Outcome {
        let set: RecordSet = match serde_json::from_str(json).context("Failed to parse layout") {
            Ok(set) => set,
            Err(e) => return Outcome::from_error(&e),
        };

        let mut imported = 0;
        let mut skipped = 0;
        for (id, mut record) in set {
            if !record.scope.matches(&self.scope) {
                skipped += 1;
                continue;
            }
            record.label_id = id.clone();
            record.scope = self.scope.clone();
            if let Some(handle) = self.registry.get_mut(&id) {
                handle.offset = record.offset;
                handle.manual = true;
            }
            self.scorer.invalidate(&id);
            self.records.insert(id, record);
            imported += 1;
        }
        info!(imported = imported, skipped = skipped, "Imported layout");

        if imported > 0 {
            self.autosave.note_edit(now);
        }
        if self.surface.is_some()
            && let Err(e) = self.apply_all()
        {
            return Outcome::from_error(&e);
        }
        Outcome::ok(format!("Imported {} labels, skipped {} from other scopes", imported, skipped))
    }

    // ---- drag effects, driven by the event handler ----

    pub(crate) fn drag_controller(&mut self) -> &mut DragController {
        &mut self.drag
    }

    /// Label under `position` in the active scope, with its current offset
    pub(crate) fn hit_label(&self, position: ScreenPoint) -> Option<(LabelId, Offset)> {
        let id = self.surface.as_ref()?.hit_test(position)?;
        let Some(handle) = self.registry.get(&id) else {
            debug!(label = %id, "Hit label is not managed by this engine");
            return None;
        };
        if !handle.scope.matches(&self.scope) {
            debug!(label = %id, "Hit label belongs to another scope");
            return None;
        }
        Some((id, handle.offset))
    }

    pub(crate) fn set_navigation(&mut self, enabled: bool) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_navigation_enabled(enabled);
        }
    }

    /// Show a label at a drag position without committing it
    pub(crate) fn preview_drag(&mut self, id: &LabelId, offset: Offset) -> Result<Offset> {
        let offset = self.snapped_offset(id, offset);
        self.apply_label_at(id, offset)?;
        Ok(offset)
    }

    /// Make a dragged position the label's manual placement
    pub(crate) fn commit_drag(&mut self, id: &LabelId, offset: Offset, now: Instant) -> Result<Offset> {
        let offset = self.snapped_offset(id, offset);
        let Some(handle) = self.registry.get(id) else {
            return Err(anyhow!("Unknown label {}", id));
        };
        if !handle.scope.matches(&self.scope) {
            debug!(label = %id, "Drag commit skipped for label from another scope");
            return Ok(handle.offset);
        }

        self.registry.set_offset(id, offset, true);
        if let Some(record) = self.ensure_record(id) {
            record.offset = offset;
            record.touch();
        }
        self.autosave.note_edit(now);
        self.apply_label(id)?;
        Ok(offset)
    }

    /// Put a label back after a cancelled drag
    pub(crate) fn restore_label(&mut self, id: &LabelId, offset: Offset) -> Result<()> {
        let manual = self.registry.get(id).is_some_and(|handle| handle.manual);
        self.registry.set_offset(id, offset, manual);
        self.apply_label(id)
    }

    // ---- internals ----

    fn flush(&mut self, now: Instant) -> Outcome {
        let scope = &self.scope;
        let records: Vec<&PlacementRecord> = self.records.values().filter(|r| r.scope.matches(scope)).collect();
        match self.store.save(records) {
            Ok(written) => {
                self.autosave.flushed(now);
                debug!(scope = %self.scope, records = written, "Layout flushed");
                Outcome::ok(format!("Saved {} labels", written))
            }
            Err(e) => {
                error!(scope = %self.scope, error = %format!("{:#}", e), "Failed to save label layout");
                Outcome::from_error(&e)
            }
        }
    }

    fn cancel_drag(&mut self) {
        let Some(session) = self.drag.reset() else {
            return;
        };
        self.set_navigation(true);
        if let Err(e) = self.apply_label(&session.label_id) {
            warn!(label = %session.label_id, error = %format!("{:#}", e), "Could not restore label after drag");
        }
    }

    /// Outcome to return early when `id` cannot be edited
    fn check_editable(&self, id: &LabelId) -> Option<Outcome> {
        match self.registry.get(id) {
            None => Some(Outcome::failure(format!("Unknown label {}", id))),
            Some(handle) if !handle.scope.matches(&self.scope) => {
                debug!(label = %id, "Edit skipped for label from another scope");
                Some(Outcome::ok("Label belongs to another scope"))
            }
            Some(_) => None,
        }
    }

    fn ensure_record(&mut self, id: &LabelId) -> Option<&mut PlacementRecord> {
        if !self.records.contains_key(id) {
            let handle = self.registry.get(id)?;
            let style = handle.request.style(self.config.profile.default_font_size());
            let record = PlacementRecord::new(id.clone(), handle.offset, &style, self.scope.clone());
            self.records.insert(id.clone(), record);
        }
        self.records.get_mut(id)
    }

    /// The host resubmitted a label with a different style; its record follows
    fn restyle_from_request(&mut self, id: &LabelId) {
        let Some(handle) = self.registry.get(id) else {
            return;
        };
        let style = handle.request.style(self.config.profile.default_font_size());
        let Some(record) = self.records.get_mut(id) else {
            return;
        };
        if record.style() == style {
            return;
        }

        record.font_size = style.font_size;
        record.font_weight = style.font_weight;
        record.background_style = style.background;
        record.touch();
        self.autosave.mark_dirty();
        debug!(label = %id, font_size = record.font_size, bold = record.font_weight.is_bold(), "Record restyled from request");
    }

    /// Record style when one exists, otherwise the style the request implies
    fn effective_style(&self, id: &LabelId) -> Option<LabelStyle> {
        if let Some(record) = self.records.get(id) {
            return Some(record.style());
        }
        self.registry
            .get(id)
            .map(|handle| handle.request.style(self.config.profile.default_font_size()))
    }

    fn project(&mut self) -> Result<()> {
        let surface = self.surface.as_ref().ok_or_else(|| anyhow!(SURFACE_UNAVAILABLE))?;
        let anchors: Vec<(LabelId, Option<ScreenPoint>)> = self
            .registry
            .in_scope(&self.scope)
            .map(|handle| (handle.id.clone(), handle.request.anchor.and_then(|a| surface.anchor_to_screen(a))))
            .collect();
        for (id, screen) in anchors {
            if screen.is_none() {
                debug!(label = %id, "Anchor could not be projected");
            }
            if let Some(handle) = self.registry.get_mut(&id) {
                handle.screen_anchor = screen;
            }
        }
        Ok(())
    }

    fn label_box(&mut self, id: &LabelId, offset: Offset) -> Option<BoundingBox> {
        let handle = self.registry.get(id)?;
        let anchor = handle.screen_anchor?;
        let text = handle.request.text.clone();
        let style = self.effective_style(id)?;
        let halo = self.config.profile.halo_size();
        Some(self.metrics.bounding_box(&text, &style, &self.config.font_family, halo, anchor, offset))
    }

    fn layout(&mut self) -> Result<()> {
        self.project()?;
        let halo = self.config.profile.halo_size();
        let mut items = Vec::new();
        let mut fixed = Vec::new();

        for id in self.label_ids() {
            let Some(handle) = self.registry.get(&id) else {
                continue;
            };
            let Some(anchor) = handle.screen_anchor else {
                continue;
            };
            let (text, offset, manual) = (handle.request.text.clone(), handle.offset, handle.manual);
            let Some(style) = self.effective_style(&id) else {
                continue;
            };

            let size = self.metrics.label_size(&text, &style, &self.config.font_family, halo);
            let weight = self.scorer.weight(&id, &style, &text);
            let item = LayoutItem {
                placed: self.records.contains_key(&id),
                priority: text.chars().count() as f32 * style.font_size,
                id,
                anchor,
                size,
                weight,
                offset,
            };
            if manual { fixed.push(item) } else { items.push(item) }
        }

        let result = self.optimizer.optimize(&self.scorer, &items, &fixed);
        for item in &items {
            let Some(offset) = result.offsets.get(&item.id).copied() else {
                continue;
            };
            self.registry.set_offset(&item.id, offset, false);
            match self.records.get_mut(&item.id) {
                Some(record) => {
                    if record.offset != offset {
                        record.offset = offset;
                        record.touch();
                        self.autosave.mark_dirty();
                    }
                }
                None => {
                    if let Some(record) = self.ensure_record(&item.id) {
                        record.offset = offset;
                    }
                    self.autosave.mark_dirty();
                }
            }
        }
        self.stats = result.stats;
        self.apply_all()
    }

    fn apply_all(&mut self) -> Result<()> {
        for id in self.label_ids() {
            self.apply_label(&id)?;
        }
        Ok(())
    }

    fn apply_label(&mut self, id: &LabelId) -> Result<()> {
        let Some(offset) = self.registry.get(id).map(|handle| handle.offset) else {
            return Ok(());
        };
        self.apply_label_at(id, offset)
    }

    fn apply_label_at(&mut self, id: &LabelId, offset: Offset) -> Result<()> {
        match self.registry.get(id) {
            Some(handle) if handle.scope.matches(&self.scope) => {}
            _ => {
                debug!(label = %id, "Apply skipped for label outside the active scope");
                return Ok(());
            }
        }
        let Some(bounds) = self.label_box(id, offset) else {
            return Ok(());
        };
        let Some(style) = self.effective_style(id) else {
            return Ok(());
        };
        let visible = self.records.get(id).is_none_or(|record| record.visible)
            && self.zoom.is_none_or(|zoom| self.config.profile.visible_at(zoom));

        let surface = self.surface.as_mut().ok_or_else(|| anyhow!(SURFACE_UNAVAILABLE))?;
        surface
            .apply_offset(id, offset, bounds)
            .with_context(|| format!("Failed to move label {}", id))?;
        surface
            .apply_style(id, &style, visible)
            .with_context(|| format!("Failed to style label {}", id))
    }

    /// Snap a dragged label's edges to its neighbours when enabled
    fn snapped_offset(&mut self, id: &LabelId, offset: Offset) -> Offset {
        let threshold = self.config.snap_threshold_px;
        if threshold <= 0.0 {
            return offset;
        }
        let Some(dragged) = self.label_box(id, offset) else {
            return offset;
        };

        let mut others = Vec::new();
        for other in self.label_ids() {
            if &other == id {
                continue;
            }
            let Some(current) = self.registry.get(&other).map(|handle| handle.offset) else {
                continue;
            };
            if let Some(bounds) = self.label_box(&other, current) {
                others.push((other, bounds));
            }
        }

        match snapping::find_snap_delta(dragged, &others, threshold) {
            Some((dx, dy)) => Offset::new(offset.x + dx, offset.y - dy),
            None => offset,
        }
    }
}
