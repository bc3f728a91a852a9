use std::collections::HashMap;
use tracing::{debug, info};

use crate::identity::LabelId;
use crate::scope::Scope;
use crate::types::{LabelRequest, Offset, ScreenPoint};

/// Live state tracked for one label
#[derive(Debug, Clone)]
pub struct LabelHandle {
    pub id: LabelId,
    pub request: LabelRequest,
    pub scope: Scope,
    pub offset: Offset,
    /// Offset was set by a drag or a loaded record, not by the optimizer
    pub manual: bool,
    /// Projected anchor from the last apply (None until projected)
    pub screen_anchor: Option<ScreenPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    Updated { style_changed: bool },
}

/// Runtime table of labels the engine manages.
/// Iteration follows first-registration order.
#[derive(Debug, Default)]
pub struct LabelRegistry {
    entries: HashMap<LabelId, LabelHandle>,
    order: Vec<LabelId>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or update the handle for `id`.
    /// Updating keeps the current offset and manual flag; scope is only
    /// attached when the handle has none yet.
    pub fn register(&mut self, id: LabelId, request: LabelRequest, scope: &Scope) -> Registration {
        if let Some(handle) = self.entries.get_mut(&id) {
            let style_changed = handle.request.font_size != request.font_size
                || handle.request.font_weight != request.font_weight
                || handle.request.background_enabled != request.background_enabled
                || handle.request.text != request.text;
            handle.request = request;
            if handle.scope.is_unset() {
                handle.scope = scope.clone();
            }
            debug!(label = %id, style_changed = style_changed, "Updated registered label");
            return Registration::Updated { style_changed };
        }

        info!(label = %id, text = %request.text, "Registered new label");
        self.order.push(id.clone());
        self.entries.insert(
            id.clone(),
            LabelHandle {
                id,
                request,
                scope: scope.clone(),
                offset: Offset::ZERO,
                manual: false,
                screen_anchor: None,
            },
        );
        Registration::New
    }

    pub fn get(&self, id: &LabelId) -> Option<&LabelHandle> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &LabelId) -> Option<&mut LabelHandle> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &LabelId) -> bool {
        self.entries.contains_key(id)
    }

    /// Record a new offset for a label; returns false when unknown
    pub fn set_offset(&mut self, id: &LabelId, offset: Offset, manual: bool) -> bool {
        match self.entries.get_mut(id) {
            Some(handle) => {
                handle.offset = offset;
                handle.manual = manual;
                true
            }
            None => false,
        }
    }

    /// Handles whose scope matches `scope`, in registration order
    pub fn in_scope<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a LabelHandle> + 'a {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .filter(move |handle| handle.scope.matches(scope))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelHandle> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnchorPoint, FontWeight};

    fn request(text: &str) -> LabelRequest {
        LabelRequest::new(AnchorPoint::new(0.0, 0.0), text, 10.0)
    }

    fn scope(config: &str) -> Scope {
        Scope::new(None, Some(config.to_string()), Some("dots".to_string()))
    }

    #[test]
    fn test_register_new_label() {
        let mut registry = LabelRegistry::new();
        let result = registry.register(LabelId::new("a"), request("Alameda"), &scope("1"));

        assert_eq!(result, Registration::New);
        let handle = registry.get(&LabelId::new("a")).unwrap();
        assert_eq!(handle.offset, Offset::ZERO);
        assert!(!handle.manual);
        assert_eq!(handle.scope, scope("1"));
    }

    #[test]
    fn test_reregister_keeps_manual_offset() {
        let mut registry = LabelRegistry::new();
        let id = LabelId::new("a");
        registry.register(id.clone(), request("Alameda"), &scope("1"));
        registry.set_offset(&id, Offset::new(20.0, 5.0), true);

        let result = registry.register(id.clone(), request("Alameda"), &scope("1"));
        assert_eq!(result, Registration::Updated { style_changed: false });

        let handle = registry.get(&id).unwrap();
        assert_eq!(handle.offset, Offset::new(20.0, 5.0));
        assert!(handle.manual);
    }

    #[test]
    fn test_reregister_detects_style_change() {
        let mut registry = LabelRegistry::new();
        let id = LabelId::new("a");
        registry.register(id.clone(), request("Alameda"), &scope("1"));

        let bold = request("Alameda").with_weight(FontWeight::Bold);
        let result = registry.register(id, bold, &scope("1"));
        assert_eq!(result, Registration::Updated { style_changed: true });
    }

    #[test]
    fn test_scope_attached_only_when_missing() {
        let mut registry = LabelRegistry::new();
        let id = LabelId::new("a");
        registry.register(id.clone(), request("Alameda"), &Scope::unscoped());
        registry.register(id.clone(), request("Alameda"), &scope("1"));
        assert_eq!(registry.get(&id).unwrap().scope, scope("1"));

        // An existing scope is never replaced
        registry.register(id.clone(), request("Alameda"), &scope("2"));
        assert_eq!(registry.get(&id).unwrap().scope, scope("1"));
    }

    #[test]
    fn test_in_scope_filters_and_keeps_order() {
        let mut registry = LabelRegistry::new();
        registry.register(LabelId::new("b"), request("B"), &scope("1"));
        registry.register(LabelId::new("a"), request("A"), &scope("2"));
        registry.register(LabelId::new("c"), request("C"), &scope("1"));

        let current = scope("1");
        let ids: Vec<_> = registry.in_scope(&current).map(|h| h.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_set_offset_unknown_label() {
        let mut registry = LabelRegistry::new();
        assert!(!registry.set_offset(&LabelId::new("missing"), Offset::new(1.0, 1.0), true));
    }
}
