//! Stable label identity
//!
//! A label id is derived from the most specific identifying attribute a request
//! carries, so the same feature maps to the same id across sessions:
//! numeric feature id > parent id > explicit label id > generic id > geometry + text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::LabelRequest;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LabelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Derive the id for a request, or `None` when it has nothing usable
pub fn identify(request: &LabelRequest) -> Option<LabelId> {
    let hints = &request.identity;

    if let Some(feature_id) = hints.feature_id {
        return Some(LabelId(format!("feature_{feature_id}")));
    }
    if let Some(parent) = usable(hints.parent_id.as_deref()) {
        return Some(LabelId(format!("parent_{parent}")));
    }
    if let Some(label) = usable(hints.label_id.as_deref()) {
        return Some(LabelId(format!("label_{label}")));
    }
    if let Some(id) = usable(hints.id.as_deref()).or_else(|| usable(request.owner_entity_id.as_deref())) {
        return Some(LabelId(format!("id_{id}")));
    }

    // Geometry fallback: fixed precision keeps the id stable across float noise
    let anchor = request.anchor.filter(|a| a.is_finite())?;
    let text = slug(&request.text);
    let mut id = format!("geo_{:.6}_{:.6}", anchor.lng, anchor.lat);
    if !text.is_empty() {
        id.push('_');
        id.push_str(&text);
    }
    Some(LabelId(id))
}

fn usable(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
