//! Scope isolating one map's saved layout from another's

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::persistence::{CONFIG_SEGMENT, TYPE_SEGMENT};

/// (project, map configuration, map type). Unset parts match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_configuration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_type: Option<String>,
}

impl Scope {
    pub fn new(
        project_id: Option<String>,
        map_configuration_id: Option<String>,
        map_type: Option<String>,
    ) -> Self {
        Self {
            project_id: normalize(project_id),
            map_configuration_id: normalize(map_configuration_id),
            map_type: normalize(map_type),
        }
    }

    /// Scope with every part unset
    pub fn unscoped() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.project_id.is_none() && self.map_configuration_id.is_none() && self.map_type.is_none()
    }

    /// Two scopes match when every part set on both sides is equal
    pub fn matches(&self, other: &Scope) -> bool {
        part_matches(&self.project_id, &other.project_id)
            && part_matches(&self.map_configuration_id, &other.map_configuration_id)
            && part_matches(&self.map_type, &other.map_type)
    }

    /// Storage key for this scope; unset parts omit their suffix. Projects
    /// share a key and are told apart by each record's own scope.
    pub fn storage_key(&self, base: &str) -> String {
        let mut key = base.to_string();
        if let Some(config) = &self.map_configuration_id {
            key.push_str(CONFIG_SEGMENT);
            key.push_str(config);
        }
        if let Some(map_type) = &self.map_type {
            key.push_str(TYPE_SEGMENT);
            key.push_str(map_type);
        }
        key
    }
}

fn normalize(part: Option<String>) -> Option<String> {
    part.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

fn part_matches(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "project={} config={} type={}",
            self.project_id.as_deref().unwrap_or("-"),
            self.map_configuration_id.as_deref().unwrap_or("-"),
            self.map_type.as_deref().unwrap_or("-"),
        )
    }
}
