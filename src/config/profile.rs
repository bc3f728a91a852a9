//! Label profiles
//!
//! A profile describes the kind of label a map shows (point markers, market
//! area polygons, or a custom set of values). It is picked once when the
//! engine is configured and never inspected by string afterwards.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelProfile {
    /// Labels next to point markers (locations, radius centres)
    #[default]
    Point,
    /// Labels placed inside market area polygons
    Area,
    Custom {
        #[serde(default = "default_font_size")]
        default_font_size: f32,
        #[serde(default = "default_halo_size")]
        halo_size: f32,
        #[serde(default)]
        min_zoom: f32,
    },
}

fn default_font_size() -> f32 {
    10.0
}

fn default_halo_size() -> f32 {
    1.5
}

impl LabelProfile {
    /// Font size used when a request does not carry one
    pub fn default_font_size(&self) -> f32 {
        match self {
            LabelProfile::Point => default_font_size(),
            LabelProfile::Area => 12.0,
            LabelProfile::Custom { default_font_size, .. } => *default_font_size,
        }
    }

    /// Halo width drawn around the glyphs, enlarging the label box on every side
    pub fn halo_size(&self) -> f32 {
        match self {
            LabelProfile::Point => default_halo_size(),
            LabelProfile::Area => 2.0,
            LabelProfile::Custom { halo_size, .. } => *halo_size,
        }
    }

    /// Labels are hidden while the map zoom is below this
    pub fn min_zoom(&self) -> f32 {
        match self {
            LabelProfile::Point => 0.0,
            LabelProfile::Area => 8.0,
            LabelProfile::Custom { min_zoom, .. } => *min_zoom,
        }
    }

    pub fn visible_at(&self, zoom: f32) -> bool {
        zoom >= self.min_zoom()
    }

    pub fn name(&self) -> &'static str {
        match self {
            LabelProfile::Point => "point",
            LabelProfile::Area => "area",
            LabelProfile::Custom { .. } => "custom",
        }
    }
}
