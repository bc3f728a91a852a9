//! Core value types shared by every part of the engine

use serde::{Deserialize, Serialize};

/// Screen-pixel displacement of a label from its anchor's projected position.
/// `y` grows upwards (a positive `y` moves the label above the anchor).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance from the zero offset
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Position on the host surface in screen pixels (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: ScreenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Screen position of a label centre displaced by `offset` from this anchor
    pub fn displaced(&self, offset: Offset) -> ScreenPoint {
        ScreenPoint::new(self.x + offset.x, self.y - offset.y)
    }
}

/// Geographic location a label annotates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub lng: f64,
    pub lat: f64,
}

impl AnchorPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Axis-aligned box in screen pixels. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Box of the given size centred on `center`
    pub fn centered(center: ScreenPoint, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.left() && point.x <= self.right() && point.y >= self.top() && point.y <= self.bottom()
    }

    /// Area of the intersection rectangle (0 when the boxes only touch)
    pub fn overlap_area(&self, other: &BoundingBox) -> f32 {
        let w = self.right().min(other.right()) - self.left().max(other.left());
        let h = self.bottom().min(other.bottom()) - self.top().max(other.top());
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.overlap_area(other) > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn is_bold(&self) -> bool {
        matches!(self, FontWeight::Bold)
    }
}

/// Background fill drawn behind a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundStyle {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default = "default_background_padding")]
    pub padding: f32,
}

fn default_background_padding() -> f32 {
    crate::constants::metrics::BACKGROUND_PADDING
}

impl BackgroundStyle {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            fill: None,
            padding: default_background_padding(),
        }
    }

    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::disabled()
        }
    }

    /// Padding that actually enlarges the label box
    pub fn effective_padding(&self) -> f32 {
        if self.enabled { self.padding.max(0.0) } else { 0.0 }
    }
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Visual attributes of a label that affect its size and importance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelStyle {
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub background: BackgroundStyle,
}

impl LabelStyle {
    pub fn new(font_size: f32, font_weight: FontWeight, background: BackgroundStyle) -> Self {
        Self {
            font_size,
            font_weight,
            background,
        }
    }
}

/// Identifying attributes carried by a label request, most specific first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A label the host wants placed. Owned by the host; the engine keeps copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorPoint>,
    pub text: String,
    /// Values <= 0 fall back to the active profile's default font size
    #[serde(default)]
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub background_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_entity_id: Option<String>,
    #[serde(default)]
    pub identity: IdentityHints,
}

impl LabelRequest {
    pub fn new(anchor: AnchorPoint, text: impl Into<String>, font_size: f32) -> Self {
        Self {
            anchor: Some(anchor),
            text: text.into(),
            font_size,
            font_weight: FontWeight::Normal,
            background_enabled: false,
            owner_entity_id: None,
            identity: IdentityHints::default(),
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = weight;
        self
    }

    pub fn with_background(mut self, enabled: bool) -> Self {
        self.background_enabled = enabled;
        self
    }

    pub fn with_feature_id(mut self, feature_id: i64) -> Self {
        self.identity.feature_id = Some(feature_id);
        self
    }

    /// Style implied by the request alone
    pub fn style(&self, default_font_size: f32) -> LabelStyle {
        let font_size = if self.font_size > 0.0 { self.font_size } else { default_font_size };
        let background = if self.background_enabled {
            BackgroundStyle::enabled()
        } else {
            BackgroundStyle::disabled()
        };
        LabelStyle::new(font_size, self.font_weight, background)
    }
}
