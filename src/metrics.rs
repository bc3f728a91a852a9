//! Text metrics and label bounding boxes
//!
//! Measurements go through a [`TextMeasurer`]; [`TextMetrics`] keeps a bounded
//! cache of results keyed by the full input tuple. The cache belongs to the
//! engine instance and evicts the oldest entry once full.

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::constants::metrics::{BOLD_WIDTH_FACTOR, LINE_HEIGHT};
use crate::types::{BoundingBox, FontWeight, LabelStyle, Offset, ScreenPoint};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, font_size: f32, weight: FontWeight, font_family: &str) -> TextSize;
}

/// Measurer that estimates glyph widths from character classes.
/// Used when no font file is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMeasurer;

fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.30,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' | 'i' | 'j' | 'l' | 'I' => 0.28,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.36,
        'm' | 'w' => 0.86,
        'M' | 'W' => 0.90,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_digit() => 0.56,
        c if c.is_ascii_lowercase() => 0.55,
        c if c.is_ascii() => 0.50,
        // CJK and other wide scripts
        _ => 1.0,
    }
}

impl TextMeasurer for EstimatedMeasurer {
    fn measure(&self, text: &str, font_size: f32, weight: FontWeight, _font_family: &str) -> TextSize {
        if text.is_empty() || font_size <= 0.0 {
            return TextSize::default();
        }
        let bold = if weight.is_bold() { BOLD_WIDTH_FACTOR } else { 1.0 };
        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| line.chars().map(char_width_factor).sum::<f32>() * font_size * bold)
            .fold(0.0, f32::max);
        TextSize {
            width: width.ceil(),
            height: (lines.len() as f32 * font_size * LINE_HEIGHT).ceil(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetricsKey {
    text: String,
    font_size_bits: u32,
    weight: FontWeight,
    font_family: String,
}

/// Cached text measurement owned by one engine instance
pub struct TextMetrics {
    measurer: Box<dyn TextMeasurer>,
    cache: HashMap<MetricsKey, TextSize>,
    insertion_order: VecDeque<MetricsKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl std::fmt::Debug for TextMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMetrics")
            .field("entries", &self.cache.len())
            .field("capacity", &self.capacity)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

impl TextMetrics {
    pub fn new(measurer: Box<dyn TextMeasurer>, capacity: usize) -> Self {
        Self {
            measurer,
            cache: HashMap::new(),
            insertion_order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn measure(&mut self, text: &str, font_size: f32, weight: FontWeight, font_family: &str) -> TextSize {
        let key = MetricsKey {
            text: text.to_string(),
            font_size_bits: font_size.to_bits(),
            weight,
            font_family: font_family.to_string(),
        };
        if let Some(size) = self.cache.get(&key) {
            self.hits += 1;
            return *size;
        }

        self.misses += 1;
        let size = self.measurer.measure(text, font_size, weight, font_family);
        while self.cache.len() >= self.capacity {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            self.cache.remove(&oldest);
        }
        self.insertion_order.push_back(key.clone());
        self.cache.insert(key, size);
        size
    }

    /// Size of the label box: text extents grown on every side by the
    /// background padding and the halo width
    pub fn label_size(&mut self, text: &str, style: &LabelStyle, font_family: &str, halo: f32) -> TextSize {
        let text_size = self.measure(text, style.font_size, style.font_weight, font_family);
        let grow = 2.0 * (style.background.effective_padding() + halo.max(0.0));
        TextSize {
            width: text_size.width + grow,
            height: text_size.height + grow,
        }
    }

    /// Box of a label whose anchor projects to `anchor`, displaced by `offset`
    pub fn bounding_box(
        &mut self,
        text: &str,
        style: &LabelStyle,
        font_family: &str,
        halo: f32,
        anchor: ScreenPoint,
        offset: Offset,
    ) -> BoundingBox {
        let size = self.label_size(text, style, font_family, halo);
        BoundingBox::centered(anchor.displaced(offset), size.width, size.height)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        debug!(entries = self.cache.len(), "Clearing text metrics cache");
        self.cache.clear();
        self.insertion_order.clear();
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackgroundStyle;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingMeasurer {
        calls: Rc<Cell<usize>>,
    }

    impl TextMeasurer for CountingMeasurer {
        fn measure(&self, text: &str, font_size: f32, _weight: FontWeight, _family: &str) -> TextSize {
            self.calls.set(self.calls.get() + 1);
            TextSize {
                width: text.chars().count() as f32 * font_size * 0.5,
                height: font_size,
            }
        }
    }

    fn counting(capacity: usize) -> (TextMetrics, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let metrics = TextMetrics::new(Box::new(CountingMeasurer { calls: calls.clone() }), capacity);
        (metrics, calls)
    }

    #[test]
    fn test_measure_is_cached_by_input_tuple() {
        let (mut metrics, calls) = counting(10);
        metrics.measure("Oakland", 10.0, FontWeight::Normal, "sans-serif");
        metrics.measure("Oakland", 10.0, FontWeight::Normal, "sans-serif");
        assert_eq!(calls.get(), 1);

        // Any differing component is a new entry
        metrics.measure("Oakland", 10.0, FontWeight::Bold, "sans-serif");
        metrics.measure("Oakland", 11.0, FontWeight::Normal, "sans-serif");
        metrics.measure("Oakland", 10.0, FontWeight::Normal, "serif");
        assert_eq!(calls.get(), 4);
        assert_eq!(metrics.stats(), (1, 4));
    }

    #[test]
    fn test_cache_evicts_oldest_past_capacity() {
        let (mut metrics, calls) = counting(2);
        metrics.measure("a", 10.0, FontWeight::Normal, "f");
        metrics.measure("b", 10.0, FontWeight::Normal, "f");
        metrics.measure("c", 10.0, FontWeight::Normal, "f");
        assert_eq!(metrics.len(), 2);

        // "a" was evicted, "c" is still cached
        metrics.measure("c", 10.0, FontWeight::Normal, "f");
        assert_eq!(calls.get(), 3);
        metrics.measure("a", 10.0, FontWeight::Normal, "f");
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_label_size_grows_for_background_and_halo() {
        let (mut metrics, _) = counting(10);
        let plain = LabelStyle::new(10.0, FontWeight::Normal, BackgroundStyle::disabled());
        let filled = LabelStyle::new(10.0, FontWeight::Normal, BackgroundStyle::enabled());

        let plain_size = metrics.label_size("Oak", &plain, "f", 0.0);
        assert_eq!(plain_size, TextSize { width: 15.0, height: 10.0 });

        let filled_size = metrics.label_size("Oak", &filled, "f", 1.5);
        let grow = 2.0 * (crate::constants::metrics::BACKGROUND_PADDING + 1.5);
        assert_eq!(filled_size.width, 15.0 + grow);
        assert_eq!(filled_size.height, 10.0 + grow);
    }

    #[test]
    fn test_bounding_box_centered_on_displaced_anchor() {
        let (mut metrics, _) = counting(10);
        let style = LabelStyle::new(10.0, FontWeight::Normal, BackgroundStyle::disabled());
        let bbox = metrics.bounding_box("Oak", &style, "f", 0.0, ScreenPoint::new(100.0, 100.0), Offset::new(10.0, 20.0));
        assert_eq!(bbox.center(), ScreenPoint::new(110.0, 80.0));
        assert_eq!(bbox.width, 15.0);
    }

    #[test]
    fn test_estimated_measurer_orders_by_length_and_weight() {
        let m = EstimatedMeasurer;
        let short = m.measure("Oak", 10.0, FontWeight::Normal, "");
        let long = m.measure("Oakland", 10.0, FontWeight::Normal, "");
        let bold = m.measure("Oakland", 10.0, FontWeight::Bold, "");
        assert!(long.width > short.width);
        assert!(bold.width > long.width);
        assert_eq!(long.height, 12.0);
        assert_eq!(m.measure("", 10.0, FontWeight::Normal, ""), TextSize::default());
    }

    #[test]
    fn test_estimated_measurer_multiline() {
        let m = EstimatedMeasurer;
        let one = m.measure("Oakland", 10.0, FontWeight::Normal, "");
        let two = m.measure("Oakland\nCA", 10.0, FontWeight::Normal, "");
        assert_eq!(two.width, one.width);
        assert_eq!(two.height, 24.0);
    }
}
