//! TrueType font measurement using fontdue (pure Rust)

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::metrics::{BOLD_WIDTH_FACTOR, LINE_HEIGHT};
use crate::metrics::{EstimatedMeasurer, TextMeasurer, TextSize};
use crate::types::FontWeight;

const REGULAR_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Text measurer backed by real glyph advances
#[derive(Debug)]
pub struct FontMeasurer {
    regular: Font,
    bold: Option<Font>,
}

fn load_font(path: &Path) -> Result<Font> {
    let font_data = fs::read(path).with_context(|| format!("Failed to read font file: {}", path.display()))?;
    Font::from_bytes(font_data, FontSettings::default())
        .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {}", path.display(), e))
}

impl FontMeasurer {
    /// Load a TrueType font from a file path (bold is synthesized by widening)
    pub fn from_path(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "Loading measurement font");
        let regular = load_font(path)?;
        Ok(Self { regular, bold: None })
    }

    /// Try to find and load a common system font
    pub fn from_system_font() -> Result<Self> {
        // Compile-time font path first (set by packaged builds)
        const FONT_PATH: Option<&str> = option_env!("FONT_PATH");
        if let Some(font_path) = FONT_PATH {
            match Self::from_path(Path::new(font_path)) {
                Ok(measurer) => return Ok(measurer),
                Err(e) => warn!(font_path = %font_path, error = %e, "Failed to load FONT_PATH, trying system paths"),
            }
        }

        let regular = REGULAR_FONT_PATHS
            .iter()
            .find_map(|path| load_font(&PathBuf::from(path)).ok())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Could not find any system fonts. Tried FONT_PATH ({:?}) and paths: {:?}",
                    FONT_PATH,
                    REGULAR_FONT_PATHS
                )
            })?;
        let bold = BOLD_FONT_PATHS
            .iter()
            .find_map(|path| load_font(&PathBuf::from(path)).ok());

        info!(bold = bold.is_some(), "Loaded system measurement font");
        Ok(Self { regular, bold })
    }

    fn line_width(&self, line: &str, font_size: f32, weight: FontWeight) -> f32 {
        let (font, synthesize) = match (weight, &self.bold) {
            (FontWeight::Bold, Some(bold)) => (bold, false),
            (FontWeight::Bold, None) => (&self.regular, true),
            (FontWeight::Normal, _) => (&self.regular, false),
        };
        let width: f32 = line
            .chars()
            .map(|ch| font.metrics(ch, font_size).advance_width)
            .sum();
        if synthesize { width * BOLD_WIDTH_FACTOR } else { width }
    }

    fn line_height(&self, font_size: f32) -> f32 {
        self.regular
            .horizontal_line_metrics(font_size)
            .map(|m| m.new_line_size)
            .filter(|h| *h > 0.0)
            .unwrap_or(font_size * LINE_HEIGHT)
    }
}

impl TextMeasurer for FontMeasurer {
    fn measure(&self, text: &str, font_size: f32, weight: FontWeight, _font_family: &str) -> TextSize {
        if text.is_empty() || font_size <= 0.0 {
            return TextSize::default();
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| self.line_width(line, font_size, weight))
            .fold(0.0, f32::max);
        TextSize {
            width: width.ceil(),
            height: (lines.len() as f32 * self.line_height(font_size)).ceil(),
        }
    }
}

/// Measurer for `font_path`, or the first system font found. Falls back to
/// estimated metrics when no font can be loaded.
pub fn build_measurer(font_path: Option<&Path>) -> Box<dyn TextMeasurer> {
    let loaded = match font_path {
        Some(path) => FontMeasurer::from_path(path),
        None => FontMeasurer::from_system_font(),
    };
    match loaded {
        Ok(measurer) => Box::new(measurer),
        Err(e) => {
            warn!(error = %e, "No usable font, falling back to estimated text metrics");
            Box::new(EstimatedMeasurer)
        }
    }
}
