//! Engine configuration
//!
//! JSON file under the platform config dir. Every key is optional; missing
//! keys take their defaults and out-of-range values are clamped on load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::profile::LabelProfile;
use crate::constants::{candidates, drag, metrics, optimizer, persistence, timing};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub profile: LabelProfile,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// TrueType/OpenType file used for measuring; system fonts are searched when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Candidate search stops once a score at or below this is found
    #[serde(default = "default_good_enough_score")]
    pub good_enough_score: f32,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    #[serde(default = "default_ring_radii")]
    pub ring_radii: Vec<f32>,

    #[serde(default = "default_angles_per_ring")]
    pub angles_per_ring: usize,

    #[serde(default = "default_metrics_cache_capacity")]
    pub metrics_cache_capacity: usize,

    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,

    #[serde(default = "default_edit_debounce_ms")]
    pub edit_debounce_ms: u64,

    #[serde(default = "default_refresh_debounce_ms")]
    pub refresh_debounce_ms: u64,

    #[serde(default = "default_drag_move_threshold_px")]
    pub drag_move_threshold_px: f32,

    #[serde(default = "default_drag_min_update_interval_ms")]
    pub drag_min_update_interval_ms: u64,

    /// Snap distance for dragged labels (0 = disabled)
    #[serde(default = "default_snap_threshold_px")]
    pub snap_threshold_px: f32,

    #[serde(default = "default_storage_base_key")]
    pub storage_base_key: String,

    /// Directory for file-backed layouts; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_font_family() -> String {
    metrics::DEFAULT_FONT_FAMILY.to_string()
}

fn default_good_enough_score() -> f32 {
    optimizer::GOOD_ENOUGH_SCORE
}

fn default_max_attempts() -> usize {
    optimizer::MAX_ATTEMPTS
}

fn default_ring_radii() -> Vec<f32> {
    candidates::RING_RADII.to_vec()
}

fn default_angles_per_ring() -> usize {
    candidates::ANGLES_PER_RING
}

fn default_metrics_cache_capacity() -> usize {
    metrics::CACHE_CAPACITY
}

fn default_autosave_interval_ms() -> u64 {
    timing::AUTOSAVE_INTERVAL_MS
}

fn default_edit_debounce_ms() -> u64 {
    timing::EDIT_DEBOUNCE_MS
}

fn default_refresh_debounce_ms() -> u64 {
    timing::REFRESH_DEBOUNCE_MS
}

fn default_drag_move_threshold_px() -> f32 {
    drag::MOVE_THRESHOLD_PX
}

fn default_drag_min_update_interval_ms() -> u64 {
    drag::MIN_UPDATE_INTERVAL_MS
}

fn default_snap_threshold_px() -> f32 {
    drag::SNAP_THRESHOLD_PX
}

fn default_storage_base_key() -> String {
    persistence::BASE_KEY.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            profile: LabelProfile::default(),
            font_family: default_font_family(),
            font_path: None,
            good_enough_score: default_good_enough_score(),
            max_attempts: default_max_attempts(),
            ring_radii: default_ring_radii(),
            angles_per_ring: default_angles_per_ring(),
            metrics_cache_capacity: default_metrics_cache_capacity(),
            autosave_interval_ms: default_autosave_interval_ms(),
            edit_debounce_ms: default_edit_debounce_ms(),
            refresh_debounce_ms: default_refresh_debounce_ms(),
            drag_move_threshold_px: default_drag_move_threshold_px(),
            drag_min_update_interval_ms: default_drag_min_update_interval_ms(),
            snap_threshold_px: default_snap_threshold_px(),
            storage_base_key: default_storage_base_key(),
            storage_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load from the default path, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;
        config.validate_and_clamp();
        info!(path = %path.display(), profile = config.profile.name(), "Loaded engine config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "Saved engine config");
        Ok(())
    }

    /// Directory used by the file-backed store
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(crate::constants::config::APP_DIR);
            path.push(crate::constants::config::STORE_DIR);
            path
        })
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }

    pub fn edit_debounce(&self) -> Duration {
        Duration::from_millis(self.edit_debounce_ms)
    }

    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }

    pub fn drag_min_update_interval(&self) -> Duration {
        Duration::from_millis(self.drag_min_update_interval_ms)
    }

    /// Clamp config values to safe ranges
    pub fn validate_and_clamp(&mut self) {
        use crate::constants::validation::*;

        if !self.good_enough_score.is_finite() || self.good_enough_score < 0.0 {
            warn!(good_enough_score = self.good_enough_score, "good_enough_score invalid, using default");
            self.good_enough_score = default_good_enough_score();
        }

        if self.max_attempts < MIN_ATTEMPTS {
            warn!(max_attempts = self.max_attempts, min = MIN_ATTEMPTS, "max_attempts below minimum, clamping");
            self.max_attempts = MIN_ATTEMPTS;
        } else if self.max_attempts > MAX_ATTEMPTS {
            warn!(max_attempts = self.max_attempts, max = MAX_ATTEMPTS, "max_attempts exceeds maximum, clamping");
            self.max_attempts = MAX_ATTEMPTS;
        }

        let before = self.ring_radii.len();
        self.ring_radii.retain(|r| r.is_finite() && *r >= MIN_RING_RADIUS && *r <= MAX_RING_RADIUS);
        if self.ring_radii.len() != before {
            warn!(dropped = before - self.ring_radii.len(), "Dropped out-of-range ring radii");
        }
        if self.ring_radii.is_empty() {
            warn!("ring_radii empty, using defaults");
            self.ring_radii = default_ring_radii();
        }

        if self.angles_per_ring < MIN_ANGLES_PER_RING || self.angles_per_ring > MAX_ANGLES_PER_RING {
            warn!(angles_per_ring = self.angles_per_ring, "angles_per_ring out of range, clamping");
            self.angles_per_ring = self.angles_per_ring.clamp(MIN_ANGLES_PER_RING, MAX_ANGLES_PER_RING);
        }

        if self.metrics_cache_capacity < MIN_CACHE_CAPACITY || self.metrics_cache_capacity > MAX_CACHE_CAPACITY {
            warn!(capacity = self.metrics_cache_capacity, "metrics_cache_capacity out of range, clamping");
            self.metrics_cache_capacity = self.metrics_cache_capacity.clamp(MIN_CACHE_CAPACITY, MAX_CACHE_CAPACITY);
        }

        if self.autosave_interval_ms < MIN_AUTOSAVE_INTERVAL_MS {
            warn!(autosave_interval_ms = self.autosave_interval_ms, min = MIN_AUTOSAVE_INTERVAL_MS, "autosave interval below minimum, clamping");
            self.autosave_interval_ms = MIN_AUTOSAVE_INTERVAL_MS;
        }
        if self.edit_debounce_ms > MAX_DEBOUNCE_MS {
            warn!(edit_debounce_ms = self.edit_debounce_ms, max = MAX_DEBOUNCE_MS, "edit debounce exceeds maximum, clamping");
            self.edit_debounce_ms = MAX_DEBOUNCE_MS;
        }
        if self.refresh_debounce_ms > MAX_DEBOUNCE_MS {
            warn!(refresh_debounce_ms = self.refresh_debounce_ms, max = MAX_DEBOUNCE_MS, "refresh debounce exceeds maximum, clamping");
            self.refresh_debounce_ms = MAX_DEBOUNCE_MS;
        }

        if !self.drag_move_threshold_px.is_finite() || self.drag_move_threshold_px < 0.0 {
            warn!(drag_move_threshold_px = self.drag_move_threshold_px, "drag threshold invalid, using default");
            self.drag_move_threshold_px = default_drag_move_threshold_px();
        }

        if !self.snap_threshold_px.is_finite() || self.snap_threshold_px < 0.0 {
            warn!(snap_threshold_px = self.snap_threshold_px, "snap threshold invalid, disabling");
            self.snap_threshold_px = 0.0;
        } else if self.snap_threshold_px > MAX_SNAP_THRESHOLD_PX {
            warn!(snap_threshold_px = self.snap_threshold_px, max = MAX_SNAP_THRESHOLD_PX, "snap threshold exceeds maximum, clamping");
            self.snap_threshold_px = MAX_SNAP_THRESHOLD_PX;
        }

        if let LabelProfile::Custom { default_font_size, halo_size, .. } = &mut self.profile {
            if *default_font_size < MIN_FONT_SIZE || *default_font_size > MAX_FONT_SIZE {
                warn!(default_font_size = *default_font_size, "profile font size out of range, clamping");
                *default_font_size = default_font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
            }
            if *halo_size < 0.0 || *halo_size > MAX_HALO_SIZE {
                warn!(halo_size = *halo_size, "profile halo size out of range, clamping");
                *halo_size = halo_size.clamp(0.0, MAX_HALO_SIZE);
            }
        }

        if self.storage_base_key.trim().is_empty() {
            warn!("storage_base_key empty, using default");
            self.storage_base_key = default_storage_base_key();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("map-label-layout-config-{}-{}", std::process::id(), name))
            .join("config.json")
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.good_enough_score, 0.3);
        assert_eq!(config.max_attempts, 50);
        assert_eq!(config.ring_radii, vec![12.0, 20.0, 30.0, 45.0, 65.0]);
        assert_eq!(config.autosave_interval_ms, 30_000);
        assert_eq!(config.edit_debounce_ms, 1_000);
    }

    #[test]
    fn test_validate_clamps_out_of_range_values() {
        let mut config = EngineConfig {
            max_attempts: 0,
            ring_radii: vec![-5.0, 10.0, 10_000.0],
            angles_per_ring: 1000,
            metrics_cache_capacity: 1,
            autosave_interval_ms: 10,
            snap_threshold_px: -1.0,
            storage_base_key: "  ".to_string(),
            ..EngineConfig::default()
        };
        config.validate_and_clamp();

        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.ring_radii, vec![10.0]);
        assert_eq!(config.angles_per_ring, 64);
        assert_eq!(config.metrics_cache_capacity, 16);
        assert_eq!(config.autosave_interval_ms, 1_000);
        assert_eq!(config.snap_threshold_px, 0.0);
        assert_eq!(config.storage_base_key, "label_layout");
    }

    #[test]
    fn test_validate_restores_empty_radii() {
        let mut config = EngineConfig {
            ring_radii: vec![],
            ..EngineConfig::default()
        };
        config.validate_and_clamp();
        assert_eq!(config.ring_radii, default_ring_radii());
    }

    #[test]
    fn test_custom_profile_clamped() {
        let mut config = EngineConfig {
            profile: LabelProfile::Custom {
                default_font_size: 500.0,
                halo_size: -2.0,
                min_zoom: 3.0,
            },
            ..EngineConfig::default()
        };
        config.validate_and_clamp();
        assert_eq!(config.profile.default_font_size(), 96.0);
        assert_eq!(config.profile.halo_size(), 0.0);
        assert_eq!(config.profile.min_zoom(), 3.0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let config = EngineConfig {
            profile: LabelProfile::Area,
            snap_threshold_px: 8.0,
            ..EngineConfig::default()
        };
        config.save_to(&path).unwrap();

        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_from_invalid_json_errors() {
        let path = temp_path("invalid");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(EngineConfig::load_from(&path).is_err());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
