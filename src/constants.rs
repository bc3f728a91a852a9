//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the engine, providing a single source of truth for constant values.

/// Candidate offset generation
pub mod candidates {
    /// Concentric ring radii (screen pixels) sampled around the anchor
    pub const RING_RADII: [f32; 5] = [12.0, 20.0, 30.0, 45.0, 65.0];

    /// Number of evenly spaced angles sampled on each ring
    pub const ANGLES_PER_RING: usize = 8;

    /// Extra cardinal/diagonal offsets appended after the rings (dx, dy, y-up)
    pub const STRATEGIC_OFFSETS: &[(f32, f32)] = &[
        (0.0, 25.0),
        (25.0, 0.0),
        (-25.0, 0.0),
        (0.0, -25.0),
        (35.0, 35.0),
        (-35.0, 35.0),
        (35.0, -35.0),
        (-35.0, -35.0),
        (0.0, 45.0),
        (45.0, 0.0),
        (0.0, 80.0),
        (80.0, 0.0),
        (-80.0, 0.0),
        (0.0, -80.0),
    ];

    /// Offsets closer than this are considered duplicates
    pub const DEDUP_EPSILON: f32 = 0.5;
}

/// Collision scoring
pub mod scoring {
    /// Penalty per squared pixel of distance from the zero offset
    pub const DISTANCE_PENALTY: f32 = 0.0002;

    /// Fixed penalty for placing a label below its anchor
    pub const BELOW_PENALTY: f32 = 0.05;

    /// Fixed penalty for placing a label left of its anchor
    pub const LEFT_PENALTY: f32 = 0.02;

    /// Accumulated overlap beyond this stops the pairwise loop
    pub const SCORE_CEILING: f32 = 1.0e6;

    /// Weight multiplier for labels that have not been placed yet
    pub const UNPLACED_WEIGHT_FACTOR: f32 = 0.5;

    /// Weight contributions
    pub const BASE_FONT_SIZE: f32 = 10.0;
    pub const BOLD_FACTOR: f32 = 1.3;
    pub const BACKGROUND_FACTOR: f32 = 1.2;
    pub const TEXT_LENGTH_CAP: usize = 30;
    pub const TEXT_LENGTH_FACTOR: f32 = 0.5;
}

/// Placement optimizer
pub mod optimizer {
    /// Scores at or below this stop the candidate search for a label
    pub const GOOD_ENOUGH_SCORE: f32 = 0.3;

    /// Maximum number of candidates tried per label
    pub const MAX_ATTEMPTS: usize = 50;

    /// Fraction of the batch size that must overlap to trigger a global pass
    pub const GLOBAL_PASS_FRACTION: f32 = 0.2;

    /// Overlapping pairs that always trigger a global pass
    pub const GLOBAL_PASS_MAX_PAIRS: usize = 5;
}

/// Text measurement
pub mod metrics {
    /// Maximum cached measurements before the oldest are evicted
    pub const CACHE_CAPACITY: usize = 1000;

    /// Line height as a multiple of the font size
    pub const LINE_HEIGHT: f32 = 1.2;

    /// Width multiplier applied to bold text by the estimating measurer
    pub const BOLD_WIDTH_FACTOR: f32 = 1.08;

    /// Padding around text when the label has a background fill
    pub const BACKGROUND_PADDING: f32 = 3.0;

    /// Font family used when a request leaves it empty
    pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
}

/// Storage layout
pub mod persistence {
    /// Base storage key for saved layouts
    pub const BASE_KEY: &str = "label_layout";

    /// Key segment preceding the map configuration id
    pub const CONFIG_SEGMENT: &str = "_config_";

    /// Key segment preceding the map type
    pub const TYPE_SEGMENT: &str = "_type_";

    /// Extension for file-backed keys
    pub const FILE_EXTENSION: &str = "json";
}

/// Cooperative timers
pub mod timing {
    /// Periodic autosave flush interval
    pub const AUTOSAVE_INTERVAL_MS: u64 = 30_000;

    /// Quiet period after an edit before a debounced save
    pub const EDIT_DEBOUNCE_MS: u64 = 1_000;

    /// Quiet period after a map movement before labels are re-applied
    pub const REFRESH_DEBOUNCE_MS: u64 = 150;
}

/// Interactive dragging
pub mod drag {
    /// Pointer travel (pixels) below which a selection does not start dragging
    pub const MOVE_THRESHOLD_PX: f32 = 2.0;

    /// Minimum interval between applied drag updates (~60 per second)
    pub const MIN_UPDATE_INTERVAL_MS: u64 = 16;

    /// Snap distance in pixels (0 = disabled)
    pub const SNAP_THRESHOLD_PX: f32 = 0.0;
}

/// Config file location
pub mod config {
    /// Directory under the platform config/data dirs
    pub const APP_DIR: &str = "map-label-layout";

    /// Config file name
    pub const FILENAME: &str = "config.json";

    /// Directory holding file-backed layouts
    pub const STORE_DIR: &str = "layouts";
}

/// Config validation ranges
pub mod validation {
    pub const MIN_FONT_SIZE: f32 = 4.0;
    pub const MAX_FONT_SIZE: f32 = 96.0;
    pub const MAX_HALO_SIZE: f32 = 20.0;
    pub const MIN_ATTEMPTS: usize = 1;
    pub const MAX_ATTEMPTS: usize = 500;
    pub const MIN_RING_RADIUS: f32 = 1.0;
    pub const MAX_RING_RADIUS: f32 = 500.0;
    pub const MIN_ANGLES_PER_RING: usize = 1;
    pub const MAX_ANGLES_PER_RING: usize = 64;
    pub const MIN_CACHE_CAPACITY: usize = 16;
    pub const MAX_CACHE_CAPACITY: usize = 100_000;
    pub const MIN_AUTOSAVE_INTERVAL_MS: u64 = 1_000;
    pub const MAX_DEBOUNCE_MS: u64 = 60_000;
    pub const MAX_SNAP_THRESHOLD_PX: f32 = 100.0;
}
