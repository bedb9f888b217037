//! Threshold resolver: overrides shallow-merged over the default table

use crate::{
    DEFAULT_DRAG_THRESHOLD_PX, DEFAULT_MAX_DRAG_TRAVEL_PX, DEFAULT_HOLD_THRESHOLD_MS,
    DEFAULT_HOLD_TICK_CEILING_MS, DEFAULT_RELEASE_SNAP_PX,
};
use crate::types::{Thresholds, ThresholdOverrides};

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            max_drag_travel_px: DEFAULT_MAX_DRAG_TRAVEL_PX,
            hold_threshold_ms: DEFAULT_HOLD_THRESHOLD_MS,
            hold_tick_ceiling_ms: DEFAULT_HOLD_TICK_CEILING_MS,
            release_snap_px: DEFAULT_RELEASE_SNAP_PX,
        }
    }
}

/// Resolve a total threshold set
///
/// Overrides pass through unvalidated; sanity of the values is the
/// caller's responsibility.
pub fn resolve_thresholds(overrides: Option<&ThresholdOverrides>) -> Thresholds {
    let defaults = Thresholds::default();
    let Some(o) = overrides else {
        return defaults;
    };

    Thresholds {
        drag_threshold_px: o.drag_threshold_px.unwrap_or(defaults.drag_threshold_px),
        max_drag_travel_px: o.max_drag_travel_px.unwrap_or(defaults.max_drag_travel_px),
        hold_threshold_ms: o.hold_threshold_ms.unwrap_or(defaults.hold_threshold_ms),
        hold_tick_ceiling_ms: o.hold_tick_ceiling_ms.unwrap_or(defaults.hold_tick_ceiling_ms),
        release_snap_px: o.release_snap_px.unwrap_or(defaults.release_snap_px),
    }
}

// =============================================================================
// TESTS
// =============================================================================
