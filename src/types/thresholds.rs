//! Ritual threshold configuration

use serde::{Deserialize, Serialize};

/// Fully resolved thresholds for one ritual session
///
/// Immutable once resolved; a replay uses exactly one set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Distance from origin that completes the drag (px)
    pub drag_threshold_px: f64,
    /// Travel cap for drag progress (px)
    pub max_drag_travel_px: f64,
    /// Accumulated hold time that completes the hold (ms)
    pub hold_threshold_ms: f64,
    /// Ceiling for one hold tick's contribution (ms)
    pub hold_tick_ceiling_ms: f64,
    /// Allowed distance between held position and release (px)
    pub release_snap_px: f64,
}

/// Caller-supplied partial thresholds
///
/// Accepts both the camelCase wire names and snake_case config names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdOverrides {
    #[serde(default, alias = "drag_threshold_px", skip_serializing_if = "Option::is_none")]
    pub drag_threshold_px: Option<f64>,
    #[serde(default, alias = "max_drag_travel_px", skip_serializing_if = "Option::is_none")]
    pub max_drag_travel_px: Option<f64>,
    #[serde(default, alias = "hold_threshold_ms", skip_serializing_if = "Option::is_none")]
    pub hold_threshold_ms: Option<f64>,
    #[serde(default, alias = "hold_tick_ceiling_ms", skip_serializing_if = "Option::is_none")]
    pub hold_tick_ceiling_ms: Option<f64>,
    #[serde(default, alias = "release_snap_px", skip_serializing_if = "Option::is_none")]
    pub release_snap_px: Option<f64>,
}

impl ThresholdOverrides {
    /// Override only the drag threshold
    pub fn drag(px: f64) -> Self {
        Self {
            drag_threshold_px: Some(px),
            ..Self::default()
        }
    }

    /// Override only the hold threshold
    pub fn hold(ms: f64) -> Self {
        Self {
            hold_threshold_ms: Some(ms),
            ..Self::default()
        }
    }
}
