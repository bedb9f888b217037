//! Read-only ritual projection for rendering

use serde::{Deserialize, Serialize};
use crate::types::RitualStage;

/// What the UI needs to draw a ritual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualSnapshot {
    pub stage: RitualStage,
    pub drag_progress: f64,
    pub hold_progress: f64,
    /// Euclidean distance between origin and last tracked position
    pub drag_distance_px: f64,
    /// Distance still missing before the drag completes
    pub drag_remaining_px: f64,
    /// Hold time still missing before the hold completes
    pub hold_remaining_ms: f64,
    pub active_pointer_id: Option<u32>,
    pub in_progress: bool,
    pub sealed: bool,
}

impl RitualSnapshot {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let line = format!(
            "{} stage={} | drag={:.0}% | hold={:.0}%",
            self.stage.emoji(),
            self.stage,
            self.drag_progress * 100.0,
            self.hold_progress * 100.0,
        );
        self.stage.paint(&line).to_string()
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "stage={} | drag={:.3} | hold={:.3} | remaining_px={:.1} | remaining_ms={:.0}",
            self.stage,
            self.drag_progress,
            self.hold_progress,
            self.drag_remaining_px,
            self.hold_remaining_ms,
        )
    }
}
