//! Ritual stage definitions

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

/// The six stages of a drag → hold → release ritual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RitualStage {
    /// No gesture in progress
    Idle,
    /// Pointer down, travelling toward the drag threshold
    Dragging,
    /// Drag threshold reached, waiting for hold ticks
    DragComplete,
    /// Hold ticks accumulating
    Holding,
    /// Hold threshold reached, waiting for release
    HoldComplete,
    /// Ritual finished; terminal until reset
    Sealed,
}

impl RitualStage {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RitualStage::Idle => "idle",
            RitualStage::Dragging => "dragging",
            RitualStage::DragComplete => "drag-complete",
            RitualStage::Holding => "holding",
            RitualStage::HoldComplete => "hold-complete",
            RitualStage::Sealed => "sealed",
        }
    }

    /// A pointer gesture is underway
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, RitualStage::Idle | RitualStage::Sealed)
    }

    /// Paint text in this stage's terminal color
    pub fn paint(&self, text: &str) -> ColoredString {
        match self {
            RitualStage::Idle => text.bright_black(),
            RitualStage::Dragging | RitualStage::Holding => text.yellow(),
            RitualStage::DragComplete | RitualStage::HoldComplete => text.cyan(),
            RitualStage::Sealed => text.green().bold(),
        }
    }

    /// Get emoji for stage
    pub fn emoji(&self) -> &'static str {
        match self {
            RitualStage::Idle => "⏳",
            RitualStage::Dragging => "👉",
            RitualStage::DragComplete => "🔗",
            RitualStage::Holding => "✋",
            RitualStage::HoldComplete => "🔶",
            RitualStage::Sealed => "🔒",
        }
    }
}

impl std::fmt::Display for RitualStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
