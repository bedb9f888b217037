//! Reason codes for broken gestures and locked gates

use serde::{Deserialize, Serialize};

/// Why an in-progress gesture was thrown back to idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum CancelReason {
    // =========================================================================
    // R101: Pointer signals
    // =========================================================================
    /// The platform cancelled the pointer
    #[serde(rename = "pointer-cancelled")]
    R101_POINTER_CANCELLED,
    /// A different pointer interfered with the active gesture
    #[serde(rename = "pointer-mismatch")]
    R101_POINTER_MISMATCH,

    // =========================================================================
    // R102: Release rules
    // =========================================================================
    /// Pointer released before the hold completed
    #[serde(rename = "released-early")]
    R102_RELEASED_EARLY,
    /// Pointer released too far from the held position
    #[serde(rename = "release-off-anchor")]
    R102_RELEASE_OFF_ANCHOR,
}

impl CancelReason {
    /// Get the code string (for payloads and logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_POINTER_CANCELLED => "pointer-cancelled",
            Self::R101_POINTER_MISMATCH => "pointer-mismatch",
            Self::R102_RELEASED_EARLY => "released-early",
            Self::R102_RELEASE_OFF_ANCHOR => "release-off-anchor",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_POINTER_CANCELLED => "Pointer cancelled by the platform",
            Self::R101_POINTER_MISMATCH => "Another pointer interrupted the gesture",
            Self::R102_RELEASED_EARLY => "Released before the hold completed",
            Self::R102_RELEASE_OFF_ANCHOR => "Released away from the held position",
        }
    }
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Why a feature gate is not ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum GateReason {
    /// Global demo feature flag is off
    #[serde(rename = "wow-demo-disabled")]
    G001_WOW_DEMO_DISABLED,
    /// Boot lifecycle has not armed the deck
    #[serde(rename = "boot-gate-locked:not-armed")]
    G002_BOOT_NOT_ARMED,
    /// Autostart is never time-driven, even when armed
    #[serde(rename = "autostart-disabled-by-boot-contract")]
    G003_AUTOSTART_FORBIDDEN,
}

impl GateReason {
    /// Get the code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::G001_WOW_DEMO_DISABLED => "wow-demo-disabled",
            Self::G002_BOOT_NOT_ARMED => "boot-gate-locked:not-armed",
            Self::G003_AUTOSTART_FORBIDDEN => "autostart-disabled-by-boot-contract",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::G001_WOW_DEMO_DISABLED => "Demo features are switched off",
            Self::G002_BOOT_NOT_ARMED => "Boot ritual has not armed the deck",
            Self::G003_AUTOSTART_FORBIDDEN => "Autostart requires an explicit operator input",
        }
    }
}

impl std::fmt::Display for GateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
