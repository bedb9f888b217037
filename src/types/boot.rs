//! Boot/arm lifecycle and feature gate types

use serde::{Deserialize, Serialize};
use crate::types::GateReason;

/// Top-level arm status of the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BootStatus {
    /// Nothing armed
    Idle,
    /// Arm requested, waiting for confirmation
    ArmedPendingConfirm,
    /// Fully armed
    ArmedConfirmed,
    /// Operator override; separate trust tier, primary evidence untouched
    OperatorAssisted,
}

impl std::fmt::Display for BootStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BootStatus::Idle => "IDLE",
            BootStatus::ArmedPendingConfirm => "ARMED_PENDING_CONFIRM",
            BootStatus::ArmedConfirmed => "ARMED_CONFIRMED",
            BootStatus::OperatorAssisted => "OPERATOR_ASSISTED",
        };
        write!(f, "{}", name)
    }
}

/// Boot lifecycle state, owned by the boot reducer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootState {
    pub status: BootStatus,
    pub override_enabled: bool,
    pub pending_at_ts: Option<u64>,
    pub armed_at_ts: Option<u64>,
    /// Marker of the last action, `:ignored` suffixed when it was a no-op
    pub last_action: Option<String>,
}

/// Input to the boot reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BootAction {
    RequestArm { ts: u64 },
    ConfirmArm { ts: u64 },
    OverrideEnable { ts: u64 },
    OverrideDisable { ts: u64 },
    /// `satisfied_at_ts` of the primary blocker, `None` when unsatisfied
    SyncWithEvidence {
        #[serde(rename = "satisfiedAtTs")]
        satisfied_at_ts: Option<u64>,
    },
    Reset { ts: u64 },
}

/// Global feature switches supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    /// Master switch for every demo feature
    #[serde(alias = "wow_demo")]
    pub wow_demo: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { wow_demo: true }
    }
}

/// Derived availability of one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureGate {
    pub locked: bool,
    pub ready: bool,
    /// Unlocked through the operator override rather than full arming
    pub operator_assisted: bool,
    pub reason: Option<GateReason>,
}

/// Gates for every gated feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateMap {
    pub tour: FeatureGate,
    pub demo_script: FeatureGate,
    pub opening_cinema: FeatureGate,
    pub autostart: FeatureGate,
}

impl GateMap {
    /// Gates with their wire names, in display order
    pub fn entries(&self) -> [(&'static str, FeatureGate); 4] {
        [
            ("tour", self.tour),
            ("demoScript", self.demo_script),
            ("openingCinema", self.opening_cinema),
            ("autostart", self.autostart),
        ]
    }
}
