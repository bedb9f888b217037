//! Ritual machine state, context and emitted domain events

use serde::{Deserialize, Serialize};
use crate::DEFAULT_RITUAL;
use crate::types::{InteractionEvent, RitualStage};

/// State of one ritual; a value type, replaced on every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualState {
    pub stage: RitualStage,
    /// In [0, 1], non-decreasing within one gesture
    pub drag_progress: f64,
    /// In [0, 1], non-decreasing within one gesture
    pub hold_progress: f64,
    pub active_pointer_id: Option<u32>,
    pub origin_x: f64,
    pub origin_y: f64,
    /// Last tracked position; frozen as the held position once the drag completes
    pub last_x: f64,
    pub last_y: f64,
    /// Most recent event that changed this state
    pub last_event: Option<InteractionEvent>,
}

impl RitualState {
    /// Compare everything except `last_event`
    pub fn same_observable(&self, other: &RitualState) -> bool {
        self.stage == other.stage
            && self.drag_progress == other.drag_progress
            && self.hold_progress == other.hold_progress
            && self.active_pointer_id == other.active_pointer_id
            && self.origin_x == other.origin_x
            && self.origin_y == other.origin_y
            && self.last_x == other.last_x
            && self.last_y == other.last_y
    }
}

/// Caller-owned context for a ritual; replaces ambient UI globals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualContext {
    /// Ritual name used inside domain event names (e.g. "boot", "route")
    pub ritual: String,
}

impl Default for RitualContext {
    fn default() -> Self {
        Self::new(DEFAULT_RITUAL)
    }
}

impl RitualContext {
    pub fn new(ritual: impl Into<String>) -> Self {
        Self { ritual: ritual.into() }
    }

    pub fn graph_link_engaged(&self) -> String {
        format!("anchor:{}-graph-link:engaged", self.ritual)
    }

    pub fn drag_completed(&self) -> String {
        format!("gesture:{}-drag:completed", self.ritual)
    }

    pub fn hold_completed(&self) -> String {
        format!("gesture:{}-hold:completed", self.ritual)
    }

    pub fn release_completed(&self) -> String {
        format!("gesture:{}-release:completed", self.ritual)
    }

    pub fn sealed_set(&self) -> String {
        format!("state:{}-sealed:set", self.ritual)
    }

    pub fn primary_satisfied(&self) -> String {
        format!("evidence:{}-primary:satisfied", self.ritual)
    }

    pub fn ritual_cancelled(&self) -> String {
        format!("gesture:{}-ritual:cancelled", self.ritual)
    }
}

/// Side-channel output of a transition, never part of state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// Stable namespaced name, e.g. `gesture:boot-drag:completed`
    pub name: String,
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl DomainEvent {
    pub fn new(name: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            name: name.into(),
            timestamp_ms,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Result of one machine step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualTransition {
    pub state: RitualState,
    pub events: Vec<DomainEvent>,
}
