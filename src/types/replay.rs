//! Replay options, results and fixtures

use serde::{Deserialize, Serialize};
use crate::DEFAULT_RITUAL;
use crate::types::{
    Actor, DomainEvent, EvidenceSnapshot, EvidenceState, InteractionEvent,
    RawInteractionEvent, RitualSnapshot, RitualStage, RitualState,
    ThresholdOverrides, Thresholds,
};

/// How a trace is replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayOptions {
    pub ritual: String,
    pub thresholds: ThresholdOverrides,
    /// Feed emitted domain events into a fresh evidence ledger
    pub ingest_evidence: bool,
    /// Actor recorded on ingested evidence
    pub actor: Actor,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            ritual: DEFAULT_RITUAL.to_string(),
            thresholds: ThresholdOverrides::default(),
            ingest_evidence: true,
            actor: Actor::Replay,
        }
    }
}

impl ReplayOptions {
    pub fn for_ritual(ritual: impl Into<String>) -> Self {
        Self {
            ritual: ritual.into(),
            ..Self::default()
        }
    }
}

/// Everything a replay reproduces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResult {
    pub thresholds: Thresholds,
    pub final_state: RitualState,
    pub snapshot: RitualSnapshot,
    pub emitted_events: Vec<DomainEvent>,
    pub normalized_trace: Vec<InteractionEvent>,
    pub evidence: EvidenceState,
    pub evidence_snapshot: EvidenceSnapshot,
    /// SHA-256 (hex) over the canonical outputs
    pub digest: String,
}

impl ReplayResult {
    /// Names of the emitted events, in order
    pub fn event_names(&self) -> Vec<String> {
        self.emitted_events.iter().map(|e| e.name.clone()).collect()
    }
}

/// A recorded trace with the outcome it must reproduce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFixture {
    pub name: String,
    #[serde(default)]
    pub ritual: Option<String>,
    #[serde(default)]
    pub thresholds: Option<ThresholdOverrides>,
    pub trace: Vec<RawInteractionEvent>,
    pub expected_stage: RitualStage,
    pub expected_evidence_keys: Vec<String>,
    pub expected_event_names: Vec<String>,
}

/// One way a replay disagreed with its fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum FixtureMismatch {
    Stage { expected: RitualStage, actual: RitualStage },
    EvidenceKeys { expected: Vec<String>, actual: Vec<String> },
    EventNames { expected: Vec<String>, actual: Vec<String> },
}

impl std::fmt::Display for FixtureMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stage { expected, actual } => {
                write!(f, "stage: expected {}, got {}", expected, actual)
            }
            Self::EvidenceKeys { expected, actual } => {
                write!(f, "evidence keys: expected {:?}, got {:?}", expected, actual)
            }
            Self::EventNames { expected, actual } => {
                write!(f, "event names: expected {:?}, got {:?}", expected, actual)
            }
        }
    }
}

/// Outcome of checking one fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureReport {
    pub name: String,
    pub digest: String,
    pub mismatches: Vec<FixtureMismatch>,
}

impl FixtureReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}
