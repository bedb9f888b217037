//! Evidence ledger types
//!
//! - Definitions are static and validated once at registry load
//! - Entries carry full provenance and an append-only transition history
//! - The store state is a value type, replaced on every reduce

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Whether an evidence key gates readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceLevel {
    Blocker,
    Informational,
}

/// Static definition of one evidence key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDefinition {
    pub key: String,
    /// Short alias shown in the audit trail
    pub stable_id: String,
    /// Display position, contiguous from 1
    pub slot: u16,
    pub title: String,
    pub description: String,
    pub level: EvidenceLevel,
    /// Actions that unsatisfy this key
    pub blockers: Vec<String>,
}

/// Effect of an action on one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Satisfy,
    Unsatisfy,
    Noop,
}

/// One `{key, kind}` pair produced by an action lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTransition {
    pub key: String,
    pub kind: TransitionKind,
}

impl EvidenceTransition {
    pub fn new(key: impl Into<String>, kind: TransitionKind) -> Self {
        Self { key: key.into(), kind }
    }
}

/// Who raised an ingested action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    /// A human at the deck
    Operator,
    /// The ritual machine or boot lifecycle
    System,
    /// A recorded trace being replayed
    Replay,
}

/// An action as it enters the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionEvent {
    pub event_id: String,
    pub action: String,
    pub ts: u64,
    pub actor: Actor,
    /// Explicit anchor; otherwise derived from `anchor:<id>:<verb>` actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl IngestionEvent {
    pub fn new(event_id: impl Into<String>, action: impl Into<String>, ts: u64, actor: Actor) -> Self {
        Self {
            event_id: event_id.into(),
            action: action.into(),
            ts,
            actor,
            anchor: None,
        }
    }
}

/// One line of an entry's audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub event_id: String,
    pub action: String,
    pub ts: u64,
    pub kind: TransitionKind,
    pub actor: Actor,
}

/// Live state of one evidence key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEntry {
    pub key: String,
    pub satisfied: bool,
    pub satisfied_at_ts: Option<u64>,
    pub satisfied_by_event_id: Option<String>,
    pub satisfied_by_action: Option<String>,
    pub last_transition_at_ts: Option<u64>,
    /// Append-only, in ingestion order
    pub transition_history: Vec<HistoryRecord>,
}

impl EvidenceEntry {
    /// Fresh unsatisfied entry
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            satisfied: false,
            satisfied_at_ts: None,
            satisfied_by_event_id: None,
            satisfied_by_action: None,
            last_transition_at_ts: None,
            transition_history: Vec::new(),
        }
    }
}

/// Whole evidence store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceState {
    pub registry_version: u32,
    pub entries: BTreeMap<String, EvidenceEntry>,
    pub event_log: Vec<IngestionEvent>,
    pub event_count: u64,
    pub last_event: Option<IngestionEvent>,
    pub last_interacted_anchor: Option<String>,
}

impl EvidenceState {
    /// Entry for a key, if registered
    pub fn entry(&self, key: &str) -> Option<&EvidenceEntry> {
        self.entries.get(key)
    }

    /// Is this key currently satisfied?
    pub fn is_satisfied(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.satisfied)
    }
}

/// Input to the evidence reducer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidenceAction {
    /// Apply an action's transitions and log it
    Ingest(IngestionEvent),
    /// Clear every entry and the event log
    Reset,
}

/// Versioned, schema-tagged export of an evidence store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSnapshot {
    pub schema: String,
    pub exported_at_ts: u64,
    pub registry_version: u32,
    pub entries: BTreeMap<String, EvidenceEntry>,
    pub event_log: Vec<IngestionEvent>,
    pub event_count: u64,
    pub last_interacted_anchor: Option<String>,
}
