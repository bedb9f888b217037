//! Evidence ledger: event-sourced store of evidence satisfaction
//!
//! Mutated only through ingest or reset, each producing a new state.
//! - satisfy: satisfied, provenance recorded
//! - unsatisfy: unsatisfied, provenance cleared
//! - noop: history only
//! - reset (or the reset action): every entry and the event log wiped

use std::collections::BTreeMap;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use crate::core::registry::EvidenceRegistry;
use crate::types::{
    EvidenceAction, EvidenceEntry, EvidenceState, EvidenceTransition, HistoryRecord,
    IngestionEvent, TransitionKind,
};

lazy_static! {
    static ref RE_ANCHOR_ACTION: Regex = Regex::new(
        r"^anchor:([a-z0-9][a-z0-9-]*):[a-z0-9-]+$"
    ).unwrap();
}

/// Ledger bound to a registry
#[derive(Debug, Clone, Copy)]
pub struct EvidenceLedger<'r> {
    registry: &'r EvidenceRegistry,
}

impl Default for EvidenceLedger<'static> {
    fn default() -> Self {
        Self::new(EvidenceRegistry::standard())
    }
}

impl<'r> EvidenceLedger<'r> {
    pub fn new(registry: &'r EvidenceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r EvidenceRegistry {
        self.registry
    }

    /// Every registered key present and unsatisfied
    pub fn initial_state(&self) -> EvidenceState {
        let entries: BTreeMap<String, EvidenceEntry> = self
            .registry
            .definitions()
            .iter()
            .map(|d| (d.key.clone(), EvidenceEntry::new(d.key.clone())))
            .collect();

        EvidenceState {
            registry_version: self.registry.version(),
            entries,
            event_log: Vec::new(),
            event_count: 0,
            last_event: None,
            last_interacted_anchor: None,
        }
    }

    /// Apply one action
    pub fn reduce(&self, state: &EvidenceState, action: &EvidenceAction) -> EvidenceState {
        match action {
            EvidenceAction::Reset => self.initial_state(),
            EvidenceAction::Ingest(event) => {
                if self.registry.is_reset_action(&event.action) {
                    debug!(event_id = %event.event_id, "evidence reset");
                    return self.initial_state();
                }
                let transitions = self.registry.transitions_for_action(&event.action);
                self.ingest(state, event, &transitions)
            }
        }
    }

    /// Log an event and apply the given transitions to registered entries
    fn ingest(
        &self,
        state: &EvidenceState,
        event: &IngestionEvent,
        transitions: &[EvidenceTransition],
    ) -> EvidenceState {
        let mut next = state.clone();
        next.event_log.push(event.clone());
        next.event_count += 1;
        next.last_event = Some(event.clone());
        if let Some(anchor) = anchor_of(event) {
            next.last_interacted_anchor = Some(anchor);
        }

        for transition in transitions {
            if self.registry.definition(&transition.key).is_none() {
                continue;
            }
            let entry = next
                .entries
                .entry(transition.key.clone())
                .or_insert_with(|| EvidenceEntry::new(transition.key.clone()));
            apply_transition(entry, event, transition.kind);
        }

        debug!(
            action = %event.action,
            event_id = %event.event_id,
            transitions = transitions.len(),
            "evidence ingested"
        );
        next
    }

    /// Blocker keys not yet satisfied, in slot order
    pub fn missing_blockers(&self, state: &EvidenceState) -> Vec<String> {
        self.registry
            .blocker_keys()
            .filter(|key| !state.is_satisfied(key))
            .map(String::from)
            .collect()
    }

    /// True iff no blocker is missing
    pub fn is_ready(&self, state: &EvidenceState) -> bool {
        self.missing_blockers(state).is_empty()
    }

    /// Satisfied keys of any level, in slot order
    pub fn satisfied_keys(&self, state: &EvidenceState) -> Vec<String> {
        self.registry
            .definitions()
            .iter()
            .filter(|d| state.is_satisfied(&d.key))
            .map(|d| d.key.clone())
            .collect()
    }
}

fn apply_transition(entry: &mut EvidenceEntry, event: &IngestionEvent, kind: TransitionKind) {
    match kind {
        TransitionKind::Satisfy => {
            entry.satisfied = true;
            entry.satisfied_at_ts = Some(event.ts);
            entry.satisfied_by_event_id = Some(event.event_id.clone());
            entry.satisfied_by_action = Some(event.action.clone());
            entry.last_transition_at_ts = Some(event.ts);
        }
        TransitionKind::Unsatisfy => {
            entry.satisfied = false;
            entry.satisfied_at_ts = None;
            entry.satisfied_by_event_id = None;
            entry.satisfied_by_action = None;
            entry.last_transition_at_ts = Some(event.ts);
        }
        TransitionKind::Noop => {}
    }

    entry.transition_history.push(HistoryRecord {
        event_id: event.event_id.clone(),
        action: event.action.clone(),
        ts: event.ts,
        kind,
        actor: event.actor,
    });
}

fn anchor_of(event: &IngestionEvent) -> Option<String> {
    if let Some(anchor) = &event.anchor {
        return Some(anchor.clone());
    }
    RE_ANCHOR_ACTION
        .captures(&event.action)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// =============================================================================
// STANDARD-REGISTRY SHORTHANDS
// =============================================================================

pub fn create_initial_evidence_state() -> EvidenceState {
    EvidenceLedger::default().initial_state()
}

pub fn reduce_evidence_state(state: &EvidenceState, action: &EvidenceAction) -> EvidenceState {
    EvidenceLedger::default().reduce(state, action)
}

pub fn transitions_for_action(action: &str) -> Vec<EvidenceTransition> {
    EvidenceRegistry::standard().transitions_for_action(action)
}

pub fn select_missing_blocker_keys(state: &EvidenceState) -> Vec<String> {
    EvidenceLedger::default().missing_blockers(state)
}

pub fn select_evidence_ready(state: &EvidenceState) -> bool {
    EvidenceLedger::default().is_ready(state)
}

// =============================================================================
// TESTS
// =============================================================================
