//! Deterministic replay of recorded interaction traces
//!
//! A replay normalizes the trace, folds the ritual machine over it from a
//! fresh state and (optionally) feeds every emitted domain event into a
//! fresh evidence ledger. Nothing here reads the clock: identical traces
//! give identical results and identical digests.

use std::path::Path;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use crate::core::ledger::EvidenceLedger;
use crate::core::normalizer::normalize_events;
use crate::core::ritual::{create_initial_state, derive_snapshot, transition_state};
use crate::core::snapshot::serialize_snapshot;
use crate::core::thresholds::resolve_thresholds;
use crate::types::{
    EvidenceAction, EvidenceSnapshot, FixtureMismatch, FixtureReport, IngestionEvent,
    RawInteractionEvent, ReplayFixture, ReplayOptions, ReplayResult, RitualContext,
    RitualSnapshot, RitualState,
};

/// Failures loading a fixture file
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read fixture {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("cannot parse fixture {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Canonical digest input; field order is fixed by the struct
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestInput<'a> {
    final_state: &'a RitualState,
    snapshot: &'a RitualSnapshot,
    event_names: &'a [String],
    evidence_snapshot: &'a EvidenceSnapshot,
}

/// Replay a raw trace from scratch
pub fn replay_trace(trace: &[RawInteractionEvent], options: &ReplayOptions) -> ReplayResult {
    let thresholds = resolve_thresholds(Some(&options.thresholds));
    let context = RitualContext::new(options.ritual.clone());
    let normalized_trace = normalize_events(trace);

    let mut state = create_initial_state(&thresholds);
    let mut emitted_events = Vec::new();
    for event in &normalized_trace {
        let transition = transition_state(&state, event, &thresholds, &context);
        state = transition.state;
        emitted_events.extend(transition.events);
    }

    let ledger = EvidenceLedger::default();
    let mut evidence = ledger.initial_state();
    if options.ingest_evidence {
        for (seq, domain_event) in emitted_events.iter().enumerate() {
            let ingestion = IngestionEvent::new(
                format!("evt-{:06}", seq + 1),
                domain_event.name.clone(),
                domain_event.timestamp_ms,
                options.actor,
            );
            evidence = ledger.reduce(&evidence, &EvidenceAction::Ingest(ingestion));
        }
    }

    let exported_at_ts = normalized_trace.last().map(|e| e.timestamp_ms()).unwrap_or(0);
    let evidence_snapshot = serialize_snapshot(&evidence, exported_at_ts);
    let snapshot = derive_snapshot(&state, &thresholds);
    let event_names: Vec<String> = emitted_events.iter().map(|e| e.name.clone()).collect();
    let digest = replay_digest(&state, &snapshot, &event_names, &evidence_snapshot);

    debug!(
        ritual = %context.ritual,
        events = normalized_trace.len(),
        emitted = emitted_events.len(),
        stage = %state.stage,
        digest = %digest,
        "trace replayed"
    );

    ReplayResult {
        thresholds,
        final_state: state,
        snapshot,
        emitted_events,
        normalized_trace,
        evidence,
        evidence_snapshot,
        digest,
    }
}

/// SHA-256 (lowercase hex) over the canonical JSON of a replay's outputs
pub fn replay_digest(
    final_state: &RitualState,
    snapshot: &RitualSnapshot,
    event_names: &[String],
    evidence_snapshot: &EvidenceSnapshot,
) -> String {
    let input = DigestInput {
        final_state,
        snapshot,
        event_names,
        evidence_snapshot,
    };
    let canonical = serde_json::to_vec(&input).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

/// Replay a fixture and collect every disagreement with its expectations
pub fn verify_fixture(fixture: &ReplayFixture) -> FixtureReport {
    let options = ReplayOptions {
        ritual: fixture
            .ritual
            .clone()
            .unwrap_or_else(|| ReplayOptions::default().ritual),
        thresholds: fixture.thresholds.unwrap_or_default(),
        ..ReplayOptions::default()
    };
    let result = replay_trace(&fixture.trace, &options);

    let mut mismatches = Vec::new();
    if result.final_state.stage != fixture.expected_stage {
        mismatches.push(FixtureMismatch::Stage {
            expected: fixture.expected_stage,
            actual: result.final_state.stage,
        });
    }

    let satisfied = EvidenceLedger::default().satisfied_keys(&result.evidence);
    if satisfied != fixture.expected_evidence_keys {
        mismatches.push(FixtureMismatch::EvidenceKeys {
            expected: fixture.expected_evidence_keys.clone(),
            actual: satisfied,
        });
    }

    let names = result.event_names();
    if names != fixture.expected_event_names {
        mismatches.push(FixtureMismatch::EventNames {
            expected: fixture.expected_event_names.clone(),
            actual: names,
        });
    }

    FixtureReport {
        name: fixture.name.clone(),
        digest: result.digest,
        mismatches,
    }
}

/// Load a fixture from a JSON file
pub fn load_fixture(path: &Path) -> Result<ReplayFixture, FixtureError> {
    let display = path.display().to_string();
    let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| FixtureError::Parse {
        path: display,
        source,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actor, RitualStage, ThresholdOverrides};

    fn sealed_trace() -> Vec<RawInteractionEvent> {
        vec![
            RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 0.0),
            RawInteractionEvent::pointer_move(1.0, 120.0, 0.0, 16.0),
            RawInteractionEvent::hold_tick(300.0, 316.0),
            RawInteractionEvent::hold_tick(300.0, 616.0),
            RawInteractionEvent::pointer_up(1.0, 120.0, 0.0, 700.0),
        ]
    }

    #[test]
    fn test_sealed_boot_trace() {
        let result = replay_trace(&sealed_trace(), &ReplayOptions::default());
        assert_eq!(result.final_state.stage, RitualStage::Sealed);
        assert_eq!(
            result.event_names(),
            vec![
                "anchor:boot-graph-link:engaged",
                "gesture:boot-drag:completed",
                "gesture:boot-hold:completed",
                "gesture:boot-release:completed",
                "state:boot-sealed:set",
                "evidence:boot-primary:satisfied",
            ]
        );
        assert!(result.evidence.is_satisfied(crate::PRIMARY_EVIDENCE_KEY));
        assert_eq!(result.evidence_snapshot.exported_at_ts, 700);
        assert_eq!(result.evidence.event_count, 6);
    }

    #[test]
    fn test_ingestion_ids_and_actor() {
        let result = replay_trace(&sealed_trace(), &ReplayOptions::default());
        let first = &result.evidence.event_log[0];
        assert_eq!(first.event_id, "evt-000001");
        assert_eq!(first.actor, Actor::Replay);
        assert_eq!(first.ts, 16);
        assert_eq!(result.evidence.event_log[5].event_id, "evt-000006");
    }

    #[test]
    fn test_unsorted_trace_is_normalized_first() {
        let mut trace = sealed_trace();
        trace.reverse();
        let sorted = replay_trace(&sealed_trace(), &ReplayOptions::default());
        let reversed = replay_trace(&trace, &ReplayOptions::default());
        assert_eq!(sorted.digest, reversed.digest);
        assert_eq!(reversed.final_state.stage, RitualStage::Sealed);
    }

    #[test]
    fn test_repeat_replays_are_identical() {
        let options = ReplayOptions::for_ritual("route");
        let a = replay_trace(&sealed_trace(), &options);
        let b = replay_trace(&sealed_trace(), &options);
        let c = replay_trace(&sealed_trace(), &options);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&c).unwrap()
        );
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let result = replay_trace(&sealed_trace(), &ReplayOptions::default());
        assert_eq!(result.digest.len(), 64);
        assert!(result.digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_digest_changes_with_outcome() {
        let sealed = replay_trace(&sealed_trace(), &ReplayOptions::default());
        let partial = replay_trace(&sealed_trace()[..2], &ReplayOptions::default());
        assert_ne!(sealed.digest, partial.digest);
    }

    #[test]
    fn test_empty_trace() {
        let result = replay_trace(&[], &ReplayOptions::default());
        assert_eq!(result.final_state.stage, RitualStage::Idle);
        assert!(result.emitted_events.is_empty());
        assert_eq!(result.evidence_snapshot.exported_at_ts, 0);
    }

    #[test]
    fn test_threshold_overrides_apply() {
        let options = ReplayOptions {
            thresholds: ThresholdOverrides::drag(50.0),
            ..ReplayOptions::default()
        };
        let trace = vec![
            RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 0.0),
            RawInteractionEvent::pointer_move(1.0, 50.0, 0.0, 8.0),
        ];
        let result = replay_trace(&trace, &options);
        assert_eq!(result.final_state.stage, RitualStage::DragComplete);
        assert_eq!(result.thresholds.drag_threshold_px, 50.0);
    }

    #[test]
    fn test_evidence_ingestion_can_be_disabled() {
        let options = ReplayOptions {
            ingest_evidence: false,
            ..ReplayOptions::default()
        };
        let result = replay_trace(&sealed_trace(), &options);
        assert_eq!(result.evidence.event_count, 0);
        assert_eq!(result.emitted_events.len(), 6);
    }

    #[test]
    fn test_verify_fixture_reports_all_mismatches() {
        let fixture = ReplayFixture {
            name: "wrong".to_string(),
            ritual: None,
            thresholds: None,
            trace: sealed_trace(),
            expected_stage: RitualStage::Idle,
            expected_evidence_keys: vec![],
            expected_event_names: vec![],
        };
        let report = verify_fixture(&fixture);
        assert!(!report.passed());
        assert_eq!(report.mismatches.len(), 3);
    }

    #[test]
    fn test_verify_fixture_passes() {
        let fixture = ReplayFixture {
            name: "sealed".to_string(),
            ritual: Some("boot".to_string()),
            thresholds: None,
            trace: sealed_trace(),
            expected_stage: RitualStage::Sealed,
            expected_evidence_keys: vec![
                "evidence:system:armed".to_string(),
                "evidence:boot:drag".to_string(),
                "evidence:boot:hold".to_string(),
                "evidence:boot:sealed".to_string(),
            ],
            expected_event_names: replay_trace(&sealed_trace(), &ReplayOptions::default())
                .event_names(),
        };
        let report = verify_fixture(&fixture);
        assert!(report.passed(), "{:?}", report.mismatches);
    }

    #[test]
    fn test_load_fixture_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load_fixture(&missing), Err(FixtureError::Read { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{").unwrap();
        assert!(matches!(load_fixture(&bad), Err(FixtureError::Parse { .. })));
    }
}
