//! Evidence snapshot export, parsing and restore
//!
//! Key invariant: restore(serialize(state)) == state, field for field,
//! history order included.

use std::path::{Path, PathBuf};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use crate::EVIDENCE_SNAPSHOT_SCHEMA;
use crate::types::{EvidenceSnapshot, EvidenceState};

/// Storage failures around snapshot files
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("snapshot payload rejected by structural guard: {0}")]
    Rejected(String),
}

/// Export a store as a schema-tagged snapshot
pub fn serialize_snapshot(state: &EvidenceState, exported_at_ts: u64) -> EvidenceSnapshot {
    EvidenceSnapshot {
        schema: EVIDENCE_SNAPSHOT_SCHEMA.to_string(),
        exported_at_ts,
        registry_version: state.registry_version,
        entries: state.entries.clone(),
        event_log: state.event_log.clone(),
        event_count: state.event_count,
        last_interacted_anchor: state.last_interacted_anchor.clone(),
    }
}

/// Structural guard over an untrusted payload; `None` on any mismatch
///
/// Checks the schema tag, that `entries` is an object, `eventLog` an array
/// and `eventCount` an unsigned integer, then decodes the rest.
pub fn parse_snapshot(raw: &Value) -> Option<EvidenceSnapshot> {
    let object = raw.as_object()?;

    let reject = |why: &str| {
        warn!(reason = why, "evidence snapshot rejected");
        None
    };

    if object.get("schema").and_then(Value::as_str) != Some(EVIDENCE_SNAPSHOT_SCHEMA) {
        return reject("schema tag mismatch");
    }
    if !object.get("entries").is_some_and(Value::is_object) {
        return reject("entries is not an object");
    }
    if !object.get("eventLog").is_some_and(Value::is_array) {
        return reject("eventLog is not an array");
    }
    if object.get("eventCount").and_then(Value::as_u64).is_none() {
        return reject("eventCount is not an unsigned integer");
    }

    match serde_json::from_value(raw.clone()) {
        Ok(snapshot) => Some(snapshot),
        Err(_) => reject("payload does not decode"),
    }
}

/// Parse snapshot JSON text
pub fn parse_snapshot_str(json: &str) -> Option<EvidenceSnapshot> {
    let raw: Value = serde_json::from_str(json).ok()?;
    parse_snapshot(&raw)
}

/// Rebuild the store a snapshot was exported from
pub fn restore_snapshot(snapshot: &EvidenceSnapshot) -> EvidenceState {
    EvidenceState {
        registry_version: snapshot.registry_version,
        entries: snapshot.entries.clone(),
        event_log: snapshot.event_log.clone(),
        event_count: snapshot.event_count,
        last_event: snapshot.event_log.last().cloned(),
        last_interacted_anchor: snapshot.last_interacted_anchor.clone(),
    }
}

/// Save snapshot to a JSON file, returning its path
pub fn save_snapshot(snapshot: &EvidenceSnapshot, dir: &Path) -> Result<PathBuf, SnapshotError> {
    let path = dir.join(format!("evidence_{}.json", snapshot.exported_at_ts));
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Load snapshot from a JSON file, applying the structural guard
pub fn load_snapshot(path: &Path) -> Result<EvidenceSnapshot, SnapshotError> {
    let json = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&json)?;
    parse_snapshot(&raw).ok_or_else(|| SnapshotError::Rejected(path.display().to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
