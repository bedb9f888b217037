//! Core modules for the ritual pipeline

pub mod thresholds;
pub mod normalizer;
pub mod ritual;
pub mod registry;
pub mod ledger;
pub mod snapshot;
pub mod replay;
pub mod boot;
pub mod session;
pub mod config;
pub mod api;

pub use thresholds::resolve_thresholds;
pub use normalizer::{normalize_event, normalize_events};
pub use ritual::{create_initial_state, transition_state, derive_snapshot, RitualMachine};
pub use registry::{EvidenceRegistry, ActionRule, RegistryError, RESET_ACTION};
pub use ledger::{
    EvidenceLedger, create_initial_evidence_state, reduce_evidence_state,
    transitions_for_action, select_evidence_ready, select_missing_blocker_keys,
};
pub use snapshot::{
    serialize_snapshot, parse_snapshot, parse_snapshot_str, restore_snapshot,
    save_snapshot, load_snapshot, SnapshotError,
};
pub use replay::{replay_trace, replay_digest, verify_fixture, load_fixture, FixtureError};
pub use boot::{create_initial_boot_state, reduce_boot_state, resolve_feature_gates};
pub use session::{RitualSession, BootCommand, SessionStep, SessionStatus};
pub use config::{AppConfig, ServerConfig, ConfigError, load_config};
pub use api::{create_router, run_server};
