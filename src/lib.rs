//! Hitech ritual core: gesture state machine, evidence ledger and replay
//!
//! Pipeline: raw pointer/timer events → normalizer → ritual machine →
//! domain events → evidence ledger → boot lifecycle → feature gates.

pub mod core;
pub mod types;

// =============================================================================
// THRESHOLD DEFAULTS
// =============================================================================

/// Distance the pointer must travel before the drag stage completes (px)
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 120.0;

/// Travel beyond this distance no longer counts toward drag progress (px)
pub const DEFAULT_MAX_DRAG_TRAVEL_PX: f64 = 360.0;

/// Accumulated hold time needed to complete the hold stage (ms)
pub const DEFAULT_HOLD_THRESHOLD_MS: f64 = 600.0;

/// Largest contribution a single hold tick may make (ms)
/// Bounds spikes from a backgrounded tab delivering one huge delta
pub const DEFAULT_HOLD_TICK_CEILING_MS: f64 = 400.0;

/// Release must land within this distance of the held position (px)
pub const DEFAULT_RELEASE_SNAP_PX: f64 = 24.0;

// =============================================================================
// EVIDENCE
// =============================================================================

/// Schema tag carried by every exported evidence snapshot
pub const EVIDENCE_SNAPSHOT_SCHEMA: &str = "hitech.evidence.snapshot.v1";

/// Version of the built-in evidence registry
pub const REGISTRY_VERSION: u32 = 1;

/// The blocker every session starts without
pub const PRIMARY_EVIDENCE_KEY: &str = "evidence:system:armed";

/// Ritual name used when the caller does not name one
pub const DEFAULT_RITUAL: &str = "boot";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
