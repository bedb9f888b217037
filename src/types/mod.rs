//! Core types for the ritual pipeline

mod thresholds;
mod event;
mod stage;
mod reason;
mod ritual;
mod output;
mod evidence;
mod boot;
mod replay;

pub use thresholds::{Thresholds, ThresholdOverrides};
pub use event::{
    InteractionEvent, PointerSample, HoldTick, ResetMarker,
    RawInteractionEvent, RawPointer, RawTick, RawReset,
};
pub use stage::RitualStage;
pub use reason::{CancelReason, GateReason};
pub use ritual::{RitualState, RitualContext, DomainEvent, RitualTransition};
pub use output::RitualSnapshot;
pub use evidence::{
    EvidenceLevel, EvidenceDefinition, TransitionKind, EvidenceTransition, Actor,
    IngestionEvent, HistoryRecord, EvidenceEntry, EvidenceState, EvidenceAction,
    EvidenceSnapshot,
};
pub use boot::{BootStatus, BootState, BootAction, FeatureFlags, FeatureGate, GateMap};
pub use replay::{ReplayOptions, ReplayResult, ReplayFixture, FixtureMismatch, FixtureReport};
