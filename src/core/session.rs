//! Live ritual session: normalizer → machine → ledger → boot lifecycle
//!
//! One session owns one ritual machine, its evidence store and boot state.
//! Every input runs the whole pipeline synchronously, so a status read
//! after `feed` or `dispatch_boot` always reflects that input.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::PRIMARY_EVIDENCE_KEY;
use crate::core::boot::{create_initial_boot_state, reduce_boot_state, resolve_feature_gates};
use crate::core::ledger::EvidenceLedger;
use crate::core::normalizer::normalize_event;
use crate::core::registry::RESET_ACTION;
use crate::core::ritual::RitualMachine;
use crate::core::snapshot::{restore_snapshot, serialize_snapshot};
use crate::types::{
    Actor, BootAction, BootState, DomainEvent, EvidenceAction, EvidenceSnapshot, EvidenceState,
    FeatureFlags, GateMap, IngestionEvent, InteractionEvent, RawInteractionEvent, RitualContext,
    RitualSnapshot, RitualStage, Thresholds,
};

/// Operator-issued lifecycle command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BootCommand {
    RequestArm,
    ConfirmArm,
    OverrideEnable,
    OverrideDisable,
    Reset,
}

impl BootCommand {
    pub fn to_action(self, ts: u64) -> BootAction {
        match self {
            BootCommand::RequestArm => BootAction::RequestArm { ts },
            BootCommand::ConfirmArm => BootAction::ConfirmArm { ts },
            BootCommand::OverrideEnable => BootAction::OverrideEnable { ts },
            BootCommand::OverrideDisable => BootAction::OverrideDisable { ts },
            BootCommand::Reset => BootAction::Reset { ts },
        }
    }

    /// Evidence action recorded when the command takes effect
    pub fn evidence_action(self) -> &'static str {
        match self {
            BootCommand::RequestArm => "boot:arm:requested",
            BootCommand::ConfirmArm => "boot:arm:confirmed",
            BootCommand::OverrideEnable => "boot:override:enabled",
            BootCommand::OverrideDisable => "boot:override:disabled",
            BootCommand::Reset => RESET_ACTION,
        }
    }

    /// Parse a command name, case-insensitive, `-` or `_` separated
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "request_arm" | "arm" => Some(BootCommand::RequestArm),
            "confirm_arm" | "confirm" => Some(BootCommand::ConfirmArm),
            "override_enable" => Some(BootCommand::OverrideEnable),
            "override_disable" => Some(BootCommand::OverrideDisable),
            "reset" => Some(BootCommand::Reset),
            _ => None,
        }
    }
}

/// Result of feeding one raw event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStep {
    pub event: InteractionEvent,
    pub events: Vec<DomainEvent>,
    pub stage: RitualStage,
}

/// Everything a caller renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub ritual: String,
    pub snapshot: RitualSnapshot,
    pub boot: BootState,
    pub gates: GateMap,
    pub missing_blockers: Vec<String>,
    pub ready: bool,
    pub evidence_count: u64,
}

#[derive(Debug, Clone)]
pub struct RitualSession {
    machine: RitualMachine,
    ledger: EvidenceLedger<'static>,
    evidence: EvidenceState,
    boot: BootState,
    flags: FeatureFlags,
    ingest_seq: u64,
}

impl RitualSession {
    pub fn new(context: RitualContext, thresholds: Thresholds, flags: FeatureFlags) -> Self {
        let ledger = EvidenceLedger::default();
        Self {
            machine: RitualMachine::new(thresholds, context),
            evidence: ledger.initial_state(),
            ledger,
            boot: create_initial_boot_state(),
            flags,
            ingest_seq: 0,
        }
    }

    /// Run one raw event through the pipeline
    pub fn feed(&mut self, raw: &RawInteractionEvent) -> SessionStep {
        let event = normalize_event(raw);
        let events = self.machine.apply(&event);

        for domain_event in &events {
            self.ingest(&domain_event.name, domain_event.timestamp_ms, Actor::System);
        }
        self.sync_boot();

        SessionStep {
            event,
            events,
            stage: self.machine.stage(),
        }
    }

    /// Apply an operator lifecycle command at `ts`
    pub fn dispatch_boot(&mut self, command: BootCommand, ts: u64) -> &BootState {
        let next = reduce_boot_state(&self.boot, &command.to_action(ts));
        let ignored = next
            .last_action
            .as_deref()
            .is_some_and(|marker| marker.ends_with(":ignored"));
        self.boot = next;

        if ignored {
            debug!(?command, "boot command ignored");
            return &self.boot;
        }

        self.ingest(command.evidence_action(), ts, Actor::Operator);
        if command == BootCommand::Reset {
            self.machine.reset();
        }
        self.sync_boot();
        info!(?command, status = %self.boot.status, "boot command applied");
        &self.boot
    }

    /// Fresh ritual, evidence and boot state; configuration kept
    pub fn reset(&mut self) {
        self.machine.reset();
        self.evidence = self.ledger.initial_state();
        self.boot = create_initial_boot_state();
    }

    pub fn status(&self) -> SessionStatus {
        let missing_blockers = self.ledger.missing_blockers(&self.evidence);
        SessionStatus {
            ritual: self.machine.context().ritual.clone(),
            snapshot: self.machine.snapshot(),
            boot: self.boot.clone(),
            gates: resolve_feature_gates(&self.boot, &self.flags),
            ready: missing_blockers.is_empty(),
            missing_blockers,
            evidence_count: self.evidence.event_count,
        }
    }

    pub fn machine(&self) -> &RitualMachine {
        &self.machine
    }

    pub fn evidence(&self) -> &EvidenceState {
        &self.evidence
    }

    pub fn boot(&self) -> &BootState {
        &self.boot
    }

    pub fn export_evidence(&self, exported_at_ts: u64) -> EvidenceSnapshot {
        serialize_snapshot(&self.evidence, exported_at_ts)
    }

    /// Replace the evidence store and re-derive boot status from it
    pub fn restore_evidence(&mut self, snapshot: &EvidenceSnapshot) {
        self.evidence = restore_snapshot(snapshot);
        self.ingest_seq = self.ingest_seq.max(snapshot.event_count);
        self.sync_boot();
    }

    fn ingest(&mut self, action: &str, ts: u64, actor: Actor) {
        self.ingest_seq += 1;
        let event = IngestionEvent::new(format!("evt-{:06}", self.ingest_seq), action, ts, actor);
        self.evidence = self.ledger.reduce(&self.evidence, &EvidenceAction::Ingest(event));
    }

    fn sync_boot(&mut self) {
        let satisfied_at_ts = self
            .evidence
            .entry(PRIMARY_EVIDENCE_KEY)
            .filter(|entry| entry.satisfied)
            .and_then(|entry| entry.satisfied_at_ts);
        self.boot = reduce_boot_state(&self.boot, &BootAction::SyncWithEvidence { satisfied_at_ts });
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BootStatus, GateReason};

    fn session() -> RitualSession {
        RitualSession::new(RitualContext::default(), Thresholds::default(), FeatureFlags::default())
    }

    fn seal(session: &mut RitualSession) {
        for raw in [
            RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 0.0),
            RawInteractionEvent::pointer_move(1.0, 120.0, 0.0, 16.0),
            RawInteractionEvent::hold_tick(300.0, 316.0),
            RawInteractionEvent::hold_tick(300.0, 616.0),
            RawInteractionEvent::pointer_up(1.0, 120.0, 0.0, 700.0),
        ] {
            session.feed(&raw);
        }
    }

    #[test]
    fn test_new_session_is_locked() {
        let status = session().status();
        assert_eq!(status.snapshot.stage, RitualStage::Idle);
        assert_eq!(status.boot.status, BootStatus::Idle);
        assert!(!status.ready);
        assert_eq!(status.missing_blockers, vec![PRIMARY_EVIDENCE_KEY.to_string()]);
        assert_eq!(status.gates.tour.reason, Some(GateReason::G002_BOOT_NOT_ARMED));
    }

    #[test]
    fn test_sealing_boot_ritual_arms_deck() {
        let mut s = session();
        seal(&mut s);
        let status = s.status();
        assert_eq!(status.snapshot.stage, RitualStage::Sealed);
        assert!(status.ready);
        assert_eq!(status.boot.status, BootStatus::ArmedConfirmed);
        assert_eq!(status.boot.armed_at_ts, Some(700));
        assert!(!status.gates.tour.locked);
        assert_eq!(status.evidence_count, 6);
    }

    #[test]
    fn test_feed_returns_emitted_events() {
        let mut s = session();
        s.feed(&RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 0.0));
        let step = s.feed(&RawInteractionEvent::pointer_move(1.0, 130.0, 0.0, 16.0));
        assert_eq!(step.stage, RitualStage::DragComplete);
        assert_eq!(step.events.len(), 2);
        assert!(s.evidence().is_satisfied("evidence:boot:drag"));
    }

    #[test]
    fn test_operator_arm_flow() {
        let mut s = session();
        s.dispatch_boot(BootCommand::RequestArm, 10);
        let boot = s.dispatch_boot(BootCommand::ConfirmArm, 20).clone();
        assert_eq!(boot.status, BootStatus::ArmedConfirmed);
        assert_eq!(boot.armed_at_ts, Some(20));
        assert!(s.status().ready);
        assert_eq!(s.evidence().event_log[0].actor, Actor::Operator);
    }

    #[test]
    fn test_ignored_command_records_no_evidence() {
        let mut s = session();
        let boot = s.dispatch_boot(BootCommand::ConfirmArm, 5).clone();
        assert_eq!(boot.last_action.as_deref(), Some("boot:arm:confirmed:ignored"));
        assert_eq!(s.evidence().event_count, 0);
    }

    #[test]
    fn test_override_is_separate_tier() {
        let mut s = session();
        s.dispatch_boot(BootCommand::OverrideEnable, 3);
        let status = s.status();
        assert_eq!(status.boot.status, BootStatus::OperatorAssisted);
        assert!(status.gates.demo_script.operator_assisted);
        assert!(!status.ready);
    }

    #[test]
    fn test_reset_command_clears_everything() {
        let mut s = session();
        seal(&mut s);
        s.dispatch_boot(BootCommand::Reset, 900);
        let status = s.status();
        assert_eq!(status.snapshot.stage, RitualStage::Idle);
        assert_eq!(status.boot.status, BootStatus::Idle);
        assert_eq!(status.evidence_count, 0);
        assert!(!status.ready);
    }

    #[test]
    fn test_restore_evidence_resyncs_boot() {
        let mut armed = session();
        seal(&mut armed);
        let snapshot = armed.export_evidence(1_000);

        let mut fresh = session();
        fresh.restore_evidence(&snapshot);
        assert_eq!(fresh.boot().status, BootStatus::ArmedConfirmed);
        assert_eq!(fresh.evidence(), armed.evidence());

        fresh.dispatch_boot(BootCommand::OverrideEnable, 1_100);
        assert_eq!(fresh.evidence().event_count, armed.evidence().event_count);
    }

    #[test]
    fn test_parse_command_names() {
        assert_eq!(BootCommand::parse("REQUEST_ARM"), Some(BootCommand::RequestArm));
        assert_eq!(BootCommand::parse("override-enable"), Some(BootCommand::OverrideEnable));
        assert_eq!(BootCommand::parse("confirm"), Some(BootCommand::ConfirmArm));
        assert_eq!(BootCommand::parse("launch"), None);
    }
}
