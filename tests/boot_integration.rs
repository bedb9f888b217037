//! Integration tests for the boot lifecycle
//!
//! Tests the full path: ritual/operator input → evidence → boot status → gates

use hitech_ritual::core::{
    create_initial_boot_state, reduce_boot_state, resolve_feature_gates, BootCommand,
    RitualSession,
};
use hitech_ritual::types::{
    BootAction, BootStatus, FeatureFlags, GateReason, RawInteractionEvent, RitualContext,
    RitualStage, Thresholds,
};
use pretty_assertions::assert_eq;

fn boot_session(flags: FeatureFlags) -> RitualSession {
    RitualSession::new(RitualContext::default(), Thresholds::default(), flags)
}

fn perform_ritual(session: &mut RitualSession, release_x: f64) {
    for raw in [
        RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 0.0),
        RawInteractionEvent::pointer_move(1.0, 121.0, 0.0, 30.0),
        RawInteractionEvent::hold_tick(350.0, 380.0),
        RawInteractionEvent::hold_tick(350.0, 730.0),
        RawInteractionEvent::pointer_up(1.0, release_x, 0.0, 800.0),
    ] {
        session.feed(&raw);
    }
}

/// The physical ritual alone arms the deck
#[test]
fn test_ritual_arms_without_operator() {
    let mut session = boot_session(FeatureFlags::default());
    perform_ritual(&mut session, 121.0);

    let status = session.status();
    assert_eq!(status.snapshot.stage, RitualStage::Sealed);
    assert_eq!(status.boot.status, BootStatus::ArmedConfirmed);
    assert_eq!(status.boot.armed_at_ts, Some(800));
    assert!(status.ready);
    assert!(!status.gates.tour.locked);
    assert!(!status.gates.autostart.ready);
    assert_eq!(status.gates.autostart.reason, Some(GateReason::G003_AUTOSTART_FORBIDDEN));
}

/// A broken release leaves the deck locked
#[test]
fn test_broken_release_keeps_deck_locked() {
    let mut session = boot_session(FeatureFlags::default());
    perform_ritual(&mut session, 400.0);

    let status = session.status();
    assert_eq!(status.snapshot.stage, RitualStage::Idle);
    assert_eq!(status.boot.status, BootStatus::Idle);
    assert!(!status.ready);
    assert!(status.gates.opening_cinema.locked);
}

/// Revoking the primary evidence drops an armed deck back to idle
#[test]
fn test_evidence_revocation_drops_boot() {
    let armed = reduce_boot_state(
        &reduce_boot_state(&create_initial_boot_state(), &BootAction::RequestArm { ts: 1 }),
        &BootAction::ConfirmArm { ts: 2 },
    );
    let synced = reduce_boot_state(&armed, &BootAction::SyncWithEvidence { satisfied_at_ts: None });
    assert_eq!(synced.status, BootStatus::Idle);

    let gates = resolve_feature_gates(&synced, &FeatureFlags::default());
    assert_eq!(gates.tour.reason, Some(GateReason::G002_BOOT_NOT_ARMED));
}

/// Operator override unlocks gates without satisfying the blocker
#[test]
fn test_operator_assist_does_not_satisfy_blocker() {
    let mut session = boot_session(FeatureFlags::default());
    session.dispatch_boot(BootCommand::OverrideEnable, 50);

    let status = session.status();
    assert_eq!(status.boot.status, BootStatus::OperatorAssisted);
    assert!(!status.gates.tour.locked);
    assert!(status.gates.tour.operator_assisted);
    assert!(!status.ready);
    assert_eq!(status.missing_blockers, vec![hitech_ritual::PRIMARY_EVIDENCE_KEY.to_string()]);

    // Completing the ritual upgrades the assist to full arming
    perform_ritual(&mut session, 121.0);
    let status = session.status();
    assert_eq!(status.boot.status, BootStatus::ArmedConfirmed);
    assert!(!status.boot.override_enabled);
    assert!(!status.gates.tour.operator_assisted);
}

/// Flag off locks everything regardless of arming
#[test]
fn test_flag_off_locks_all_gates() {
    let mut session = boot_session(FeatureFlags { wow_demo: false });
    perform_ritual(&mut session, 121.0);

    let status = session.status();
    assert_eq!(status.boot.status, BootStatus::ArmedConfirmed);
    for (name, gate) in status.gates.entries() {
        assert!(gate.locked, "{} should be locked", name);
        assert_eq!(gate.reason, Some(GateReason::G001_WOW_DEMO_DISABLED));
    }
}

/// Ignored commands are visible but leave evidence alone
#[test]
fn test_ignored_commands_are_marked() {
    let mut session = boot_session(FeatureFlags::default());
    session.dispatch_boot(BootCommand::RequestArm, 10);
    session.dispatch_boot(BootCommand::RequestArm, 11);

    assert_eq!(
        session.boot().last_action.as_deref(),
        Some("boot:arm:requested:ignored")
    );
    assert_eq!(session.evidence().event_count, 1);
    assert_eq!(session.boot().pending_at_ts, Some(10));
}

/// Boot reset wipes the ritual and the ledger
#[test]
fn test_boot_reset_restarts_everything() {
    let mut session = boot_session(FeatureFlags::default());
    perform_ritual(&mut session, 121.0);
    session.dispatch_boot(BootCommand::Reset, 1_000);

    let status = session.status();
    assert_eq!(status.snapshot.stage, RitualStage::Idle);
    assert_eq!(status.boot.status, BootStatus::Idle);
    assert_eq!(status.evidence_count, 0);

    // The ritual can be performed again after reset
    perform_ritual(&mut session, 121.0);
    assert_eq!(session.status().boot.status, BootStatus::ArmedConfirmed);
}
