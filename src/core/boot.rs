//! Boot/arm lifecycle and feature gates
//!
//! Status transitions:
//! - IDLE → ARMED_PENDING_CONFIRM: REQUEST_ARM
//! - ARMED_PENDING_CONFIRM/OPERATOR_ASSISTED → ARMED_CONFIRMED: CONFIRM_ARM
//! - IDLE/ARMED_PENDING_CONFIRM → OPERATOR_ASSISTED: OVERRIDE_ENABLE
//! - OPERATOR_ASSISTED → ARMED_PENDING_CONFIRM/IDLE: OVERRIDE_DISABLE
//! - ARMED_CONFIRMED → IDLE: SYNC_WITH_EVIDENCE, primary blocker unsatisfied
//! - any → ARMED_CONFIRMED: SYNC_WITH_EVIDENCE, primary blocker satisfied
//! - any → IDLE: RESET
//!
//! An action that is not valid from the current status changes nothing but
//! `lastAction`, which gets the `:ignored` suffix.

use tracing::debug;
use crate::types::{
    BootAction, BootState, BootStatus, FeatureFlags, FeatureGate, GateMap, GateReason,
};

const ARM_REQUESTED: &str = "boot:arm:requested";
const ARM_CONFIRMED: &str = "boot:arm:confirmed";
const OVERRIDE_ENABLED: &str = "boot:override:enabled";
const OVERRIDE_DISABLED: &str = "boot:override:disabled";
const EVIDENCE_SYNCED: &str = "boot:evidence:synced";
const LOCAL_RESET: &str = "boot:local:reset";

pub fn create_initial_boot_state() -> BootState {
    BootState {
        status: BootStatus::Idle,
        override_enabled: false,
        pending_at_ts: None,
        armed_at_ts: None,
        last_action: None,
    }
}

/// Apply one lifecycle action
pub fn reduce_boot_state(state: &BootState, action: &BootAction) -> BootState {
    use BootStatus::*;

    let next = match *action {
        BootAction::RequestArm { ts } => match state.status {
            Idle => BootState {
                status: ArmedPendingConfirm,
                pending_at_ts: Some(ts),
                last_action: Some(ARM_REQUESTED.to_string()),
                ..state.clone()
            },
            _ => ignored(state, ARM_REQUESTED),
        },

        BootAction::ConfirmArm { ts } => match state.status {
            ArmedPendingConfirm | OperatorAssisted => armed(ts, ARM_CONFIRMED),
            _ => ignored(state, ARM_CONFIRMED),
        },

        BootAction::OverrideEnable { .. } => match state.status {
            Idle | ArmedPendingConfirm => BootState {
                status: OperatorAssisted,
                override_enabled: true,
                last_action: Some(OVERRIDE_ENABLED.to_string()),
                ..state.clone()
            },
            _ => ignored(state, OVERRIDE_ENABLED),
        },

        BootAction::OverrideDisable { .. } => match state.status {
            OperatorAssisted => BootState {
                status: if state.pending_at_ts.is_some() { ArmedPendingConfirm } else { Idle },
                override_enabled: false,
                last_action: Some(OVERRIDE_DISABLED.to_string()),
                ..state.clone()
            },
            _ => ignored(state, OVERRIDE_DISABLED),
        },

        BootAction::SyncWithEvidence { satisfied_at_ts } => sync(state, satisfied_at_ts),

        BootAction::Reset { .. } => BootState {
            last_action: Some(LOCAL_RESET.to_string()),
            ..create_initial_boot_state()
        },
    };

    if next.status != state.status {
        debug!(from = %state.status, to = %next.status, "boot status changed");
    }
    next
}

fn armed(ts: u64, marker: &str) -> BootState {
    BootState {
        status: BootStatus::ArmedConfirmed,
        override_enabled: false,
        pending_at_ts: None,
        armed_at_ts: Some(ts),
        last_action: Some(marker.to_string()),
    }
}

fn ignored(state: &BootState, marker: &str) -> BootState {
    BootState {
        last_action: Some(format!("{marker}:ignored")),
        ..state.clone()
    }
}

/// Follow the primary blocker; a sync that changes nothing leaves the state as is
fn sync(state: &BootState, satisfied_at_ts: Option<u64>) -> BootState {
    match satisfied_at_ts {
        Some(ts) => {
            let settled = state.status == BootStatus::ArmedConfirmed
                && state.armed_at_ts == Some(ts)
                && !state.override_enabled;
            if settled {
                state.clone()
            } else {
                armed(ts, EVIDENCE_SYNCED)
            }
        }
        None if state.status == BootStatus::ArmedConfirmed => BootState {
            last_action: Some(EVIDENCE_SYNCED.to_string()),
            ..create_initial_boot_state()
        },
        None => state.clone(),
    }
}

/// Derive every feature gate from boot status and flags
pub fn resolve_feature_gates(state: &BootState, flags: &FeatureFlags) -> GateMap {
    let base = base_gate(state, flags);
    let autostart = if base.locked {
        base
    } else {
        FeatureGate {
            ready: false,
            reason: Some(GateReason::G003_AUTOSTART_FORBIDDEN),
            ..base
        }
    };

    GateMap {
        tour: base,
        demo_script: base,
        opening_cinema: base,
        autostart,
    }
}

fn base_gate(state: &BootState, flags: &FeatureFlags) -> FeatureGate {
    if !flags.wow_demo {
        return locked(GateReason::G001_WOW_DEMO_DISABLED);
    }
    match state.status {
        BootStatus::ArmedConfirmed => FeatureGate {
            locked: false,
            ready: true,
            operator_assisted: false,
            reason: None,
        },
        BootStatus::OperatorAssisted => FeatureGate {
            locked: false,
            ready: true,
            operator_assisted: true,
            reason: None,
        },
        BootStatus::Idle | BootStatus::ArmedPendingConfirm => {
            locked(GateReason::G002_BOOT_NOT_ARMED)
        }
    }
}

fn locked(reason: GateReason) -> FeatureGate {
    FeatureGate {
        locked: true,
        ready: false,
        operator_assisted: false,
        reason: Some(reason),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(actions: &[BootAction]) -> BootState {
        actions
            .iter()
            .fold(create_initial_boot_state(), |s, a| reduce_boot_state(&s, a))
    }

    #[test]
    fn test_request_then_confirm() {
        let pending = run(&[BootAction::RequestArm { ts: 10 }]);
        assert_eq!(pending.status, BootStatus::ArmedPendingConfirm);
        assert_eq!(pending.pending_at_ts, Some(10));

        let armed = reduce_boot_state(&pending, &BootAction::ConfirmArm { ts: 20 });
        assert_eq!(armed.status, BootStatus::ArmedConfirmed);
        assert_eq!(armed.armed_at_ts, Some(20));
        assert_eq!(armed.last_action.as_deref(), Some("boot:arm:confirmed"));
    }

    #[test]
    fn test_confirm_without_request_is_ignored() {
        let state = run(&[BootAction::ConfirmArm { ts: 5 }]);
        assert_eq!(state.status, BootStatus::Idle);
        assert_eq!(state.armed_at_ts, None);
        assert_eq!(state.last_action.as_deref(), Some("boot:arm:confirmed:ignored"));
    }

    #[test]
    fn test_request_only_from_idle() {
        let state = run(&[
            BootAction::RequestArm { ts: 1 },
            BootAction::RequestArm { ts: 2 },
        ]);
        assert_eq!(state.pending_at_ts, Some(1));
        assert_eq!(state.last_action.as_deref(), Some("boot:arm:requested:ignored"));
    }

    #[test]
    fn test_override_path_then_confirm_clears_override() {
        let assisted = run(&[BootAction::OverrideEnable { ts: 3 }]);
        assert_eq!(assisted.status, BootStatus::OperatorAssisted);
        assert!(assisted.override_enabled);

        let armed = reduce_boot_state(&assisted, &BootAction::ConfirmArm { ts: 9 });
        assert_eq!(armed.status, BootStatus::ArmedConfirmed);
        assert!(!armed.override_enabled);
    }

    #[test]
    fn test_override_disable_returns_to_pending() {
        let state = run(&[
            BootAction::RequestArm { ts: 1 },
            BootAction::OverrideEnable { ts: 2 },
            BootAction::OverrideDisable { ts: 3 },
        ]);
        assert_eq!(state.status, BootStatus::ArmedPendingConfirm);
        assert_eq!(state.pending_at_ts, Some(1));
        assert!(!state.override_enabled);

        let state = run(&[
            BootAction::OverrideEnable { ts: 2 },
            BootAction::OverrideDisable { ts: 3 },
        ]);
        assert_eq!(state.status, BootStatus::Idle);
    }

    #[test]
    fn test_override_disable_when_not_assisted_is_ignored() {
        let state = run(&[BootAction::OverrideDisable { ts: 1 }]);
        assert_eq!(state.status, BootStatus::Idle);
        assert_eq!(state.last_action.as_deref(), Some("boot:override:disabled:ignored"));
    }

    #[test]
    fn test_sync_unsatisfied_drops_armed_to_idle() {
        let armed = run(&[BootAction::RequestArm { ts: 1 }, BootAction::ConfirmArm { ts: 2 }]);
        let state = reduce_boot_state(&armed, &BootAction::SyncWithEvidence { satisfied_at_ts: None });
        assert_eq!(state.status, BootStatus::Idle);
        assert_eq!(state.armed_at_ts, None);
        assert_eq!(state.last_action.as_deref(), Some("boot:evidence:synced"));
    }

    #[test]
    fn test_sync_unsatisfied_leaves_pending_and_assisted() {
        let pending = run(&[BootAction::RequestArm { ts: 1 }]);
        let synced = reduce_boot_state(&pending, &BootAction::SyncWithEvidence { satisfied_at_ts: None });
        assert_eq!(synced, pending);

        let assisted = run(&[BootAction::OverrideEnable { ts: 1 }]);
        let synced = reduce_boot_state(&assisted, &BootAction::SyncWithEvidence { satisfied_at_ts: None });
        assert_eq!(synced, assisted);
    }

    #[test]
    fn test_sync_satisfied_raises_to_armed() {
        let assisted = run(&[BootAction::OverrideEnable { ts: 1 }]);
        let state = reduce_boot_state(&assisted, &BootAction::SyncWithEvidence { satisfied_at_ts: Some(44) });
        assert_eq!(state.status, BootStatus::ArmedConfirmed);
        assert_eq!(state.armed_at_ts, Some(44));
        assert!(!state.override_enabled);

        let again = reduce_boot_state(&state, &BootAction::SyncWithEvidence { satisfied_at_ts: Some(44) });
        assert_eq!(again, state);
    }

    #[test]
    fn test_reset_is_unconditional() {
        let state = run(&[
            BootAction::RequestArm { ts: 1 },
            BootAction::ConfirmArm { ts: 2 },
            BootAction::Reset { ts: 3 },
        ]);
        assert_eq!(state.status, BootStatus::Idle);
        assert_eq!(state.pending_at_ts, None);
        assert_eq!(state.last_action.as_deref(), Some("boot:local:reset"));
    }

    #[test]
    fn test_gates_locked_when_idle() {
        let gates = resolve_feature_gates(&create_initial_boot_state(), &FeatureFlags::default());
        assert!(gates.tour.locked);
        assert_eq!(gates.tour.reason, Some(GateReason::G002_BOOT_NOT_ARMED));
        assert_eq!(gates.autostart.reason, Some(GateReason::G002_BOOT_NOT_ARMED));
    }

    #[test]
    fn test_gates_flag_off_wins() {
        let armed = run(&[BootAction::RequestArm { ts: 1 }, BootAction::ConfirmArm { ts: 2 }]);
        let gates = resolve_feature_gates(&armed, &FeatureFlags { wow_demo: false });
        assert!(gates.demo_script.locked);
        assert_eq!(gates.demo_script.reason, Some(GateReason::G001_WOW_DEMO_DISABLED));
    }

    #[test]
    fn test_gates_armed_but_autostart_never_ready() {
        let armed = run(&[BootAction::RequestArm { ts: 1 }, BootAction::ConfirmArm { ts: 2 }]);
        let gates = resolve_feature_gates(&armed, &FeatureFlags::default());
        assert!(!gates.tour.locked && gates.tour.ready);
        assert!(!gates.opening_cinema.operator_assisted);
        assert!(!gates.autostart.ready);
        assert_eq!(gates.autostart.reason, Some(GateReason::G003_AUTOSTART_FORBIDDEN));
    }

    #[test]
    fn test_gates_operator_assisted_tier() {
        let assisted = run(&[BootAction::OverrideEnable { ts: 1 }]);
        let gates = resolve_feature_gates(&assisted, &FeatureFlags::default());
        assert!(!gates.tour.locked);
        assert!(gates.tour.operator_assisted);
        assert!(!gates.autostart.ready);
    }
}
