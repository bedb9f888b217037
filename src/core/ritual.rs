//! Ritual machine: drag → hold → release gesture state machine
//!
//! Stage transitions:
//! - idle → dragging: pointer_down
//! - dragging → drag-complete: travel from origin reaches drag threshold
//! - drag-complete/holding → hold-complete: accumulated ticks reach hold threshold
//! - hold-complete → sealed: pointer_up within release snap of the held position
//! - any in-progress stage → idle: pointer_cancel, foreign pointer, broken release
//! - any stage → idle: reset
//!
//! `transition_state` is pure. Re-applying the event that produced a state,
//! or any event that changes nothing observable, returns the state untouched
//! and emits nothing.

use serde_json::json;
use tracing::debug;
use crate::types::{
    CancelReason, DomainEvent, HoldTick, InteractionEvent, PointerSample,
    RitualContext, RitualSnapshot, RitualStage, RitualState, RitualTransition,
    Thresholds,
};

/// Progress this close to 1 counts as complete
const PROGRESS_EPSILON: f64 = 1e-9;

/// Fresh idle state
///
/// Thresholds do not shape the initial state; the parameter keeps the
/// constructor symmetrical with `derive_snapshot`.
pub fn create_initial_state(_thresholds: &Thresholds) -> RitualState {
    idle_state()
}

fn idle_state() -> RitualState {
    RitualState {
        stage: RitualStage::Idle,
        drag_progress: 0.0,
        hold_progress: 0.0,
        active_pointer_id: None,
        origin_x: 0.0,
        origin_y: 0.0,
        last_x: 0.0,
        last_y: 0.0,
        last_event: None,
    }
}

/// Apply one normalized event
pub fn transition_state(
    state: &RitualState,
    event: &InteractionEvent,
    thresholds: &Thresholds,
    context: &RitualContext,
) -> RitualTransition {
    if state.last_event.as_ref() == Some(event) {
        return unchanged(state);
    }

    let (mut next, events) = step(state, event, thresholds, context);
    if events.is_empty() && next.same_observable(state) {
        return unchanged(state);
    }

    next.last_event = Some(*event);
    debug!(
        ritual = %context.ritual,
        event = event.kind(),
        from = %state.stage,
        to = %next.stage,
        emitted = events.len(),
        "ritual transition"
    );
    RitualTransition { state: next, events }
}

fn unchanged(state: &RitualState) -> RitualTransition {
    RitualTransition {
        state: state.clone(),
        events: Vec::new(),
    }
}

fn step(
    state: &RitualState,
    event: &InteractionEvent,
    thresholds: &Thresholds,
    context: &RitualContext,
) -> (RitualState, Vec<DomainEvent>) {
    use InteractionEvent as E;
    use RitualStage as S;

    match (state.stage, event) {
        (_, E::Reset(_)) => (idle_state(), Vec::new()),

        // Terminal
        (S::Sealed, _) => (state.clone(), Vec::new()),

        (_, E::PointerCancel(p)) => {
            if state.stage.is_in_progress() {
                cancel(state, CancelReason::R101_POINTER_CANCELLED, p.timestamp_ms, context)
            } else {
                (state.clone(), Vec::new())
            }
        }

        (_, E::Entered(_)) => (state.clone(), Vec::new()),

        (S::Idle, E::PointerDown(p)) => (begin_drag(p), Vec::new()),
        (S::Idle, _) => (state.clone(), Vec::new()),

        // Past this point a gesture is in progress
        (_, E::PointerDown(p) | E::PointerMove(p) | E::PointerUp(p))
            if state.active_pointer_id != Some(p.pointer_id) =>
        {
            cancel(state, CancelReason::R101_POINTER_MISMATCH, p.timestamp_ms, context)
        }

        (_, E::PointerDown(_)) => (state.clone(), Vec::new()),

        (S::Dragging, E::PointerMove(p)) => drag_move(state, p, thresholds, context),
        // Held position stays frozen after the drag completes
        (_, E::PointerMove(_)) => (state.clone(), Vec::new()),

        (S::HoldComplete, E::PointerUp(p)) => release(state, p, thresholds, context),
        (_, E::PointerUp(p)) => {
            cancel(state, CancelReason::R102_RELEASED_EARLY, p.timestamp_ms, context)
        }

        (S::DragComplete | S::Holding, E::HoldTick(t)) => hold_tick(state, t, thresholds, context),
        (_, E::HoldTick(_)) => (state.clone(), Vec::new()),
    }
}

fn begin_drag(p: &PointerSample) -> RitualState {
    RitualState {
        stage: RitualStage::Dragging,
        active_pointer_id: Some(p.pointer_id),
        origin_x: p.x,
        origin_y: p.y,
        last_x: p.x,
        last_y: p.y,
        ..idle_state()
    }
}

fn drag_move(
    state: &RitualState,
    p: &PointerSample,
    thresholds: &Thresholds,
    context: &RitualContext,
) -> (RitualState, Vec<DomainEvent>) {
    let distance = (p.x - state.origin_x).hypot(p.y - state.origin_y);
    // Travel past the cap stops counting; tracking continues
    let travel = distance.min(thresholds.max_drag_travel_px);
    let ratio = progress_ratio(travel, thresholds.drag_threshold_px);

    let mut next = state.clone();
    next.last_x = p.x;
    next.last_y = p.y;
    next.drag_progress = state.drag_progress.max(ratio);

    if next.drag_progress < 1.0 - PROGRESS_EPSILON {
        return (next, Vec::new());
    }

    next.drag_progress = 1.0;
    next.stage = RitualStage::DragComplete;
    let events = vec![
        DomainEvent::new(context.graph_link_engaged(), p.timestamp_ms),
        DomainEvent::new(context.drag_completed(), p.timestamp_ms),
    ];
    (next, events)
}

fn hold_tick(
    state: &RitualState,
    t: &HoldTick,
    thresholds: &Thresholds,
    context: &RitualContext,
) -> (RitualState, Vec<DomainEvent>) {
    let contribution = t.delta_ms.min(thresholds.hold_tick_ceiling_ms).max(0.0);
    let increment = progress_ratio(contribution, thresholds.hold_threshold_ms);
    if increment <= 0.0 {
        return (state.clone(), Vec::new());
    }

    let mut next = state.clone();
    next.stage = RitualStage::Holding;
    next.hold_progress = (state.hold_progress + increment).min(1.0);

    if next.hold_progress < 1.0 - PROGRESS_EPSILON {
        return (next, Vec::new());
    }

    next.hold_progress = 1.0;
    next.stage = RitualStage::HoldComplete;
    (next, vec![DomainEvent::new(context.hold_completed(), t.timestamp_ms)])
}

fn release(
    state: &RitualState,
    p: &PointerSample,
    thresholds: &Thresholds,
    context: &RitualContext,
) -> (RitualState, Vec<DomainEvent>) {
    let offset = (p.x - state.last_x).hypot(p.y - state.last_y);
    if !(offset <= thresholds.release_snap_px) {
        return cancel(state, CancelReason::R102_RELEASE_OFF_ANCHOR, p.timestamp_ms, context);
    }

    let mut next = state.clone();
    next.stage = RitualStage::Sealed;
    next.active_pointer_id = None;
    let events = vec![
        DomainEvent::new(context.release_completed(), p.timestamp_ms),
        DomainEvent::new(context.sealed_set(), p.timestamp_ms),
        DomainEvent::new(context.primary_satisfied(), p.timestamp_ms),
    ];
    (next, events)
}

fn cancel(
    state: &RitualState,
    reason: CancelReason,
    timestamp_ms: u64,
    context: &RitualContext,
) -> (RitualState, Vec<DomainEvent>) {
    let marker = DomainEvent::new(context.ritual_cancelled(), timestamp_ms).with_payload(json!({
        "reason": reason.code(),
        "stage": state.stage.as_str(),
    }));
    (idle_state(), vec![marker])
}

/// value / threshold clamped to [0, 1]; a non-positive threshold is already met
fn progress_ratio(value: f64, threshold: f64) -> f64 {
    if threshold > 0.0 {
        (value / threshold).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Read-only projection for rendering
pub fn derive_snapshot(state: &RitualState, thresholds: &Thresholds) -> RitualSnapshot {
    let drag_distance_px = (state.last_x - state.origin_x).hypot(state.last_y - state.origin_y);
    let remaining = |progress: f64, threshold: f64| {
        if threshold > 0.0 {
            ((1.0 - progress) * threshold).max(0.0)
        } else {
            0.0
        }
    };

    RitualSnapshot {
        stage: state.stage,
        drag_progress: state.drag_progress,
        hold_progress: state.hold_progress,
        drag_distance_px,
        drag_remaining_px: remaining(state.drag_progress, thresholds.drag_threshold_px),
        hold_remaining_ms: remaining(state.hold_progress, thresholds.hold_threshold_ms),
        active_pointer_id: state.active_pointer_id,
        in_progress: state.stage.is_in_progress(),
        sealed: state.stage == RitualStage::Sealed,
    }
}

/// Stateful wrapper for live input: owns one ritual's state
#[derive(Debug, Clone)]
pub struct RitualMachine {
    thresholds: Thresholds,
    context: RitualContext,
    state: RitualState,
}

impl RitualMachine {
    /// Create machine in the idle stage
    pub fn new(thresholds: Thresholds, context: RitualContext) -> Self {
        Self {
            state: create_initial_state(&thresholds),
            thresholds,
            context,
        }
    }

    /// Apply one event, returning what it emitted
    pub fn apply(&mut self, event: &InteractionEvent) -> Vec<DomainEvent> {
        let RitualTransition { state, events } =
            transition_state(&self.state, event, &self.thresholds, &self.context);
        self.state = state;
        events
    }

    /// Get current state
    pub fn state(&self) -> &RitualState {
        &self.state
    }

    /// Get current stage
    pub fn stage(&self) -> RitualStage {
        self.state.stage
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn context(&self) -> &RitualContext {
        &self.context
    }

    /// Current render projection
    pub fn snapshot(&self) -> RitualSnapshot {
        derive_snapshot(&self.state, &self.thresholds)
    }

    /// Back to idle, thresholds and context kept
    pub fn reset(&mut self) {
        self.state = create_initial_state(&self.thresholds);
    }
}

// =============================================================================
// TESTS
// =============================================================================
