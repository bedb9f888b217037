//! Property tests for the ritual pipeline

use hitech_ritual::core::{
    create_initial_evidence_state, normalize_events, parse_snapshot, reduce_evidence_state,
    replay_trace, restore_snapshot, serialize_snapshot, transition_state, RitualMachine,
};
use hitech_ritual::types::{
    Actor, EvidenceAction, IngestionEvent, InteractionEvent, RawInteractionEvent, ReplayOptions,
    RitualContext, RitualStage, Thresholds,
};
use proptest::prelude::*;

fn raw_event() -> impl Strategy<Value = RawInteractionEvent> {
    let coord = -400.0..400.0f64;
    let ts = -50.0..5_000.0f64;
    let pointer = 1.0..3.0f64;
    prop_oneof![
        (pointer.clone(), coord.clone(), coord.clone(), ts.clone())
            .prop_map(|(p, x, y, t)| RawInteractionEvent::pointer_down(p, x, y, t)),
        (pointer.clone(), coord.clone(), coord.clone(), ts.clone())
            .prop_map(|(p, x, y, t)| RawInteractionEvent::pointer_move(p, x, y, t)),
        (pointer.clone(), coord.clone(), coord.clone(), ts.clone())
            .prop_map(|(p, x, y, t)| RawInteractionEvent::pointer_up(p, x, y, t)),
        (pointer, coord.clone(), coord, ts.clone())
            .prop_map(|(p, x, y, t)| RawInteractionEvent::pointer_cancel(p, x, y, t)),
        (-100.0..2_000.0f64, ts.clone()).prop_map(|(d, t)| RawInteractionEvent::hold_tick(d, t)),
        ts.prop_map(RawInteractionEvent::reset),
    ]
}

/// Single pointer, no release, cancel or reset
fn unbroken_gesture_event() -> impl Strategy<Value = InteractionEvent> {
    prop_oneof![
        (-300.0..300.0f64, -300.0..300.0f64, 0u64..10_000)
            .prop_map(|(x, y, t)| InteractionEvent::pointer_move(1, x, y, t)),
        (0.0..1_000.0f64, 0u64..10_000).prop_map(|(d, t)| InteractionEvent::hold_tick(d, t)),
        (0u64..10_000).prop_map(|t| InteractionEvent::pointer_down(1, 0.0, 0.0, t)),
    ]
}

fn evidence_action_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "boot:arm:requested",
        "boot:arm:confirmed",
        "boot:arm:revoked",
        "boot:override:enabled",
        "anchor:route-graph-link:engaged",
        "gesture:boot-drag:completed",
        "gesture:boot-hold:completed",
        "gesture:boot-ritual:cancelled",
        "evidence:boot-primary:satisfied",
        "unknown:action:name",
    ])
}

fn sealed_machine() -> RitualMachine {
    let mut machine = RitualMachine::new(Thresholds::default(), RitualContext::default());
    for event in [
        InteractionEvent::pointer_down(1, 0.0, 0.0, 0),
        InteractionEvent::pointer_move(1, 120.0, 0.0, 16),
        InteractionEvent::hold_tick(300.0, 316),
        InteractionEvent::hold_tick(300.0, 616),
        InteractionEvent::pointer_up(1, 120.0, 0.0, 700),
    ] {
        machine.apply(&event);
    }
    machine
}

proptest! {
    #[test]
    fn prop_normalized_trace_is_ordered(raw in prop::collection::vec(raw_event(), 0..40)) {
        let normalized = normalize_events(&raw);
        prop_assert_eq!(normalized.len(), raw.len());
        for pair in normalized.windows(2) {
            let a = (pair[0].timestamp_ms(), pair[0].type_priority());
            let b = (pair[1].timestamp_ms(), pair[1].type_priority());
            prop_assert!(a <= b);
        }
    }

    #[test]
    fn prop_reapplying_an_event_is_a_noop(
        prefix in prop::collection::vec(raw_event(), 0..20),
        event in raw_event(),
    ) {
        let thresholds = Thresholds::default();
        let context = RitualContext::default();
        let mut machine = RitualMachine::new(thresholds, context.clone());
        for e in normalize_events(&prefix) {
            machine.apply(&e);
        }

        let event = normalize_events(&[event])[0];
        let first = transition_state(machine.state(), &event, &thresholds, &context);
        let second = transition_state(&first.state, &event, &thresholds, &context);
        prop_assert_eq!(&second.state, &first.state);
        prop_assert!(second.events.is_empty());
    }

    #[test]
    fn prop_progress_is_monotonic_within_a_gesture(
        events in prop::collection::vec(unbroken_gesture_event(), 0..40),
    ) {
        let mut machine = RitualMachine::new(Thresholds::default(), RitualContext::default());
        machine.apply(&InteractionEvent::pointer_down(1, 0.0, 0.0, 0));

        let mut drag = machine.state().drag_progress;
        let mut hold = machine.state().hold_progress;
        for event in &events {
            machine.apply(event);
            let state = machine.state();
            prop_assert!(state.drag_progress >= drag);
            prop_assert!(state.hold_progress >= hold);
            prop_assert!((0.0..=1.0).contains(&state.drag_progress));
            prop_assert!((0.0..=1.0).contains(&state.hold_progress));
            drag = state.drag_progress;
            hold = state.hold_progress;
        }
    }

    #[test]
    fn prop_sealed_is_terminal(events in prop::collection::vec(raw_event(), 0..30)) {
        let mut machine = sealed_machine();
        for event in normalize_events(&events) {
            if matches!(event, InteractionEvent::Reset(_)) {
                continue;
            }
            prop_assert!(machine.apply(&event).is_empty());
            prop_assert_eq!(machine.stage(), RitualStage::Sealed);
        }
    }

    #[test]
    fn prop_replay_is_deterministic(raw in prop::collection::vec(raw_event(), 0..30)) {
        let options = ReplayOptions::default();
        let first = replay_trace(&raw, &options);
        let bytes = serde_json::to_vec(&first).unwrap();
        for _ in 0..2 {
            let again = replay_trace(&raw, &options);
            prop_assert_eq!(&serde_json::to_vec(&again).unwrap(), &bytes);
        }
    }

    #[test]
    fn prop_snapshot_restore_round_trips(
        actions in prop::collection::vec((evidence_action_name(), 0u64..100_000), 0..25),
        exported_at in 0u64..1_000_000,
    ) {
        let mut state = create_initial_evidence_state();
        for (i, (action, ts)) in actions.iter().enumerate() {
            let event = IngestionEvent::new(format!("evt-{i}"), *action, *ts, Actor::System);
            state = reduce_evidence_state(&state, &EvidenceAction::Ingest(event));
        }

        let snapshot = serialize_snapshot(&state, exported_at);
        prop_assert_eq!(restore_snapshot(&snapshot), state.clone());

        let value = serde_json::to_value(&snapshot).unwrap();
        let parsed = parse_snapshot(&value);
        prop_assert!(parsed.is_some());
        prop_assert_eq!(restore_snapshot(&parsed.unwrap()), state);
    }
}
