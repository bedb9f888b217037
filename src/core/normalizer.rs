//! Event normalizer: coerces raw fields and orders a trace
//!
//! Coercion rules (never rejects an event):
//! - non-finite or missing numbers → 0
//! - pointer ids → nearest integer, at least 1
//! - timestamps → nearest non-negative integer
//! - hold deltas → at least 0
//!
//! Ordering: stable sort by (timestamp, type priority).

use crate::types::{
    InteractionEvent, PointerSample, HoldTick, ResetMarker,
    RawInteractionEvent, RawPointer, RawTick, RawReset,
};

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn coerce_timestamp(value: Option<f64>) -> u64 {
    let v = finite_or_zero(value).round();
    if v > 0.0 {
        v as u64
    } else {
        0
    }
}

fn coerce_pointer_id(value: Option<f64>) -> u32 {
    let v = finite_or_zero(value).round();
    if v >= 1.0 {
        v as u32
    } else {
        1
    }
}

fn coerce_non_negative(value: Option<f64>) -> f64 {
    let v = finite_or_zero(value);
    if v > 0.0 {
        v
    } else {
        0.0
    }
}

fn coerce_pointer(raw: &RawPointer) -> PointerSample {
    PointerSample {
        pointer_id: coerce_pointer_id(raw.pointer_id),
        x: finite_or_zero(raw.x),
        y: finite_or_zero(raw.y),
        timestamp_ms: coerce_timestamp(raw.timestamp_ms),
    }
}

fn coerce_tick(raw: &RawTick) -> HoldTick {
    HoldTick {
        delta_ms: coerce_non_negative(raw.delta_ms),
        timestamp_ms: coerce_timestamp(raw.timestamp_ms),
    }
}

fn coerce_reset(raw: &RawReset) -> ResetMarker {
    ResetMarker {
        timestamp_ms: coerce_timestamp(raw.timestamp_ms),
    }
}

/// Coerce one raw event into its normalized form
pub fn normalize_event(raw: &RawInteractionEvent) -> InteractionEvent {
    match raw {
        RawInteractionEvent::Entered(p) => InteractionEvent::Entered(coerce_pointer(p)),
        RawInteractionEvent::PointerDown(p) => InteractionEvent::PointerDown(coerce_pointer(p)),
        RawInteractionEvent::PointerMove(p) => InteractionEvent::PointerMove(coerce_pointer(p)),
        RawInteractionEvent::PointerUp(p) => InteractionEvent::PointerUp(coerce_pointer(p)),
        RawInteractionEvent::PointerCancel(p) => InteractionEvent::PointerCancel(coerce_pointer(p)),
        RawInteractionEvent::HoldTick(t) => InteractionEvent::HoldTick(coerce_tick(t)),
        RawInteractionEvent::Reset(r) => InteractionEvent::Reset(coerce_reset(r)),
    }
}

/// Coerce and order a whole trace
pub fn normalize_events(raw_events: &[RawInteractionEvent]) -> Vec<InteractionEvent> {
    let mut events: Vec<InteractionEvent> = raw_events.iter().map(normalize_event).collect();
    // sort_by_key is stable: equal (ts, priority) keep input order
    events.sort_by_key(|e| (e.timestamp_ms(), e.type_priority()));
    events
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_fields_coerced() {
        let raw = RawInteractionEvent::pointer_down(f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::NAN);
        let event = normalize_event(&raw);
        assert_eq!(event, InteractionEvent::pointer_down(1, 0.0, 0.0, 0));
    }

    #[test]
    fn test_missing_fields_coerced() {
        let raw: RawInteractionEvent = serde_json::from_str(r#"{"type":"pointer_move"}"#).unwrap();
        assert_eq!(normalize_event(&raw), InteractionEvent::pointer_move(1, 0.0, 0.0, 0));
    }

    #[test]
    fn test_timestamps_rounded_and_clamped() {
        let a = normalize_event(&RawInteractionEvent::reset(15.6));
        let b = normalize_event(&RawInteractionEvent::reset(-40.0));
        assert_eq!(a.timestamp_ms(), 16);
        assert_eq!(b.timestamp_ms(), 0);
    }

    #[test]
    fn test_pointer_id_minimum_is_one() {
        let event = normalize_event(&RawInteractionEvent::pointer_up(-3.0, 1.0, 2.0, 5.0));
        assert_eq!(event.pointer().map(|p| p.pointer_id), Some(1));
        let event = normalize_event(&RawInteractionEvent::pointer_up(2.4, 1.0, 2.0, 5.0));
        assert_eq!(event.pointer().map(|p| p.pointer_id), Some(2));
    }

    #[test]
    fn test_negative_delta_becomes_zero() {
        let event = normalize_event(&RawInteractionEvent::hold_tick(-250.0, 10.0));
        assert_eq!(event, InteractionEvent::hold_tick(0.0, 10));
    }

    #[test]
    fn test_negative_coordinates_kept() {
        let event = normalize_event(&RawInteractionEvent::pointer_move(1.0, -40.0, -2.5, 3.0));
        assert_eq!(event, InteractionEvent::pointer_move(1, -40.0, -2.5, 3));
    }

    #[test]
    fn test_sorted_by_timestamp_then_priority() {
        let raw = vec![
            RawInteractionEvent::reset(10.0),
            RawInteractionEvent::pointer_up(1.0, 0.0, 0.0, 10.0),
            RawInteractionEvent::hold_tick(16.0, 10.0),
            RawInteractionEvent::pointer_move(1.0, 5.0, 0.0, 10.0),
            RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 10.0),
            RawInteractionEvent::pointer_cancel(1.0, 0.0, 0.0, 10.0),
            RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 2.0),
        ];
        let kinds: Vec<&str> = normalize_events(&raw).iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "pointer_down",
                "pointer_down",
                "pointer_move",
                "hold_tick",
                "pointer_up",
                "pointer_cancel",
                "reset",
            ]
        );
    }

    #[test]
    fn test_sort_is_stable_for_identical_keys() {
        let raw = vec![
            RawInteractionEvent::pointer_move(1.0, 10.0, 0.0, 4.0),
            RawInteractionEvent::pointer_move(1.0, 20.0, 0.0, 4.0),
            RawInteractionEvent::pointer_move(1.0, 30.0, 0.0, 4.0),
        ];
        let xs: Vec<f64> = normalize_events(&raw)
            .iter()
            .filter_map(|e| e.pointer().map(|p| p.x))
            .collect();
        assert_eq!(xs, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_normalize_is_pure() {
        let raw = vec![
            RawInteractionEvent::hold_tick(300.0, 50.0),
            RawInteractionEvent::pointer_down(1.0, 0.0, 0.0, 50.0),
            RawInteractionEvent::pointer_move(1.0, 3.0, 4.0, 20.0),
        ];
        assert_eq!(normalize_events(&raw), normalize_events(&raw));
    }
}
