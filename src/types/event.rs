//! Interaction events consumed by the ritual machine
//!
//! Two shapes of the same closed union:
//! - `RawInteractionEvent`: what callers and trace files supply, every
//!   numeric field optional and unchecked
//! - `InteractionEvent`: the normalized form the machine consumes

use serde::{Deserialize, Deserializer, Serialize};

/// A pointer sample after normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerSample {
    /// Always >= 1
    pub pointer_id: u32,
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: u64,
}

/// A timer tick advancing the hold stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldTick {
    /// Always >= 0
    pub delta_ms: f64,
    pub timestamp_ms: u64,
}

/// A hard reset request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetMarker {
    pub timestamp_ms: u64,
}

/// Normalized interaction event, discriminated by `type`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    Entered(PointerSample),
    PointerDown(PointerSample),
    PointerMove(PointerSample),
    PointerUp(PointerSample),
    PointerCancel(PointerSample),
    HoldTick(HoldTick),
    Reset(ResetMarker),
}

impl InteractionEvent {
    pub fn entered(pointer_id: u32, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self::Entered(PointerSample { pointer_id, x, y, timestamp_ms })
    }

    pub fn pointer_down(pointer_id: u32, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self::PointerDown(PointerSample { pointer_id, x, y, timestamp_ms })
    }

    pub fn pointer_move(pointer_id: u32, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self::PointerMove(PointerSample { pointer_id, x, y, timestamp_ms })
    }

    pub fn pointer_up(pointer_id: u32, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self::PointerUp(PointerSample { pointer_id, x, y, timestamp_ms })
    }

    pub fn pointer_cancel(pointer_id: u32, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self::PointerCancel(PointerSample { pointer_id, x, y, timestamp_ms })
    }

    pub fn hold_tick(delta_ms: f64, timestamp_ms: u64) -> Self {
        Self::HoldTick(HoldTick { delta_ms, timestamp_ms })
    }

    pub fn reset(timestamp_ms: u64) -> Self {
        Self::Reset(ResetMarker { timestamp_ms })
    }

    /// Event timestamp
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Self::Entered(p)
            | Self::PointerDown(p)
            | Self::PointerMove(p)
            | Self::PointerUp(p)
            | Self::PointerCancel(p) => p.timestamp_ms,
            Self::HoldTick(t) => t.timestamp_ms,
            Self::Reset(r) => r.timestamp_ms,
        }
    }

    /// Tie-break rank for events sharing a timestamp
    pub fn type_priority(&self) -> u8 {
        match self {
            Self::Entered(_) => 0,
            Self::PointerDown(_) => 1,
            Self::PointerMove(_) => 2,
            Self::HoldTick(_) => 3,
            Self::PointerUp(_) => 4,
            Self::PointerCancel(_) => 5,
            Self::Reset(_) => 6,
        }
    }

    /// Wire name of the event type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Entered(_) => "entered",
            Self::PointerDown(_) => "pointer_down",
            Self::PointerMove(_) => "pointer_move",
            Self::PointerUp(_) => "pointer_up",
            Self::PointerCancel(_) => "pointer_cancel",
            Self::HoldTick(_) => "hold_tick",
            Self::Reset(_) => "reset",
        }
    }

    /// Pointer payload, if this is a pointer event
    pub fn pointer(&self) -> Option<&PointerSample> {
        match self {
            Self::Entered(p)
            | Self::PointerDown(p)
            | Self::PointerMove(p)
            | Self::PointerUp(p)
            | Self::PointerCancel(p) => Some(p),
            Self::HoldTick(_) | Self::Reset(_) => None,
        }
    }
}

/// Any JSON number, anything else `None`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_f64())
}

/// Raw pointer fields as supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPointer {
    #[serde(default, deserialize_with = "lenient_number")]
    pub pointer_id: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub timestamp_ms: Option<f64>,
}

/// Raw hold tick fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTick {
    #[serde(default, deserialize_with = "lenient_number")]
    pub delta_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub timestamp_ms: Option<f64>,
}

/// Raw reset fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReset {
    #[serde(default, deserialize_with = "lenient_number")]
    pub timestamp_ms: Option<f64>,
}

/// Unchecked interaction event, same tags as `InteractionEvent`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInteractionEvent {
    Entered(RawPointer),
    PointerDown(RawPointer),
    PointerMove(RawPointer),
    PointerUp(RawPointer),
    PointerCancel(RawPointer),
    HoldTick(RawTick),
    Reset(RawReset),
}

impl RawInteractionEvent {
    fn raw_pointer(pointer_id: f64, x: f64, y: f64, timestamp_ms: f64) -> RawPointer {
        RawPointer {
            pointer_id: Some(pointer_id),
            x: Some(x),
            y: Some(y),
            timestamp_ms: Some(timestamp_ms),
        }
    }

    pub fn pointer_down(pointer_id: f64, x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self::PointerDown(Self::raw_pointer(pointer_id, x, y, timestamp_ms))
    }

    pub fn pointer_move(pointer_id: f64, x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self::PointerMove(Self::raw_pointer(pointer_id, x, y, timestamp_ms))
    }

    pub fn pointer_up(pointer_id: f64, x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self::PointerUp(Self::raw_pointer(pointer_id, x, y, timestamp_ms))
    }

    pub fn pointer_cancel(pointer_id: f64, x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self::PointerCancel(Self::raw_pointer(pointer_id, x, y, timestamp_ms))
    }

    pub fn hold_tick(delta_ms: f64, timestamp_ms: f64) -> Self {
        Self::HoldTick(RawTick {
            delta_ms: Some(delta_ms),
            timestamp_ms: Some(timestamp_ms),
        })
    }

    pub fn reset(timestamp_ms: f64) -> Self {
        Self::Reset(RawReset {
            timestamp_ms: Some(timestamp_ms),
        })
    }
}

impl From<&InteractionEvent> for RawInteractionEvent {
    fn from(event: &InteractionEvent) -> Self {
        let pointer = |p: &PointerSample| RawPointer {
            pointer_id: Some(f64::from(p.pointer_id)),
            x: Some(p.x),
            y: Some(p.y),
            timestamp_ms: Some(p.timestamp_ms as f64),
        };
        match event {
            InteractionEvent::Entered(p) => Self::Entered(pointer(p)),
            InteractionEvent::PointerDown(p) => Self::PointerDown(pointer(p)),
            InteractionEvent::PointerMove(p) => Self::PointerMove(pointer(p)),
            InteractionEvent::PointerUp(p) => Self::PointerUp(pointer(p)),
            InteractionEvent::PointerCancel(p) => Self::PointerCancel(pointer(p)),
            InteractionEvent::HoldTick(t) => Self::HoldTick(RawTick {
                delta_ms: Some(t.delta_ms),
                timestamp_ms: Some(t.timestamp_ms as f64),
            }),
            InteractionEvent::Reset(r) => Self::Reset(RawReset {
                timestamp_ms: Some(r.timestamp_ms as f64),
            }),
        }
    }
}
