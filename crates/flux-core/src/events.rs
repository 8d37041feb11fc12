use crate::gesture::Gesture;
use crate::hand::Handedness;

/// Records produced while processing a frame. Pushed onto a caller-owned
/// `Vec` and drained by whoever drives the frame loop.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    GestureChanged {
        hand: Handedness,
        from: Gesture,
        to: Gesture,
    },
    GestureEntered {
        hand: Handedness,
        gesture: Gesture,
    },
    GestureExited {
        hand: Handedness,
        gesture: Gesture,
    },
    PinchStarted {
        hand: Handedness,
        at_ms: f64,
    },
    PinchEnded {
        hand: Handedness,
        at_ms: f64,
    },
    ResetTriggered {
        at_ms: f64,
    },
}

impl InteractionEvent {
    /// Stable kebab-case name, used as the event type on the JS side.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GestureChanged { .. } => "gesture-changed",
            Self::GestureEntered { .. } => "gesture-entered",
            Self::GestureExited { .. } => "gesture-exited",
            Self::PinchStarted { .. } => "pinch-started",
            Self::PinchEnded { .. } => "pinch-ended",
            Self::ResetTriggered { .. } => "reset-triggered",
        }
    }

    pub fn hand(&self) -> Option<Handedness> {
        match self {
            Self::GestureChanged { hand, .. }
            | Self::GestureEntered { hand, .. }
            | Self::GestureExited { hand, .. }
            | Self::PinchStarted { hand, .. }
            | Self::PinchEnded { hand, .. } => Some(*hand),
            Self::ResetTriggered { .. } => None,
        }
    }
}
