//! Discrete hand gestures from joint distances.
//!
//! Finger extension is judged only by distances to the wrist, so the result
//! does not depend on how the hand is rotated. Raw per-frame classifications
//! pass through a debounce counter before they are committed.

use crate::config::GestureParams;
use crate::events::InteractionEvent;
use crate::hand::{Finger, HandFrame, Handedness};
use fnv::FnvHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gesture {
    #[default]
    Unknown,
    Open,
    Fist,
    Point,
    Relaxed,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Open => "open",
            Self::Fist => "fist",
            Self::Point => "point",
            Self::Relaxed => "relaxed",
        }
    }
}

/// `Some(true)` when the fingertip reaches further from the wrist than the
/// proximal joint plus `margin`. `None` when either joint is missing.
pub fn is_extended(hand: &HandFrame, finger: Finger, margin: f32) -> Option<bool> {
    let tip = hand.distance_to_wrist(finger.tip())?;
    let base = hand.distance_to_wrist(finger.proximal())?;
    Some(tip > base + margin)
}

/// Map the index/middle/ring/pinky extension pattern to a gesture. Fingers
/// that cannot be evaluated count as curled; `None` means no finger could be
/// evaluated at all.
pub fn classify(hand: &HandFrame, margin: f32) -> Option<Gesture> {
    let states = Finger::ALL.map(|f| is_extended(hand, f, margin));
    if states.iter().all(Option::is_none) {
        return None;
    }
    let [index, middle, ring, pinky] = states.map(|s| s.unwrap_or(false));
    let gesture = match (index, middle, ring, pinky) {
        (true, true, true, true) => Gesture::Open,
        (false, false, false, false) => Gesture::Fist,
        (true, false, false, false) => Gesture::Point,
        _ => Gesture::Relaxed,
    };
    Some(gesture)
}

/// Two-threshold pinch detector. Between `enter` and `exit` the previous
/// state is held.
#[derive(Debug, Clone)]
pub struct PinchHysteresis {
    pub enter: f32,
    pub exit: f32,
    pinching: bool,
}

impl PinchHysteresis {
    pub fn new(enter: f32, exit: f32) -> Self {
        Self {
            enter,
            exit,
            pinching: false,
        }
    }

    pub fn update(&mut self, distance: f32) -> bool {
        if !self.pinching && distance < self.enter {
            self.pinching = true;
        } else if self.pinching && distance > self.exit {
            self.pinching = false;
        }
        self.pinching
    }

    pub fn is_pinching(&self) -> bool {
        self.pinching
    }

    pub fn release(&mut self) {
        self.pinching = false;
    }
}

/// Persistent per-hand state.
#[derive(Debug, Clone)]
pub struct HandGestureState {
    pub current: Gesture,
    pub pinch: PinchHysteresis,
    /// Timestamp of the most recent pinch rising edge.
    pub pinch_started_ms: Option<f64>,
    pub tracked: bool,
    counters: FnvHashMap<Gesture, u32>,
}

impl HandGestureState {
    fn new(params: &GestureParams) -> Self {
        Self {
            current: Gesture::Unknown,
            pinch: PinchHysteresis::new(params.pinch_enter, params.pinch_exit),
            pinch_started_ms: None,
            tracked: false,
            counters: FnvHashMap::default(),
        }
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_pinching()
    }

    pub fn counter(&self, gesture: Gesture) -> u32 {
        self.counters.get(&gesture).copied().unwrap_or(0)
    }
}

pub struct GestureTracker {
    pub params: GestureParams,
    hands: [HandGestureState; 2],
}

impl GestureTracker {
    pub fn new(params: GestureParams) -> Self {
        let hands = [HandGestureState::new(&params), HandGestureState::new(&params)];
        Self { params, hands }
    }

    pub fn state(&self, hand: Handedness) -> &HandGestureState {
        &self.hands[hand.index()]
    }

    pub fn current(&self, hand: Handedness) -> Gesture {
        self.hands[hand.index()].current
    }

    pub fn is_pinching(&self, hand: Handedness) -> bool {
        self.hands[hand.index()].is_pinching()
    }

    /// Feed one raw classification. Returns true when it committed a
    /// transition (and pushed the change/enter/exit records).
    pub fn update(
        &mut self,
        hand: Handedness,
        raw: Gesture,
        out_events: &mut Vec<InteractionEvent>,
    ) -> bool {
        let threshold = self.params.stability_frames;
        let state = &mut self.hands[hand.index()];
        let count = {
            let c = state.counters.entry(raw).or_insert(0);
            *c = c.saturating_add(1);
            *c
        };
        for (g, c) in state.counters.iter_mut() {
            if *g != raw {
                *c = 0;
            }
        }
        if count < threshold || raw == state.current {
            return false;
        }
        let previous = state.current;
        state.current = raw;
        log::debug!(
            "[gesture] {} {} -> {}",
            hand.as_str(),
            previous.as_str(),
            raw.as_str()
        );
        out_events.push(InteractionEvent::GestureChanged {
            hand,
            from: previous,
            to: raw,
        });
        out_events.push(InteractionEvent::GestureEntered { hand, gesture: raw });
        if previous != Gesture::Unknown {
            out_events.push(InteractionEvent::GestureExited {
                hand,
                gesture: previous,
            });
        }
        true
    }

    /// Process one tracked hand frame: pinch hysteresis, then classification
    /// and debounce.
    pub fn observe(&mut self, frame: &HandFrame, now_ms: f64, out_events: &mut Vec<InteractionEvent>) {
        let hand = frame.handedness;
        let state = &mut self.hands[hand.index()];
        state.tracked = true;
        if let Some(distance) = frame.pinch_distance() {
            let was = state.pinch.is_pinching();
            let now = state.pinch.update(distance);
            if now && !was {
                state.pinch_started_ms = Some(now_ms);
                out_events.push(InteractionEvent::PinchStarted { hand, at_ms: now_ms });
            } else if was && !now {
                out_events.push(InteractionEvent::PinchEnded { hand, at_ms: now_ms });
            }
        }
        if let Some(raw) = classify(frame, self.params.extension_margin) {
            self.update(hand, raw, out_events);
        }
    }

    /// The hand dropped out of tracking. A held pinch is released; the
    /// committed gesture is kept.
    pub fn lose(&mut self, hand: Handedness, now_ms: f64, out_events: &mut Vec<InteractionEvent>) {
        let state = &mut self.hands[hand.index()];
        if !state.tracked {
            return;
        }
        state.tracked = false;
        state.counters.clear();
        if state.pinch.is_pinching() {
            state.pinch.release();
            out_events.push(InteractionEvent::PinchEnded { hand, at_ms: now_ms });
        }
        log::debug!("[gesture] {} hand lost", hand.as_str());
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(GestureParams::default())
    }
}
