//! Two-hand interaction resolution.
//!
//! Each frame the committed gestures, palm orientation and pointing state of
//! both hands are reduced to a set of attractors. The left hand (and the
//! two-hand poses) go through [`PRIMARY_RULES`] in order, first match wins.
//! The right hand is resolved on its own, and a synchronised double pinch
//! replaces both with a shared twin orb.

use crate::attractor::{Attractor, AttractorMode, AttractorSet, AttractorSource};
use crate::config::InteractionParams;
use crate::constants::*;
use crate::events::InteractionEvent;
use crate::gesture::{Gesture, GestureTracker};
use crate::hand::{HandFrame, Handedness, Joint};
use glam::Vec3;

/// True when the index tip reaches further from the wrist than the middle
/// tip by more than `margin`.
pub fn is_pointing(frame: &HandFrame, margin: f32) -> bool {
    match (
        frame.distance_to_wrist(Joint::IndexTip),
        frame.distance_to_wrist(Joint::MiddleTip),
    ) {
        (Some(index), Some(middle)) => index - middle > margin,
        _ => false,
    }
}

/// What the resolver needs to know about one tracked hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    pub wrist: Vec3,
    pub index_tip: Option<Vec3>,
    pub palm_up: f32,
    pub pinching: bool,
    pub fist: bool,
    pub pointing: bool,
    pub pinch_started_ms: Option<f64>,
}

impl HandPose {
    pub fn new(frame: &HandFrame, gestures: &GestureTracker, pointing_margin: f32) -> Self {
        let state = gestures.state(frame.handedness);
        Self {
            wrist: frame.wrist,
            index_tip: frame.joint(Joint::IndexTip),
            palm_up: frame.palm_up(),
            pinching: state.is_pinching(),
            fist: state.current == Gesture::Fist,
            pointing: is_pointing(frame, pointing_margin),
            pinch_started_ms: state.pinch_started_ms,
        }
    }

    /// Unit vector from wrist to index tip.
    pub fn pointing_direction(&self) -> Option<Vec3> {
        self.index_tip
            .map(|tip| (tip - self.wrist).normalize_or_zero())
            .filter(|d| *d != Vec3::ZERO)
    }

    fn is_open(&self) -> bool {
        !self.pinching && !self.fist
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandsSnapshot {
    pub left: Option<HandPose>,
    pub right: Option<HandPose>,
}

impl HandsSnapshot {
    pub fn from_frames(
        left: Option<&HandFrame>,
        right: Option<&HandFrame>,
        gestures: &GestureTracker,
        params: &InteractionParams,
    ) -> Self {
        Self {
            left: left.map(|f| HandPose::new(f, gestures, params.pointing_margin)),
            right: right.map(|f| HandPose::new(f, gestures, params.pointing_margin)),
        }
    }

    pub fn hand(&self, hand: Handedness) -> Option<&HandPose> {
        match hand {
            Handedness::Left => self.left.as_ref(),
            Handedness::Right => self.right.as_ref(),
        }
    }

    pub fn both(&self) -> Option<(&HandPose, &HandPose)> {
        Some((self.left.as_ref()?, self.right.as_ref()?))
    }

    fn pinching(&self, hand: Handedness) -> bool {
        self.hand(hand).is_some_and(|p| p.pinching)
    }
}

/// Outcome of the ordered left/two-hand rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryMode {
    Reset,
    Levitate,
    Singularity,
    Vortex,
    Freeze,
    Center,
}

impl PrimaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Levitate => "levitate",
            Self::Singularity => "singularity",
            Self::Vortex => "vortex",
            Self::Freeze => "freeze",
            Self::Center => "center",
        }
    }
}

pub type RulePredicate = fn(&HandsSnapshot, &InteractionParams) -> bool;

pub struct PrimaryRule {
    pub mode: PrimaryMode,
    pub when: RulePredicate,
}

fn palms_up_open(s: &HandsSnapshot, p: &InteractionParams) -> bool {
    s.both().is_some_and(|(l, r)| {
        l.palm_up > p.palm_up_reset && r.palm_up > p.palm_up_reset && l.is_open() && r.is_open()
    })
}

fn left_palm_up(s: &HandsSnapshot, p: &InteractionParams) -> bool {
    s.left.as_ref().is_some_and(|l| l.palm_up > p.palm_up_levitate)
}

fn left_pointing(s: &HandsSnapshot, _: &InteractionParams) -> bool {
    s.left
        .as_ref()
        .is_some_and(|l| l.pointing && l.index_tip.is_some())
}

fn left_pinch_alone(s: &HandsSnapshot, _: &InteractionParams) -> bool {
    s.pinching(Handedness::Left) && !s.pinching(Handedness::Right)
}

fn left_fist(s: &HandsSnapshot, _: &InteractionParams) -> bool {
    s.left.as_ref().is_some_and(|l| l.fist)
}

fn both_tracked(s: &HandsSnapshot, _: &InteractionParams) -> bool {
    s.both().is_some()
}

/// Left-hand and two-hand modes in priority order.
pub const PRIMARY_RULES: [PrimaryRule; 6] = [
    PrimaryRule {
        mode: PrimaryMode::Reset,
        when: palms_up_open,
    },
    PrimaryRule {
        mode: PrimaryMode::Levitate,
        when: left_palm_up,
    },
    PrimaryRule {
        mode: PrimaryMode::Singularity,
        when: left_pointing,
    },
    PrimaryRule {
        mode: PrimaryMode::Vortex,
        when: left_pinch_alone,
    },
    PrimaryRule {
        mode: PrimaryMode::Freeze,
        when: left_fist,
    },
    PrimaryRule {
        mode: PrimaryMode::Center,
        when: both_tracked,
    },
];

pub fn select_primary(snapshot: &HandsSnapshot, params: &InteractionParams) -> Option<PrimaryMode> {
    PRIMARY_RULES
        .iter()
        .find(|rule| (rule.when)(snapshot, params))
        .map(|rule| rule.mode)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightMode {
    Freeze,
    Orb,
    Beam,
}

/// Right hand: fist, then pinch, then pointing.
pub fn select_right(pose: &HandPose) -> Option<RightMode> {
    if pose.fist {
        Some(RightMode::Freeze)
    } else if pose.pinching {
        Some(RightMode::Orb)
    } else if pose.pointing && pose.pointing_direction().is_some() {
        Some(RightMode::Beam)
    } else {
        None
    }
}

/// Both hands pinching, with rising edges inside the sync window.
pub fn is_dual_pinch(snapshot: &HandsSnapshot, window_ms: f64) -> bool {
    let Some((l, r)) = snapshot.both() else {
        return false;
    };
    match (l.pinching, r.pinching, l.pinch_started_ms, r.pinch_started_ms) {
        (true, true, Some(a), Some(b)) => (a - b).abs() < window_ms,
        _ => false,
    }
}

/// Everything the resolver decided this frame.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub attractors: AttractorSet,
    pub primary: Option<PrimaryMode>,
    pub right: Option<RightMode>,
    pub dual_pinch: bool,
    pub reset_factor: f32,
    pub smoothed_distance: f32,
    /// Smoothed distance normalised to 0 (touching) ..= 1 (arms spread).
    pub spread: f32,
}

impl Resolution {
    pub fn attractor(&self, mode: AttractorMode) -> Option<&Attractor> {
        self.attractors.iter().find(|a| a.mode == mode)
    }
}

pub struct InteractionResolver {
    pub params: InteractionParams,
    smoothed_distance: f32,
    last_reset_ms: Option<f64>,
    reset_elapsed: Option<f32>,
    reset_factor: f32,
    orb_size: f32,
    left_orb_size: f32,
}

impl InteractionResolver {
    pub fn new(params: InteractionParams) -> Self {
        Self {
            params,
            smoothed_distance: DISTANCE_INITIAL,
            last_reset_ms: None,
            reset_elapsed: None,
            reset_factor: 0.0,
            orb_size: 0.0,
            left_orb_size: 0.0,
        }
    }

    pub fn smoothed_distance(&self) -> f32 {
        self.smoothed_distance
    }

    pub fn reset_factor(&self) -> f32 {
        self.reset_factor
    }

    pub fn is_resetting(&self) -> bool {
        self.reset_elapsed.is_some()
    }

    /// Start a homing reset now. Restarts the ramp if one is running.
    pub fn trigger_reset(&mut self, now_ms: f64, out_events: &mut Vec<InteractionEvent>) {
        self.last_reset_ms = Some(now_ms);
        self.reset_elapsed = Some(0.0);
        log::info!("[interaction] reset triggered at {:.0}ms", now_ms);
        out_events.push(InteractionEvent::ResetTriggered { at_ms: now_ms });
    }

    pub fn resolve(
        &mut self,
        snapshot: &HandsSnapshot,
        dt: f32,
        now_ms: f64,
        beat: bool,
        out_events: &mut Vec<InteractionEvent>,
    ) -> Resolution {
        if let Some((l, r)) = snapshot.both() {
            let a = self.params.distance_smoothing;
            self.smoothed_distance =
                self.smoothed_distance * (1.0 - a) + l.wrist.distance(r.wrist) * a;
        }

        let primary = select_primary(snapshot, &self.params);
        if primary == Some(PrimaryMode::Reset) {
            let cooled = self
                .last_reset_ms
                .map_or(true, |t| now_ms - t > self.params.reset_cooldown_ms);
            if cooled {
                self.trigger_reset(now_ms, out_events);
            }
        }

        let dual_pinch = is_dual_pinch(snapshot, self.params.dual_pinch_window_ms);
        let mut attractors = AttractorSet::new();
        let mut right_mode = None;
        if dual_pinch {
            self.orb_size = (self.orb_size + dt * TWIN_ORB_GROWTH_PER_SEC).min(TWIN_ORB_MAX);
            self.left_orb_size =
                (self.left_orb_size + dt * TWIN_ORB_GROWTH_PER_SEC).min(TWIN_ORB_MAX);
            if let Some((l, r)) = snapshot.both() {
                attractors.push(
                    Attractor::new(AttractorMode::TwinOrb, l.wrist, TWIN_ORB)
                        .from_source(AttractorSource::Both)
                        .with_orb(self.left_orb_size)
                        .with_partner(r.wrist, self.orb_size),
                );
            }
        } else {
            self.left_orb_size *= LEFT_ORB_DECAY;
            if let Some(a) = primary.and_then(|m| self.primary_attractor(m, snapshot)) {
                attractors.push(a);
            }
            if let Some(right) = snapshot.right.as_ref() {
                right_mode = select_right(right);
                if let Some(a) = self.right_attractor(right_mode, right, dt) {
                    attractors.push(a);
                }
            } else {
                self.orb_size *= ORB_DECAY;
            }
        }

        self.advance_reset(dt, beat);

        if let Some(mode) = primary {
            log::trace!(
                "[interaction] primary={} right={:?} dual={} attractors={}",
                mode.as_str(),
                right_mode,
                dual_pinch,
                attractors.len()
            );
        }

        Resolution {
            attractors,
            primary,
            right: right_mode,
            dual_pinch,
            reset_factor: self.reset_factor,
            smoothed_distance: self.smoothed_distance,
            spread: ((self.smoothed_distance - DISTANCE_MIN) / (DISTANCE_MAX - DISTANCE_MIN))
                .clamp(0.0, 1.0),
        }
    }

    fn primary_attractor(&self, mode: PrimaryMode, s: &HandsSnapshot) -> Option<Attractor> {
        let left = s.left.as_ref();
        let attractor = match mode {
            PrimaryMode::Reset => return None,
            PrimaryMode::Levitate => {
                Attractor::new(AttractorMode::Levitate, left?.wrist, LEVITATE)
                    .from_source(AttractorSource::Left)
            }
            PrimaryMode::Singularity => {
                Attractor::new(AttractorMode::Singularity, left?.index_tip?, SINGULARITY)
                    .from_source(AttractorSource::Left)
            }
            PrimaryMode::Vortex => Attractor::new(AttractorMode::Vortex, left?.wrist, VORTEX)
                .from_source(AttractorSource::Left),
            PrimaryMode::Freeze => Attractor::new(AttractorMode::Freeze, left?.wrist, FREEZE)
                .from_source(AttractorSource::Left),
            PrimaryMode::Center => {
                let both_pinching = s.pinching(Handedness::Left) && s.pinching(Handedness::Right);
                let preset = if both_pinching {
                    CENTER_PINCH
                } else if self.smoothed_distance < self.params.touching_distance {
                    CENTER_TOUCH
                } else {
                    (
                        CENTER_AMBIENT_STRENGTH,
                        CENTER_AMBIENT_RADIUS + self.smoothed_distance * 2.0,
                    )
                };
                Attractor::new(AttractorMode::Center, self.params.center, preset)
                    .from_source(AttractorSource::Center)
            }
        };
        Some(attractor)
    }

    fn right_attractor(&mut self, mode: Option<RightMode>, right: &HandPose, dt: f32) -> Option<Attractor> {
        if mode == Some(RightMode::Orb) {
            self.orb_size = (self.orb_size + dt * ORB_GROWTH_PER_SEC).min(1.0);
        } else {
            self.orb_size *= ORB_DECAY;
        }
        let attractor = match mode? {
            RightMode::Freeze => Attractor::new(AttractorMode::Freeze, right.wrist, FREEZE),
            RightMode::Orb => {
                Attractor::new(AttractorMode::Orb, right.wrist, ORB).with_orb(self.orb_size)
            }
            RightMode::Beam => Attractor::new(AttractorMode::Beam, right.index_tip?, BEAM)
                .with_direction(right.pointing_direction()?),
        };
        Some(attractor.from_source(AttractorSource::Right))
    }

    fn advance_reset(&mut self, dt: f32, beat: bool) {
        match self.reset_elapsed {
            Some(elapsed) => {
                let elapsed = elapsed + dt;
                self.reset_factor = (elapsed * RESET_RAMP_RATE).min(1.0);
                self.reset_elapsed = (elapsed <= self.params.reset_duration_sec).then_some(elapsed);
            }
            None => self.reset_factor *= RESET_DECAY,
        }
        if beat {
            self.reset_factor = self.reset_factor.max(BEAT_RIPPLE);
        }
    }
}

impl Default for InteractionResolver {
    fn default() -> Self {
        Self::new(InteractionParams::default())
    }
}
