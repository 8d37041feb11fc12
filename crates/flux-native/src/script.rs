//! Scripted hand performances for headless runs.

use flux_core::hand::{FlatJointSource, Handedness};
use flux_core::synth::{Palm, Shape, SyntheticHand};
use glam::Vec3;

const LEFT_WRIST: Vec3 = Vec3::new(-0.3, 1.2, -0.4);
const RIGHT_WRIST: Vec3 = Vec3::new(0.3, 1.2, -0.4);
const TOUR_STEP_SEC: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    Idle,
    Center,
    Levitate,
    Singularity,
    Vortex,
    Beam,
    Orb,
    TwinOrb,
    Reset,
    /// Every other scenario in turn.
    Tour,
}

impl Scenario {
    pub const ALL: [Scenario; 10] = [
        Scenario::Idle,
        Scenario::Center,
        Scenario::Levitate,
        Scenario::Singularity,
        Scenario::Vortex,
        Scenario::Beam,
        Scenario::Orb,
        Scenario::TwinOrb,
        Scenario::Reset,
        Scenario::Tour,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Center => "center",
            Self::Levitate => "levitate",
            Self::Singularity => "singularity",
            Self::Vortex => "vortex",
            Self::Beam => "beam",
            Self::Orb => "orb",
            Self::TwinOrb => "twin-orb",
            Self::Reset => "reset",
            Self::Tour => "tour",
        }
    }

    /// Joint positions `t` seconds into the performance.
    pub fn hands_at(&self, t: f32) -> FlatJointSource {
        let mut source = FlatJointSource::new();
        let (left, right) = self.pose(t);
        for hand in [left, right].into_iter().flatten() {
            hand.write_to(&mut source);
        }
        source
    }

    fn pose(&self, t: f32) -> (Option<SyntheticHand>, Option<SyntheticHand>) {
        let left = |shape, palm| Some(SyntheticHand::new(Handedness::Left, LEFT_WRIST, shape, palm));
        let right =
            |shape, palm| Some(SyntheticHand::new(Handedness::Right, RIGHT_WRIST, shape, palm));
        // Slow breathing of the hand spread so the center radius moves.
        let sway = Vec3::X * (t * 0.5).sin() * 0.15;
        match self {
            Self::Idle => (None, None),
            Self::Center => (
                Some(SyntheticHand::new(
                    Handedness::Left,
                    LEFT_WRIST - sway,
                    Shape::Open,
                    Palm::Forward,
                )),
                Some(SyntheticHand::new(
                    Handedness::Right,
                    RIGHT_WRIST + sway,
                    Shape::Open,
                    Palm::Forward,
                )),
            ),
            Self::Levitate => (left(Shape::Open, Palm::Up), None),
            Self::Singularity => (
                Some(SyntheticHand::with_index_tip(
                    Handedness::Left,
                    Vec3::new(0.0, 1.1, -0.2),
                    Shape::Point,
                    Palm::Forward,
                )),
                None,
            ),
            Self::Vortex => (left(Shape::Pinch, Palm::Forward), right(Shape::Open, Palm::Forward)),
            Self::Beam => (None, right(Shape::Point, Palm::Down)),
            Self::Orb => (None, right(Shape::Pinch, Palm::Forward)),
            Self::TwinOrb => (left(Shape::Pinch, Palm::Forward), right(Shape::Pinch, Palm::Forward)),
            Self::Reset => (left(Shape::Open, Palm::Up), right(Shape::Open, Palm::Up)),
            Self::Tour => {
                let steps = &Self::ALL[1..Self::ALL.len() - 1];
                let i = (t / TOUR_STEP_SEC) as usize % steps.len();
                // Drop the hands briefly between steps so pinches re-arm together.
                if t % TOUR_STEP_SEC < 0.2 {
                    (None, None)
                } else {
                    steps[i].pose(t)
                }
            }
        }
    }
}
