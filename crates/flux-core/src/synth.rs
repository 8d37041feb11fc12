//! Synthetic hand poses for headless runs and tests.
//!
//! Builds joint sets that the classifier reads as a given gesture, with the
//! palm facing a chosen way. Geometry is stylised: every finger lies on the
//! ray from the wrist through its proximal joint.

use crate::hand::{palm_normal, FlatJointSource, Handedness, Joint};
use glam::Vec3;

const KNUCKLE_REACH: f32 = 0.08;
const EXTENDED_REACH: f32 = 0.17;
const CURLED_REACH: f32 = 0.04;
const PINCH_REACH: f32 = 0.12;
const THUMB_REACH: f32 = 0.05;
const THUMB_LIFT: f32 = 0.06;
const PINCH_GAP: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Open,
    Fist,
    Point,
    /// Thumb on index tip, other fingers extended.
    Pinch,
    Relaxed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palm {
    Up,
    Down,
    /// Palm normal horizontal.
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticHand {
    pub handedness: Handedness,
    pub wrist: Vec3,
    pub shape: Shape,
    pub palm: Palm,
}

impl SyntheticHand {
    pub fn new(handedness: Handedness, wrist: Vec3, shape: Shape, palm: Palm) -> Self {
        Self {
            handedness,
            wrist,
            shape,
            palm,
        }
    }

    /// Place the hand so that its index tip lands on `tip`.
    pub fn with_index_tip(handedness: Handedness, tip: Vec3, shape: Shape, palm: Palm) -> Self {
        let probe = Self::new(handedness, Vec3::ZERO, shape, palm);
        Self::new(handedness, tip - probe.joint(Joint::IndexTip), shape, palm)
    }

    // Unit directions from wrist to index and pinky knuckles.
    fn knuckle_axes(&self) -> (Vec3, Vec3) {
        match (self.handedness, self.palm) {
            (Handedness::Right, Palm::Up) | (Handedness::Left, Palm::Down) => (Vec3::Z, Vec3::X),
            (Handedness::Right, Palm::Down) | (Handedness::Left, Palm::Up) => (Vec3::X, Vec3::Z),
            (_, Palm::Forward) => (Vec3::Y, Vec3::X),
        }
    }

    fn finger_dir(&self, t: f32) -> Vec3 {
        let (index, pinky) = self.knuckle_axes();
        index.lerp(pinky, t).normalize()
    }

    fn extended(&self, joint: Joint) -> bool {
        let fingers = match self.shape {
            Shape::Open | Shape::Pinch => [true; 4],
            Shape::Fist => [false; 4],
            Shape::Point => [true, false, false, false],
            Shape::Relaxed => [true, true, false, false],
        };
        match joint {
            Joint::IndexTip => fingers[0],
            Joint::MiddleTip => fingers[1],
            Joint::RingTip => fingers[2],
            _ => fingers[3],
        }
    }

    pub fn joint(&self, joint: Joint) -> Vec3 {
        let (index, pinky) = self.knuckle_axes();
        let w = self.wrist;
        let tip = |t: f32, j: Joint| {
            let reach = if self.extended(j) {
                EXTENDED_REACH
            } else {
                CURLED_REACH
            };
            w + self.finger_dir(t) * reach
        };
        match joint {
            Joint::Wrist => w,
            Joint::IndexProximal => w + index * KNUCKLE_REACH,
            Joint::PinkyProximal => w + pinky * KNUCKLE_REACH,
            Joint::MiddleProximal => w + index.lerp(pinky, 1.0 / 3.0) * KNUCKLE_REACH,
            Joint::RingProximal => w + index.lerp(pinky, 2.0 / 3.0) * KNUCKLE_REACH,
            Joint::IndexTip if self.shape == Shape::Pinch => w + index * PINCH_REACH,
            Joint::IndexTip => tip(0.0, joint),
            Joint::MiddleTip => tip(1.0 / 3.0, joint),
            Joint::RingTip => tip(2.0 / 3.0, joint),
            Joint::PinkyTip => tip(1.0, joint),
            Joint::ThumbTip => {
                let normal = palm_normal(
                    self.handedness,
                    w,
                    w + index * KNUCKLE_REACH,
                    w + pinky * KNUCKLE_REACH,
                );
                if self.shape == Shape::Pinch {
                    self.joint(Joint::IndexTip) + normal * PINCH_GAP
                } else {
                    w + index * THUMB_REACH + normal * THUMB_LIFT
                }
            }
        }
    }

    pub fn write_to(&self, source: &mut FlatJointSource) {
        for joint in Joint::ALL {
            source.set_joint(self.handedness, joint, Some(self.joint(joint)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{classify, Gesture};
    use crate::hand::sample_hand;

    fn classify_synthetic(shape: Shape) -> Option<Gesture> {
        let mut source = FlatJointSource::new();
        SyntheticHand::new(Handedness::Right, Vec3::new(0.2, 1.2, -0.3), shape, Palm::Forward)
            .write_to(&mut source);
        let frame = sample_hand(&source, Handedness::Right)?;
        classify(&frame, crate::constants::EXTENSION_MARGIN)
    }

    #[test]
    fn shapes_classify_as_intended() {
        assert_eq!(classify_synthetic(Shape::Open), Some(Gesture::Open));
        assert_eq!(classify_synthetic(Shape::Pinch), Some(Gesture::Open));
        assert_eq!(classify_synthetic(Shape::Fist), Some(Gesture::Fist));
        assert_eq!(classify_synthetic(Shape::Point), Some(Gesture::Point));
        assert_eq!(classify_synthetic(Shape::Relaxed), Some(Gesture::Relaxed));
    }

    #[test]
    fn palm_orientation_matches_request() {
        for hand in Handedness::BOTH {
            let mut source = FlatJointSource::new();
            SyntheticHand::new(hand, Vec3::Y, Shape::Open, Palm::Up).write_to(&mut source);
            let up = sample_hand(&source, hand).map(|f| f.palm_up());
            SyntheticHand::new(hand, Vec3::Y, Shape::Open, Palm::Down).write_to(&mut source);
            let down = sample_hand(&source, hand).map(|f| f.palm_up());
            assert!(up.is_some_and(|v| v > 0.99), "{} palm up: {:?}", hand.as_str(), up);
            assert!(down.is_some_and(|v| v < -0.99), "{} palm down: {:?}", hand.as_str(), down);
        }
    }
}
