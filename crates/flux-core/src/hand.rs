//! Per-frame hand pose sampling.
//!
//! Everything downstream of this module works with plain `Vec3`s. The host
//! tracking API is reached only through a [`JointSource`] implementation.

use crate::error::{FluxError, Result};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub const BOTH: [Handedness; 2] = [Handedness::Left, Handedness::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// The subset of XR hand joints the classifier and resolver read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Wrist,
    ThumbTip,
    IndexTip,
    IndexProximal,
    MiddleTip,
    MiddleProximal,
    RingTip,
    RingProximal,
    PinkyTip,
    PinkyProximal,
}

pub const JOINT_COUNT: usize = 10;

/// Floats per hand in the flat joint layout (`[x, y, z]` per joint).
pub const FLAT_HAND_LEN: usize = JOINT_COUNT * 3;

impl Joint {
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Wrist,
        Joint::ThumbTip,
        Joint::IndexTip,
        Joint::IndexProximal,
        Joint::MiddleTip,
        Joint::MiddleProximal,
        Joint::RingTip,
        Joint::RingProximal,
        Joint::PinkyTip,
        Joint::PinkyProximal,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Name used by the WebXR hand input module.
    pub fn xr_name(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbTip => "thumb-tip",
            Self::IndexTip => "index-finger-tip",
            Self::IndexProximal => "index-finger-phalanx-proximal",
            Self::MiddleTip => "middle-finger-tip",
            Self::MiddleProximal => "middle-finger-phalanx-proximal",
            Self::RingTip => "ring-finger-tip",
            Self::RingProximal => "ring-finger-phalanx-proximal",
            Self::PinkyTip => "pinky-finger-tip",
            Self::PinkyProximal => "pinky-finger-phalanx-proximal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn tip(&self) -> Joint {
        match self {
            Self::Index => Joint::IndexTip,
            Self::Middle => Joint::MiddleTip,
            Self::Ring => Joint::RingTip,
            Self::Pinky => Joint::PinkyTip,
        }
    }

    pub fn proximal(&self) -> Joint {
        match self {
            Self::Index => Joint::IndexProximal,
            Self::Middle => Joint::MiddleProximal,
            Self::Ring => Joint::RingProximal,
            Self::Pinky => Joint::PinkyProximal,
        }
    }
}

/// Anything that can answer "where is this joint right now".
pub trait JointSource {
    fn joint(&self, hand: Handedness, joint: Joint) -> Option<Vec3>;
}

/// One hand, one frame. Never carried across frames.
#[derive(Debug, Clone)]
pub struct HandFrame {
    pub handedness: Handedness,
    pub wrist: Vec3,
    /// Unit vector, or zero when the palm triangle is degenerate.
    pub palm_normal: Vec3,
    joints: [Option<Vec3>; JOINT_COUNT],
}

impl HandFrame {
    pub fn joint(&self, joint: Joint) -> Option<Vec3> {
        self.joints[joint.index()]
    }

    /// Palm normal projected onto world up; 1.0 is palm facing the sky.
    pub fn palm_up(&self) -> f32 {
        self.palm_normal.dot(Vec3::Y)
    }

    pub fn distance_to_wrist(&self, joint: Joint) -> Option<f32> {
        self.joint(joint).map(|p| p.distance(self.wrist))
    }

    pub fn pinch_distance(&self) -> Option<f32> {
        let thumb = self.joint(Joint::ThumbTip)?;
        let index = self.joint(Joint::IndexTip)?;
        Some(thumb.distance(index))
    }
}

/// Palm normal from the wrist/index-proximal/pinky-proximal triangle, flipped
/// for the left hand so that "up" means the same thing for both.
pub fn palm_normal(handedness: Handedness, wrist: Vec3, index_proximal: Vec3, pinky_proximal: Vec3) -> Vec3 {
    let n = (index_proximal - wrist)
        .cross(pinky_proximal - wrist)
        .normalize_or_zero();
    match handedness {
        Handedness::Left => -n,
        Handedness::Right => n,
    }
}

/// Read one hand from `source`. Returns `None` when any required joint is
/// missing; optional joints may be absent individually.
pub fn sample_hand<S: JointSource + ?Sized>(source: &S, handedness: Handedness) -> Option<HandFrame> {
    let mut joints = [None; JOINT_COUNT];
    for joint in Joint::ALL {
        joints[joint.index()] = source
            .joint(handedness, joint)
            .filter(|p| p.is_finite());
    }
    let wrist = joints[Joint::Wrist.index()]?;
    let index_proximal = joints[Joint::IndexProximal.index()]?;
    let pinky_proximal = joints[Joint::PinkyProximal.index()]?;
    Some(HandFrame {
        handedness,
        wrist,
        palm_normal: palm_normal(handedness, wrist, index_proximal, pinky_proximal),
        joints,
    })
}

/// Joint source backed by plain arrays, in [`Joint::ALL`] order. A NaN
/// coordinate marks that joint as unresolved.
#[derive(Debug, Clone, Default)]
pub struct FlatJointSource {
    hands: [[Option<Vec3>; JOINT_COUNT]; 2],
}

impl FlatJointSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one hand from `[x, y, z] * JOINT_COUNT` floats. An empty slice
    /// clears the hand (untracked).
    pub fn set_hand(&mut self, hand: Handedness, flat: &[f32]) -> Result<()> {
        let slots = &mut self.hands[hand.index()];
        if flat.is_empty() {
            *slots = [None; JOINT_COUNT];
            return Ok(());
        }
        if flat.len() != FLAT_HAND_LEN {
            return Err(FluxError::JointBufferLength {
                hand: hand.as_str(),
                len: flat.len(),
                expected: FLAT_HAND_LEN,
            });
        }
        for (slot, xyz) in slots.iter_mut().zip(flat.chunks_exact(3)) {
            let p = Vec3::new(xyz[0], xyz[1], xyz[2]);
            *slot = p.is_finite().then_some(p);
        }
        Ok(())
    }

    pub fn set_joint(&mut self, hand: Handedness, joint: Joint, position: Option<Vec3>) {
        self.hands[hand.index()][joint.index()] = position;
    }

    pub fn clear(&mut self, hand: Handedness) {
        self.hands[hand.index()] = [None; JOINT_COUNT];
    }
}

impl JointSource for FlatJointSource {
    fn joint(&self, hand: Handedness, joint: Joint) -> Option<Vec3> {
        self.hands[hand.index()][joint.index()]
    }
}
