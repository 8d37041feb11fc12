use glam::Vec3;

// Shared tuning constants for gesture detection, interaction and simulation.
// Distances are metres (XR reference space), times are milliseconds unless
// the name says otherwise.

// Gesture classification
pub const EXTENSION_MARGIN: f32 = 0.015; // tip must clear the proximal joint by this much
pub const PINCH_ENTER_DISTANCE: f32 = 0.025; // thumb-index distance to start pinching
pub const PINCH_EXIT_DISTANCE: f32 = 0.040; // thumb-index distance to stop pinching
pub const STABILITY_FRAMES: u32 = 8; // consecutive frames before a gesture commits

// Hand pose interpretation
pub const POINTING_MARGIN: f32 = 0.03; // index tip reaches past middle tip by this much
pub const PALM_UP_RESET: f32 = 0.8; // palm-up dot for the two-hand reset
pub const PALM_UP_LEVITATE: f32 = 0.6; // palm-up dot for left-hand levitation

// Two-hand distance smoothing
pub const DISTANCE_SMOOTHING: f32 = 0.1; // EMA weight of the new sample, per frame
pub const DISTANCE_INITIAL: f32 = 0.5;
pub const DISTANCE_MIN: f32 = 0.05;
pub const DISTANCE_MAX: f32 = 1.0;
pub const TOUCHING_DISTANCE: f32 = 0.15;

// Time gates
pub const DUAL_PINCH_WINDOW_MS: f64 = 500.0;
pub const RESET_COOLDOWN_MS: f64 = 2000.0;
pub const RESET_DURATION_SEC: f32 = 2.0;
pub const RESET_RAMP_RATE: f32 = 2.0; // factor reaches 1 after half a second per unit
pub const RESET_DECAY: f32 = 0.95; // per frame once the ramp is over
pub const RESET_FACTOR_EPSILON: f32 = 0.01;
pub const RESET_HOMING: f32 = 3.0;
pub const BEAT_RIPPLE: f32 = 0.1; // reset factor floor on a detected beat

// Attractor presets (strength, radius)
pub const CENTER_PINCH: (f32, f32) = (50.0, 8.0);
pub const CENTER_TOUCH: (f32, f32) = (-30.0, 2.0);
pub const CENTER_AMBIENT_STRENGTH: f32 = 10.0;
pub const CENTER_AMBIENT_RADIUS: f32 = 4.0; // grows by 2 x smoothed distance
pub const LEVITATE: (f32, f32) = (1.0, 8.0);
pub const SINGULARITY: (f32, f32) = (80.0, 8.0);
pub const VORTEX: (f32, f32) = (2.5, 8.0);
pub const BEAM: (f32, f32) = (50.0, 15.0);
pub const ORB: (f32, f32) = (65.0, 8.0);
pub const FREEZE: (f32, f32) = (1.0, 8.0); // damps the whole field; radius only reported
pub const TWIN_ORB: (f32, f32) = (80.0, 8.0);

// Orb growth
pub const ORB_GROWTH_PER_SEC: f32 = 1.5;
pub const ORB_DECAY: f32 = 0.85; // per frame when the right hand releases
pub const TWIN_ORB_GROWTH_PER_SEC: f32 = 1.0;
pub const TWIN_ORB_MAX: f32 = 0.8;
pub const LEFT_ORB_DECAY: f32 = 0.9;

// Scene layout
pub const SCENE_CENTER: [f32; 3] = [0.0, 1.1, 0.0];
pub const INNER_WALL: f32 = 2.0;
pub const OUTER_WALL: f32 = 6.0;
// The walls are springs, not hard limits: with no attractors, settled
// particles stay within this distance outside the inner..outer band.
pub const WALL_TOLERANCE: f32 = 0.75;
pub const BOUND_RADIUS: f32 = 20.0;
pub const MAX_SPEED: f32 = 2.0; // units per frame
pub const DAMPING: f32 = 0.98;

// Spawn shells around the scene center
pub const SHELL_RADII: [f32; 3] = [2.5, 4.0, 5.5];
pub const SHELL_WEIGHTS: [f32; 3] = [0.25, 0.5, 0.25];
pub const SHELL_THICKNESS: f32 = 0.3;

// Containment
pub const STRONG_PULL_RANGE: f32 = 3.0;
pub const HOME_SPRING_FAR: f32 = 0.5;
pub const HOME_SPRING_NEAR: f32 = 0.1;
pub const HOME_SPRING_STRONG: f32 = 3.0;
pub const HOME_SPRING_SETTLE: f32 = 2.0;
pub const INNER_WALL_PUSH: f32 = 8.0;
pub const OUTER_WALL_PULL: f32 = 4.0;

// Turbulence
pub const NOISE_SCALE: f32 = 0.3;
pub const NOISE_SPEED_BASE: f32 = 0.1;
pub const NOISE_SPEED_AUDIO: f32 = 0.5;
pub const NOISE_AMPLITUDE_BASE: f32 = 0.5;
pub const CURL_EPSILON: f32 = 0.1;
pub const AUDIO_LEVEL_SCALE: f32 = 0.5;

// Guards
pub const DISTANCE_EPSILON: f32 = 1e-4;
pub const HEAT_RADIUS: f32 = 0.5;
pub const HEAT_VALUE: f32 = 0.2;

// Audio analysis
pub const FFT_SIZE: usize = 1024;
pub const SAMPLE_RATE_HZ: f32 = 44_100.0;
pub const BASS_BAND_HZ: (f32, f32) = (0.0, 172.0);
pub const MID_BAND_HZ: (f32, f32) = (300.0, 2500.0);
pub const HIGH_BAND_MIN_HZ: f32 = 3875.0; // roughly 4 kHz, first bin 90 at the default fft size
pub const HIGH_BOOST: f32 = 3.0;
pub const BAND_SMOOTHING: f32 = 0.6; // weight of the new reading per analysis tick
pub const BEAT_THRESHOLD_DECAY: f32 = 0.95;
pub const BEAT_RATIO: f32 = 1.3;
pub const BEAT_FLOOR: f32 = 0.3;
pub const BEAT_HOLD_MS: f64 = 100.0;

// Frame pacing
pub const MAX_FRAME_DT_SEC: f32 = 0.1;

#[inline]
pub fn scene_center() -> Vec3 {
    Vec3::from_array(SCENE_CENTER)
}
