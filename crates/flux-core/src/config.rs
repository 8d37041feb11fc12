//! Tunable parameter sets, each defaulting to the values in `constants`.

use crate::constants::*;
use crate::error::{FluxError, Result};
use glam::Vec3;

#[derive(Clone, Debug)]
pub struct GestureParams {
    pub extension_margin: f32,
    pub pinch_enter: f32,
    pub pinch_exit: f32,
    pub stability_frames: u32,
}

impl Default for GestureParams {
    fn default() -> Self {
        Self {
            extension_margin: EXTENSION_MARGIN,
            pinch_enter: PINCH_ENTER_DISTANCE,
            pinch_exit: PINCH_EXIT_DISTANCE,
            stability_frames: STABILITY_FRAMES,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InteractionParams {
    pub pointing_margin: f32,
    pub palm_up_reset: f32,
    pub palm_up_levitate: f32,
    pub distance_smoothing: f32,
    pub touching_distance: f32,
    pub dual_pinch_window_ms: f64,
    pub reset_cooldown_ms: f64,
    pub reset_duration_sec: f32,
    pub center: Vec3,
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            pointing_margin: POINTING_MARGIN,
            palm_up_reset: PALM_UP_RESET,
            palm_up_levitate: PALM_UP_LEVITATE,
            distance_smoothing: DISTANCE_SMOOTHING,
            touching_distance: TOUCHING_DISTANCE,
            dual_pinch_window_ms: DUAL_PINCH_WINDOW_MS,
            reset_cooldown_ms: RESET_COOLDOWN_MS,
            reset_duration_sec: RESET_DURATION_SEC,
            center: scene_center(),
        }
    }
}

/// Integrator settings shared by the CPU path and the generated kernel.
#[derive(Clone, Debug)]
pub struct SimParams {
    pub center: Vec3,
    /// Soft containment band around `center`. Idle particles settle within
    /// [`WALL_TOLERANCE`] of `inner_wall..=outer_wall`.
    pub inner_wall: f32,
    pub outer_wall: f32,
    pub max_speed: f32,
    pub bound_radius: f32,
    pub damping: f32,
    pub noise_scale: f32,
    pub noise_amplitude: f32,
    pub strong_pull_range: f32,
    pub workgroup_size: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            center: scene_center(),
            inner_wall: INNER_WALL,
            outer_wall: OUTER_WALL,
            max_speed: MAX_SPEED,
            bound_radius: BOUND_RADIUS,
            damping: DAMPING,
            noise_scale: NOISE_SCALE,
            noise_amplitude: NOISE_AMPLITUDE_BASE,
            strong_pull_range: STRONG_PULL_RANGE,
            workgroup_size: 64,
        }
    }
}

impl SimParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.inner_wall > 0.0 && self.inner_wall < self.outer_wall) {
            return Err(FluxError::InvalidParameter {
                name: "inner_wall",
                reason: "must be positive and below outer_wall",
            });
        }
        if self.outer_wall >= self.bound_radius {
            return Err(FluxError::InvalidParameter {
                name: "outer_wall",
                reason: "must sit inside bound_radius",
            });
        }
        if !(self.max_speed > 0.0) {
            return Err(FluxError::InvalidParameter {
                name: "max_speed",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(FluxError::InvalidParameter {
                name: "damping",
                reason: "must be within 0..=1",
            });
        }
        if self.workgroup_size == 0 || self.workgroup_size > 256 {
            return Err(FluxError::InvalidParameter {
                name: "workgroup_size",
                reason: "must be within 1..=256",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct AudioParams {
    pub fft_size: usize,
    pub sample_rate_hz: f32,
    pub smoothing: f32,
    pub high_boost: f32,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            fft_size: FFT_SIZE,
            sample_rate_hz: SAMPLE_RATE_HZ,
            smoothing: BAND_SMOOTHING,
            high_boost: HIGH_BOOST,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpawnParams {
    pub count: usize,
    pub seed: u64,
    pub center: Vec3,
    pub shell_radii: [f32; 3],
    pub shell_weights: [f32; 3],
    pub shell_thickness: f32,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            count: 16_384,
            seed: 42,
            center: scene_center(),
            shell_radii: SHELL_RADII,
            shell_weights: SHELL_WEIGHTS,
            shell_thickness: SHELL_THICKNESS,
        }
    }
}

/// Every parameter set the frame pipeline needs.
#[derive(Clone, Debug, Default)]
pub struct FluxConfig {
    pub gesture: GestureParams,
    pub interaction: InteractionParams,
    pub sim: SimParams,
    pub audio: AudioParams,
    pub spawn: SpawnParams,
}
