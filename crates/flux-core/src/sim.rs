//! CPU force-field integrator.
//!
//! Per particle and frame: curl-noise turbulence, home spring and wall band
//! (skipped near orb-class attractors), every attractor's force law, uniform
//! damping, reset homing, then velocity/position clamps and recovery of
//! non-finite state.

use crate::attractor::{Attractor, AttractorSet};
use crate::audio::AudioBands;
use crate::config::SimParams;
use crate::constants::*;
use crate::forces::{self, ForceInput};
use crate::noise;
use crate::particles::ParticleField;
use glam::Vec3;

/// Per-frame values shared by every particle.
#[derive(Clone, Copy, Debug)]
pub struct StepInputs<'a> {
    pub attractors: &'a [Attractor],
    pub dt: f32,
    pub time: f32,
    /// Audio turbulence drive, see [`AudioBands::level`].
    pub level: f32,
    pub reset_factor: f32,
}

/// One particle's mutable state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSample {
    pub position: Vec3,
    pub velocity: Vec3,
    pub home: Vec3,
    pub heat: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParticleOutcome {
    pub recovered: bool,
    pub strongly_pulled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub recovered: usize,
    pub strongly_pulled: usize,
}

/// Containment is skipped while an orb-class attractor is close by.
pub fn is_strongly_pulled(params: &SimParams, attractors: &[Attractor], position: Vec3) -> bool {
    attractors
        .iter()
        .filter(|a| a.mode.is_strong_pull())
        .flat_map(Attractor::anchors)
        .any(|anchor| anchor.length() > 0.1 && anchor.distance(position) < params.strong_pull_range)
}

/// Spring toward home plus the inner/outer wall band around the scene center.
pub fn containment(params: &SimParams, position: Vec3, home: Vec3, dt: f32) -> Vec3 {
    let mut delta = Vec3::ZERO;
    let to_home = home - position;
    let home_dist = to_home.length();
    if home_dist > HOME_SPRING_FAR {
        delta += to_home * HOME_SPRING_STRONG * dt;
    } else if home_dist > HOME_SPRING_NEAR {
        delta += to_home * HOME_SPRING_SETTLE * dt;
    }

    let from_center = position - params.center;
    let dist = from_center.length() + 0.001;
    let dir = from_center / dist;
    if dist < params.inner_wall {
        delta += dir * (params.inner_wall - dist) * INNER_WALL_PUSH * dt;
    } else if dist > params.outer_wall {
        delta -= dir * (dist - params.outer_wall) * OUTER_WALL_PULL * dt;
    }
    delta
}

/// Integrate one particle.
pub fn integrate(params: &SimParams, inputs: &StepInputs, p: ParticleSample) -> (ParticleSample, ParticleOutcome) {
    let ParticleSample {
        mut position,
        mut velocity,
        home,
        mut heat,
    } = p;
    let dt = inputs.dt;

    let speed = NOISE_SPEED_BASE + inputs.level * NOISE_SPEED_AUDIO;
    let amplitude = params.noise_amplitude + inputs.level;
    let flow = noise::curl(position * params.noise_scale + Vec3::splat(inputs.time * speed));
    velocity += flow * amplitude * dt;

    let strongly_pulled = is_strongly_pulled(params, inputs.attractors, position);
    if !strongly_pulled {
        velocity += containment(params, position, home, dt);
    }

    for attractor in inputs.attractors {
        let out = forces::apply(&ForceInput {
            position,
            velocity,
            attractor,
            dt,
            time: inputs.time,
        });
        velocity = velocity * out.damping + out.delta;
        heat = heat.max(out.heat);
    }

    velocity *= params.damping;

    if inputs.reset_factor > RESET_FACTOR_EPSILON {
        velocity += (home - position) * inputs.reset_factor * RESET_HOMING * dt;
    }

    let recovered = (
        ParticleSample {
            position: home,
            velocity: Vec3::ZERO,
            home,
            heat: 0.0,
        },
        ParticleOutcome {
            recovered: true,
            strongly_pulled,
        },
    );
    let speed = velocity.length();
    if !speed.is_finite() {
        return recovered;
    }
    if speed > params.max_speed {
        velocity *= params.max_speed / speed;
    }

    position += velocity;
    let reach = position.length();
    if reach > params.bound_radius {
        position *= params.bound_radius / reach;
    }
    if !position.is_finite() {
        return recovered;
    }

    heat = (heat - dt).max(0.0);
    (
        ParticleSample {
            position,
            velocity,
            home,
            heat,
        },
        ParticleOutcome {
            recovered: false,
            strongly_pulled,
        },
    )
}

/// Everything the simulator owns between frames. Composed by whoever runs
/// the frame loop; there is no global instance.
pub struct SimulationContext {
    pub particles: ParticleField,
    pub attractors: AttractorSet,
    pub audio: AudioBands,
    pub reset_factor: f32,
    pub time: f32,
}

impl SimulationContext {
    pub fn new(particles: ParticleField) -> Self {
        Self {
            particles,
            attractors: AttractorSet::new(),
            audio: AudioBands::default(),
            reset_factor: 0.0,
            time: 0.0,
        }
    }

    /// Advance every particle by one frame of `dt` seconds.
    pub fn step(&mut self, params: &SimParams, dt: f32) -> StepStats {
        self.time += dt;
        let inputs = StepInputs {
            attractors: &self.attractors,
            dt,
            time: self.time,
            level: self.audio.level(),
            reset_factor: self.reset_factor,
        };
        let field = &mut self.particles;
        let mut stats = StepStats::default();
        for i in 0..field.positions.len() {
            let sample = ParticleSample {
                position: field.positions[i],
                velocity: field.velocities[i],
                home: field.homes[i],
                heat: field.heat[i],
            };
            let (next, outcome) = integrate(params, &inputs, sample);
            field.positions[i] = next.position;
            field.velocities[i] = next.velocity;
            field.heat[i] = next.heat;
            stats.recovered += outcome.recovered as usize;
            stats.strongly_pulled += outcome.strongly_pulled as usize;
        }
        if stats.recovered > 0 {
            log::warn!(
                "[sim] recovered {} particles from non-finite state",
                stats.recovered
            );
        }
        stats
    }
}
