use crate::config::SpawnParams;
use crate::error::{FluxError, Result};
use glam::Vec3;
use rand::prelude::*;

/// Fixed particle pool in structure-of-arrays layout. Particles are never
/// destroyed; a reset pulls them back to `homes`.
#[derive(Clone, Debug)]
pub struct ParticleField {
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    pub homes: Vec<Vec3>,
    /// Colour tag written by singularity and paint, decays by dt per second.
    pub heat: Vec<f32>,
}

impl ParticleField {
    /// Pool resting at the given home positions.
    pub fn from_homes(homes: Vec<Vec3>) -> Result<Self> {
        if homes.is_empty() {
            return Err(FluxError::EmptyParticlePool);
        }
        let n = homes.len();
        Ok(Self {
            positions: homes.clone(),
            velocities: vec![Vec3::ZERO; n],
            homes,
            heat: vec![0.0; n],
        })
    }

    /// Scatter `params.count` particles over thin concentric shells.
    pub fn spawn(params: &SpawnParams) -> Result<Self> {
        if params.count == 0 {
            return Err(FluxError::EmptyParticlePool);
        }
        let total: f32 = params.shell_weights.iter().sum();
        if !(total > 0.0) {
            return Err(FluxError::InvalidParameter {
                name: "shell_weights",
                reason: "must sum to a positive value",
            });
        }
        let mut rng = StdRng::seed_from_u64(params.seed);
        let homes = (0..params.count)
            .map(|_| {
                let pick = rng.gen::<f32>() * total;
                let mut acc = 0.0;
                let mut shell = params.shell_radii.len() - 1;
                for (i, w) in params.shell_weights.iter().enumerate() {
                    acc += w;
                    if pick < acc {
                        shell = i;
                        break;
                    }
                }
                let radius = params.shell_radii[shell]
                    + (rng.gen::<f32>() - 0.5) * params.shell_thickness;
                params.center + random_unit(&mut rng) * radius
            })
            .collect();
        log::info!(
            "[particles] spawned {} particles seed={}",
            params.count,
            params.seed
        );
        Self::from_homes(homes)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Snap every particle home at once.
    pub fn snap_home(&mut self) {
        self.positions.copy_from_slice(&self.homes);
        self.velocities.fill(Vec3::ZERO);
        self.heat.fill(0.0);
    }

    /// Positions as flat `[x, y, z]` floats for a renderer.
    pub fn write_positions(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.positions.len() * 3);
        for p in &self.positions {
            out.extend_from_slice(&p.to_array());
        }
    }
}

// Uniform direction on the unit sphere.
fn random_unit(rng: &mut StdRng) -> Vec3 {
    let z = rng.gen_range(-1.0f32..=1.0);
    let theta = rng.gen_range(0.0f32..std::f32::consts::TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}
