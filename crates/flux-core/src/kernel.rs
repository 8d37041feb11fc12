//! Compute kernel generation and the GPU-side data layouts.
//!
//! The kernel is assembled from the noise prelude in `shaders/noise.wgsl` and
//! the WGSL bodies in the force table, so it integrates the same laws as
//! [`crate::sim::integrate`].

use crate::attractor::{Attractor, AttractorMode};
use crate::config::SimParams;
use crate::constants::*;
use crate::forces::FORCE_LAWS;
use crate::particles::ParticleField;
use crate::sim::SimulationContext;
use std::fmt::Write as _;

pub static NOISE_WGSL: &str = include_str!("../shaders/noise.wgsl");

/// One particle: `position.w` carries heat.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuParticle {
    pub position: [f32; 4],
    pub velocity: [f32; 4],
    pub home: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuAttractor {
    pub position: [f32; 3],
    pub strength: f32,
    pub direction: [f32; 3],
    pub radius: f32,
    pub partner: [f32; 3],
    pub mode: u32,
    pub orb_size: f32,
    pub partner_orb_size: f32,
    pub has_direction: u32,
    pub has_partner: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimUniforms {
    pub center: [f32; 3],
    pub inner_wall: f32,
    pub outer_wall: f32,
    pub max_speed: f32,
    pub bound_radius: f32,
    pub damping: f32,
    pub time: f32,
    pub dt: f32,
    pub audio_level: f32,
    pub reset_factor: f32,
    pub noise_amplitude: f32,
    pub strong_pull_range: f32,
    pub particle_count: u32,
    pub attractor_count: u32,
}

impl From<&Attractor> for GpuAttractor {
    fn from(a: &Attractor) -> Self {
        Self {
            position: a.position.to_array(),
            strength: a.strength,
            direction: a.direction.unwrap_or_default().to_array(),
            radius: a.radius,
            partner: a.partner.unwrap_or(a.position).to_array(),
            mode: a.mode as u32,
            orb_size: a.orb_size,
            partner_orb_size: a.partner_orb_size,
            has_direction: a.direction.is_some() as u32,
            has_partner: a.partner.is_some() as u32,
        }
    }
}

pub fn pack_particles(field: &ParticleField) -> Vec<GpuParticle> {
    (0..field.len())
        .map(|i| {
            let p = field.positions[i];
            let v = field.velocities[i];
            let h = field.homes[i];
            GpuParticle {
                position: [p.x, p.y, p.z, field.heat[i]],
                velocity: [v.x, v.y, v.z, 0.0],
                home: [h.x, h.y, h.z, 0.0],
            }
        })
        .collect()
}

/// Copy kernel output back into the CPU-side field.
pub fn unpack_particles(gpu: &[GpuParticle], field: &mut ParticleField) {
    for (i, p) in gpu.iter().enumerate().take(field.len()) {
        field.positions[i] = glam::Vec3::new(p.position[0], p.position[1], p.position[2]);
        field.velocities[i] = glam::Vec3::new(p.velocity[0], p.velocity[1], p.velocity[2]);
        field.heat[i] = p.position[3];
    }
}

pub fn uniforms(params: &SimParams, ctx: &SimulationContext, dt: f32) -> SimUniforms {
    SimUniforms {
        center: params.center.to_array(),
        inner_wall: params.inner_wall,
        outer_wall: params.outer_wall,
        max_speed: params.max_speed,
        bound_radius: params.bound_radius,
        damping: params.damping,
        time: ctx.time,
        dt,
        audio_level: ctx.audio.level(),
        reset_factor: ctx.reset_factor,
        noise_amplitude: params.noise_amplitude,
        strong_pull_range: params.strong_pull_range,
        particle_count: ctx.particles.len() as u32,
        attractor_count: ctx.attractors.len() as u32,
    }
}

fn lit(v: f32) -> String {
    format!("{:?}", v)
}

const LAYOUT_WGSL: &str = r#"struct Particle {
    position: vec4<f32>,
    velocity: vec4<f32>,
    home: vec4<f32>,
}

struct Attractor {
    position: vec3<f32>,
    strength: f32,
    direction: vec3<f32>,
    radius: f32,
    partner: vec3<f32>,
    mode: u32,
    orb_size: f32,
    partner_orb_size: f32,
    has_direction: u32,
    has_partner: u32,
}

struct SimUniforms {
    center: vec3<f32>,
    inner_wall: f32,
    outer_wall: f32,
    max_speed: f32,
    bound_radius: f32,
    damping: f32,
    time: f32,
    dt: f32,
    audio_level: f32,
    reset_factor: f32,
    noise_amplitude: f32,
    strong_pull_range: f32,
    particle_count: u32,
    attractor_count: u32,
}

struct Force {
    delta: vec3<f32>,
    damping: f32,
    heat: f32,
}

@group(0) @binding(0) var<uniform> u: SimUniforms;
@group(0) @binding(1) var<storage, read> src: array<Particle>;
@group(0) @binding(2) var<storage, read_write> dst: array<Particle>;
@group(0) @binding(3) var<storage, read> attractors: array<Attractor>;

fn no_force() -> Force {
    return Force(vec3<f32>(0.0), 1.0, 0.0);
}

fn finite3(v: vec3<f32>) -> bool {
    let bits = bitcast<vec3<u32>>(v) & vec3<u32>(0x7f800000u);
    return all(bits != vec3<u32>(0x7f800000u));
}
"#;

fn constants_wgsl(params: &SimParams) -> String {
    let mut out = String::new();
    let consts = [
        ("CURL_EPSILON", CURL_EPSILON),
        ("NOISE_SCALE", params.noise_scale),
        ("NOISE_SPEED_BASE", NOISE_SPEED_BASE),
        ("NOISE_SPEED_AUDIO", NOISE_SPEED_AUDIO),
        ("HOME_SPRING_FAR", HOME_SPRING_FAR),
        ("HOME_SPRING_NEAR", HOME_SPRING_NEAR),
        ("HOME_SPRING_STRONG", HOME_SPRING_STRONG),
        ("HOME_SPRING_SETTLE", HOME_SPRING_SETTLE),
        ("INNER_WALL_PUSH", INNER_WALL_PUSH),
        ("OUTER_WALL_PULL", OUTER_WALL_PULL),
        ("RESET_FACTOR_EPSILON", RESET_FACTOR_EPSILON),
        ("RESET_HOMING", RESET_HOMING),
    ];
    for (name, value) in consts {
        let _ = writeln!(out, "const {name}: f32 = {};", lit(value));
    }
    out
}

fn strong_pull_condition() -> String {
    AttractorMode::ALL
        .iter()
        .filter(|m| m.is_strong_pull())
        .map(|m| format!("a.mode == {}u", *m as u32))
        .collect::<Vec<_>>()
        .join(" || ")
}

fn dispatch_wgsl() -> String {
    let mut out = String::new();
    for law in FORCE_LAWS.iter() {
        let name = law.mode.as_str().replace('-', "_");
        let _ = write!(
            out,
            "fn force_{name}(a: Attractor, pos: vec3<f32>, vel: vec3<f32>) -> Force {{\n{}}}\n\n",
            (law.wgsl)()
        );
    }
    out.push_str("fn apply_force(a: Attractor, pos: vec3<f32>, vel: vec3<f32>) -> Force {\n    switch a.mode {\n");
    for law in FORCE_LAWS.iter() {
        let name = law.mode.as_str().replace('-', "_");
        let _ = writeln!(
            out,
            "        case {}u: {{ return force_{name}(a, pos, vel); }}",
            law.mode as u32
        );
    }
    out.push_str("        default: { return no_force(); }\n    }\n}\n");
    out
}

fn integrator_wgsl(workgroup_size: u32) -> String {
    format!(
        r#"
fn strongly_pulled(pos: vec3<f32>) -> bool {{
    for (var k = 0u; k < u.attractor_count; k = k + 1u) {{
        let a = attractors[k];
        if (!({strong})) {{ continue; }}
        if (length(a.position) > 0.1 && distance(a.position, pos) < u.strong_pull_range) {{ return true; }}
        if (a.has_partner != 0u && length(a.partner) > 0.1 && distance(a.partner, pos) < u.strong_pull_range) {{ return true; }}
    }}
    return false;
}}

fn containment(pos: vec3<f32>, home: vec3<f32>) -> vec3<f32> {{
    var delta = vec3<f32>(0.0);
    let to_home = home - pos;
    let home_dist = length(to_home);
    if (home_dist > HOME_SPRING_FAR) {{
        delta += to_home * HOME_SPRING_STRONG * u.dt;
    }} else if (home_dist > HOME_SPRING_NEAR) {{
        delta += to_home * HOME_SPRING_SETTLE * u.dt;
    }}
    let from_center = pos - u.center;
    let dist = length(from_center) + 0.001;
    let dir = from_center / dist;
    if (dist < u.inner_wall) {{
        delta += dir * (u.inner_wall - dist) * INNER_WALL_PUSH * u.dt;
    }} else if (dist > u.outer_wall) {{
        delta -= dir * (dist - u.outer_wall) * OUTER_WALL_PULL * u.dt;
    }}
    return delta;
}}

@compute @workgroup_size({workgroup_size})
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {{
    let idx = gid.x;
    if (idx >= u.particle_count) {{
        return;
    }}
    let p = src[idx];
    var pos = p.position.xyz;
    var vel = p.velocity.xyz;
    let home = p.home.xyz;
    var heat = p.position.w;

    let speed = NOISE_SPEED_BASE + u.audio_level * NOISE_SPEED_AUDIO;
    let amplitude = u.noise_amplitude + u.audio_level;
    vel += curl_noise(pos * NOISE_SCALE + vec3<f32>(u.time * speed)) * amplitude * u.dt;

    if (!strongly_pulled(pos)) {{
        vel += containment(pos, home);
    }}

    for (var k = 0u; k < u.attractor_count; k = k + 1u) {{
        let f = apply_force(attractors[k], pos, vel);
        vel = vel * f.damping + f.delta;
        heat = max(heat, f.heat);
    }}

    vel *= u.damping;

    if (u.reset_factor > RESET_FACTOR_EPSILON) {{
        vel += (home - pos) * u.reset_factor * RESET_HOMING * u.dt;
    }}

    var ok = finite3(vel);
    if (ok) {{
        let vel_mag = length(vel);
        if (vel_mag > u.max_speed) {{
            vel = vel * (u.max_speed / vel_mag);
        }}
        pos += vel;
        let reach = length(pos);
        if (reach > u.bound_radius) {{
            pos = pos * (u.bound_radius / reach);
        }}
        ok = finite3(pos);
    }}
    if (!ok) {{
        pos = home;
        vel = vec3<f32>(0.0);
        heat = 0.0;
    }}
    heat = max(heat - u.dt, 0.0);

    dst[idx] = Particle(vec4<f32>(pos, heat), vec4<f32>(vel, 0.0), p.home);
}}
"#,
        strong = strong_pull_condition(),
        workgroup_size = workgroup_size,
    )
}

/// Full WGSL source of the integrator for `params`.
pub fn build_kernel(params: &SimParams) -> String {
    let mut src = String::with_capacity(16 * 1024);
    src.push_str(LAYOUT_WGSL);
    src.push('\n');
    src.push_str(&constants_wgsl(params));
    src.push('\n');
    src.push_str(NOISE_WGSL);
    src.push('\n');
    src.push_str(&dispatch_wgsl());
    src.push_str(&integrator_wgsl(params.workgroup_size));
    src
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_layouts_have_expected_sizes() {
        assert_eq!(std::mem::size_of::<GpuParticle>(), 48);
        assert_eq!(std::mem::size_of::<GpuAttractor>(), 64);
        assert_eq!(std::mem::size_of::<SimUniforms>(), 64);
    }
}
