//! Force laws, one per [`AttractorMode`].
//!
//! Every entry carries the CPU implementation and the WGSL body of the same
//! law. Both are written against the tuning constants below, so the two
//! integrators cannot drift apart. A law never mutates state itself: it
//! reports a velocity delta, a damping factor and an optional heat tag, and
//! the integrator applies `vel = vel * damping + delta`.

use crate::attractor::{Attractor, AttractorMode};
use crate::constants::{DISTANCE_EPSILON, HEAT_RADIUS, HEAT_VALUE};
use crate::noise;
use glam::Vec3;

// Center (ambient pull / touch push)
pub const CENTER_FORCE_SCALE: f32 = 0.01;
pub const CENTER_FORCE_MAX: f32 = 0.5;
pub const CENTER_SWIRL: f32 = 2.0;
pub const CENTER_SWIRL_MIN_STRENGTH: f32 = 20.0;

// Levitate (global)
pub const LEVITATE_DAMPING: f32 = 0.92;
pub const LEVITATE_LIFT: f32 = 4.0;
pub const LEVITATE_SWAY_SCALE: f32 = 0.2;
pub const LEVITATE_SWAY_SPEED: f32 = 0.3;
pub const LEVITATE_SWAY: f32 = 0.8;
pub const LEVITATE_DRIFT: f32 = 1.2;

// Singularity
pub const SINGULARITY_SOFTENING: f32 = 0.1;
pub const SINGULARITY_GRAVITY: f32 = 0.1;
pub const SINGULARITY_SWIRL: f32 = 8.0;
pub const SINGULARITY_FLATTEN: f32 = 2.0;

// Vortex (global)
pub const VORTEX_SWIRL: f32 = 8.0;

// Freeze
pub const FREEZE_DAMPING: f32 = 0.1;

// Beam
pub const BEAM_CORE: f32 = 0.1;
pub const BEAM_AURA: f32 = 2.0;
pub const BEAM_PROPEL_PER_STRENGTH: f32 = 0.3;
pub const BEAM_FOCUS: f32 = 30.0;
pub const BEAM_AURA_PULL: f32 = 3.0;
pub const BEAM_SUCTION_RANGE: f32 = 3.0;
pub const BEAM_SUCTION_PER_STRENGTH: f32 = 0.4;

// Orb
pub const ORB_BASE_RADIUS: f32 = 0.15;
pub const ORB_GROWTH_RADIUS: f32 = 0.5;
pub const ORB_PULL: f32 = 0.12;
pub const ORB_SURFACE_PUSH: f32 = 10.0;
pub const ORB_SURFACE_SWIRL: f32 = 3.0;

// Twin orb
pub const TWIN_DAMPING: f32 = 0.85;
pub const TWIN_GROWTH_RADIUS: f32 = 0.4;
pub const TWIN_MERGE_DISTANCE: f32 = 0.6;
pub const TWIN_MERGE_SHARE: f32 = 0.75;
pub const TWIN_ORBIT: f32 = 2.0;
pub const TWIN_PULL: f32 = 0.2;
pub const TWIN_SURFACE_PUSH: f32 = 5.0;

// Auxiliary modes
pub const TORNADO_SPIN: f32 = 5.0;
pub const TORNADO_LIFT: f32 = 2.0;
pub const TORNADO_PULL: f32 = 2.0;
pub const FOUNTAIN_SPRAY: f32 = 12.0;
pub const FOUNTAIN_SPREAD: f32 = 2.0;
pub const PAINT_HEAT: f32 = 1.0;

pub struct ForceInput<'a> {
    pub position: Vec3,
    pub velocity: Vec3,
    pub attractor: &'a Attractor,
    pub dt: f32,
    pub time: f32,
}

impl ForceInput<'_> {
    /// Vector from the particle to the attractor and its guarded length.
    fn offset(&self) -> (Vec3, f32) {
        let to = self.attractor.position - self.position;
        (to, to.length() + DISTANCE_EPSILON)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceOutput {
    pub delta: Vec3,
    pub damping: f32,
    pub heat: f32,
}

impl Default for ForceOutput {
    fn default() -> Self {
        Self {
            delta: Vec3::ZERO,
            damping: 1.0,
            heat: 0.0,
        }
    }
}

impl ForceOutput {
    fn push(delta: Vec3) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }
}

pub struct ForceLaw {
    pub mode: AttractorMode,
    pub apply: fn(&ForceInput) -> ForceOutput,
    /// Body of `fn force_<mode>(a: Attractor, pos: vec3<f32>, vel: vec3<f32>) -> Force`.
    /// `u.dt` and `u.time` are in scope.
    pub wgsl: fn() -> String,
}

/// Indexed by `AttractorMode as usize`.
pub const FORCE_LAWS: [ForceLaw; 11] = [
    ForceLaw {
        mode: AttractorMode::Center,
        apply: center,
        wgsl: center_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Levitate,
        apply: levitate,
        wgsl: levitate_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Singularity,
        apply: singularity,
        wgsl: singularity_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Vortex,
        apply: vortex,
        wgsl: vortex_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Freeze,
        apply: freeze,
        wgsl: freeze_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Beam,
        apply: beam,
        wgsl: beam_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Orb,
        apply: orb,
        wgsl: orb_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::TwinOrb,
        apply: twin_orb,
        wgsl: twin_orb_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Tornado,
        apply: tornado,
        wgsl: tornado_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Fountain,
        apply: fountain,
        wgsl: fountain_wgsl,
    },
    ForceLaw {
        mode: AttractorMode::Paint,
        apply: paint,
        wgsl: paint_wgsl,
    },
];

pub fn law(mode: AttractorMode) -> &'static ForceLaw {
    &FORCE_LAWS[mode as usize]
}

pub fn apply(input: &ForceInput) -> ForceOutput {
    (law(input.attractor.mode).apply)(input)
}

// WGSL float literal.
fn lit(v: f32) -> String {
    format!("{:?}", v)
}

fn eps() -> String {
    lit(DISTANCE_EPSILON)
}

// Horizontal swirl around the world up axis.
fn swirl_xz(to: Vec3) -> Vec3 {
    to.cross(Vec3::Y)
}

fn center(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let (to, d) = i.offset();
    if a.radius <= 0.0 || d >= a.radius {
        return ForceOutput::default();
    }
    let falloff = 1.0 - d / a.radius;
    let force = (a.strength * falloff * CENTER_FORCE_SCALE).clamp(-CENTER_FORCE_MAX, CENTER_FORCE_MAX);
    let mut delta = to / d * force * i.dt;
    if a.strength.abs() > CENTER_SWIRL_MIN_STRENGTH {
        delta += swirl_xz(to / d) * CENTER_SWIRL * i.dt;
    }
    ForceOutput::push(delta)
}

fn center_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    let to_a = a.position - pos;
    let d = length(to_a) + {eps};
    if (a.radius <= 0.0 || d >= a.radius) {{ return f; }}
    let falloff = 1.0 - d / a.radius;
    let force_k = clamp(a.strength * falloff * {scale}, -{max}, {max});
    f.delta = to_a / d * force_k * u.dt;
    if (abs(a.strength) > {swirl_min}) {{
        f.delta += cross(to_a / d, vec3<f32>(0.0, 1.0, 0.0)) * {swirl} * u.dt;
    }}
    return f;
"#,
        eps = eps(),
        scale = lit(CENTER_FORCE_SCALE),
        max = lit(CENTER_FORCE_MAX),
        swirl_min = lit(CENTER_SWIRL_MIN_STRENGTH),
        swirl = lit(CENTER_SWIRL),
    )
}

fn levitate(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let mut delta = Vec3::ZERO;
    delta.y += (a.position.y - i.position.y) * LEVITATE_LIFT * i.dt;
    let sway = noise::curl(i.position * LEVITATE_SWAY_SCALE + Vec3::splat(i.time * LEVITATE_SWAY_SPEED));
    delta += sway * LEVITATE_SWAY * i.dt;
    let mut out = i.position - a.position;
    out.y = 0.0;
    delta += out.normalize_or_zero() * LEVITATE_DRIFT * a.strength * i.dt;
    ForceOutput {
        delta,
        damping: LEVITATE_DAMPING,
        heat: 0.0,
    }
}

fn levitate_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    f.damping = {damping};
    f.delta.y = (a.position.y - pos.y) * {lift} * u.dt;
    let sway = curl_noise(pos * {sway_scale} + vec3<f32>(u.time * {sway_speed}));
    f.delta += sway * {sway} * u.dt;
    var spread_dir = pos - a.position;
    spread_dir.y = 0.0;
    f.delta += safe_normalize(spread_dir) * {drift} * a.strength * u.dt;
    return f;
"#,
        damping = lit(LEVITATE_DAMPING),
        lift = lit(LEVITATE_LIFT),
        sway_scale = lit(LEVITATE_SWAY_SCALE),
        sway_speed = lit(LEVITATE_SWAY_SPEED),
        sway = lit(LEVITATE_SWAY),
        drift = lit(LEVITATE_DRIFT),
    )
}

fn singularity(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let (to, d) = i.offset();
    if d >= a.radius {
        return ForceOutput::default();
    }
    let dir = to / d;
    let gravity = a.strength / (d * d + SINGULARITY_SOFTENING) * SINGULARITY_GRAVITY;
    let mut delta = dir * gravity * i.dt;
    delta += swirl_xz(dir) * (SINGULARITY_SWIRL / (d + 0.2)) * i.dt;
    delta.y += to.y * SINGULARITY_FLATTEN * i.dt;
    ForceOutput {
        delta,
        damping: 1.0,
        heat: if d < HEAT_RADIUS { HEAT_VALUE } else { 0.0 },
    }
}

fn singularity_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    let to_a = a.position - pos;
    let d = length(to_a) + {eps};
    if (d >= a.radius) {{ return f; }}
    let dir = to_a / d;
    let gravity = a.strength / (d * d + {soft}) * {gravity};
    f.delta = dir * gravity * u.dt;
    f.delta += cross(dir, vec3<f32>(0.0, 1.0, 0.0)) * ({swirl} / (d + 0.2)) * u.dt;
    f.delta.y += to_a.y * {flatten} * u.dt;
    if (d < {heat_radius}) {{ f.heat = {heat}; }}
    return f;
"#,
        eps = eps(),
        soft = lit(SINGULARITY_SOFTENING),
        gravity = lit(SINGULARITY_GRAVITY),
        swirl = lit(SINGULARITY_SWIRL),
        flatten = lit(SINGULARITY_FLATTEN),
        heat_radius = lit(HEAT_RADIUS),
        heat = lit(HEAT_VALUE),
    )
}

fn vortex(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let (to, d) = i.offset();
    let mut delta = to / d * a.strength * i.dt;
    let swirl = Vec3::new(-to.z, 0.0, to.x);
    delta += swirl / (swirl.length() + DISTANCE_EPSILON) * VORTEX_SWIRL * i.dt;
    ForceOutput::push(delta)
}

fn vortex_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    let to_a = a.position - pos;
    let d = length(to_a) + {eps};
    f.delta = to_a / d * a.strength * u.dt;
    let swirl = vec3<f32>(-to_a.z, 0.0, to_a.x);
    f.delta += swirl / (length(swirl) + {eps}) * {swirl} * u.dt;
    return f;
"#,
        eps = eps(),
        swirl = lit(VORTEX_SWIRL),
    )
}

// Global: a fist stills the whole field, wherever the particle is.
fn freeze(_: &ForceInput) -> ForceOutput {
    ForceOutput {
        damping: FREEZE_DAMPING,
        ..ForceOutput::default()
    }
}

fn freeze_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    f.damping = {damping};
    return f;
"#,
        damping = lit(FREEZE_DAMPING),
    )
}

fn beam(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let dir = a.direction.unwrap_or(Vec3::NEG_Z);
    let rel = i.position - a.position;
    let along = rel.dot(dir);
    let mut delta = Vec3::ZERO;
    if along > 0.0 {
        if along < a.radius {
            let radial = rel - dir * along;
            let r = radial.length();
            if r < BEAM_CORE {
                delta += dir * a.strength * BEAM_PROPEL_PER_STRENGTH * i.dt;
                delta -= radial * BEAM_FOCUS * i.dt;
            } else if r < BEAM_AURA {
                delta -= radial * BEAM_AURA_PULL * i.dt;
            }
        }
    } else {
        let tip = rel.length();
        if tip < BEAM_SUCTION_RANGE {
            delta -= rel / (tip + DISTANCE_EPSILON) * a.strength * BEAM_SUCTION_PER_STRENGTH * i.dt;
        }
    }
    ForceOutput::push(delta)
}

fn beam_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    var dir = vec3<f32>(0.0, 0.0, -1.0);
    if (a.has_direction != 0u) {{ dir = a.direction; }}
    let rel = pos - a.position;
    let along = dot(rel, dir);
    if (along > 0.0) {{
        if (along < a.radius) {{
            let radial = rel - dir * along;
            let r = length(radial);
            if (r < {core}) {{
                f.delta += dir * a.strength * {propel} * u.dt;
                f.delta -= radial * {focus} * u.dt;
            }} else if (r < {aura}) {{
                f.delta -= radial * {aura_pull} * u.dt;
            }}
        }}
    }} else {{
        let tip = length(rel);
        if (tip < {suction_range}) {{
            f.delta -= rel / (tip + {eps}) * a.strength * {suction} * u.dt;
        }}
    }}
    return f;
"#,
        eps = eps(),
        core = lit(BEAM_CORE),
        aura = lit(BEAM_AURA),
        propel = lit(BEAM_PROPEL_PER_STRENGTH),
        focus = lit(BEAM_FOCUS),
        aura_pull = lit(BEAM_AURA_PULL),
        suction_range = lit(BEAM_SUCTION_RANGE),
        suction = lit(BEAM_SUCTION_PER_STRENGTH),
    )
}

fn orb(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let (to, d) = i.offset();
    let dir = to / d;
    let surface = ORB_BASE_RADIUS + a.orb_size * ORB_GROWTH_RADIUS;
    let delta = if d > surface {
        dir * (a.strength / (d + 0.4)) * ORB_PULL * i.dt
    } else {
        -dir * (surface - d) * ORB_SURFACE_PUSH * i.dt + swirl_xz(dir) * ORB_SURFACE_SWIRL * i.dt
    };
    ForceOutput::push(delta)
}

fn orb_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    let to_a = a.position - pos;
    let d = length(to_a) + {eps};
    let dir = to_a / d;
    let surface = {base} + a.orb_size * {growth};
    if (d > surface) {{
        f.delta = dir * (a.strength / (d + 0.4)) * {pull} * u.dt;
    }} else {{
        f.delta = -dir * (surface - d) * {push} * u.dt
            + cross(dir, vec3<f32>(0.0, 1.0, 0.0)) * {swirl} * u.dt;
    }}
    return f;
"#,
        eps = eps(),
        base = lit(ORB_BASE_RADIUS),
        growth = lit(ORB_GROWTH_RADIUS),
        pull = lit(ORB_PULL),
        push = lit(ORB_SURFACE_PUSH),
        swirl = lit(ORB_SURFACE_SWIRL),
    )
}

fn twin_orb(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let partner = a.partner.unwrap_or(a.position);
    let to_left = a.position - i.position;
    let to_right = partner - i.position;
    let hands = a.position.distance(partner);
    let delta = if hands < TWIN_MERGE_DISTANCE {
        let merge = 1.0 - hands / TWIN_MERGE_DISTANCE;
        let to_mid = (a.position + partner) * 0.5 - i.position;
        let dir = to_mid / (to_mid.length() + DISTANCE_EPSILON);
        let md = to_mid.length() + 0.01;
        let pull = a.strength * TWIN_MERGE_SHARE * merge / (md + 0.2);
        dir * pull * i.dt + swirl_xz(dir) * TWIN_ORBIT * merge * i.dt
    } else {
        let (to, size) = if to_left.length() < to_right.length() {
            (to_left, a.orb_size)
        } else {
            (to_right, a.partner_orb_size)
        };
        let d = to.length() + 0.01;
        let dir = to / d;
        let surface = ORB_BASE_RADIUS + size * TWIN_GROWTH_RADIUS;
        if d > surface {
            dir * (a.strength / (d + 0.3)) * TWIN_PULL * i.dt
        } else {
            -dir * (surface - d) * TWIN_SURFACE_PUSH * i.dt
        }
    };
    ForceOutput {
        delta,
        damping: TWIN_DAMPING,
        heat: 0.0,
    }
}

fn twin_orb_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    f.damping = {damping};
    var partner = a.position;
    if (a.has_partner != 0u) {{ partner = a.partner; }}
    let to_left = a.position - pos;
    let to_right = partner - pos;
    let hands = distance(a.position, partner);
    if (hands < {merge_distance}) {{
        let merge_k = 1.0 - hands / {merge_distance};
        let to_mid = (a.position + partner) * 0.5 - pos;
        let dir = to_mid / (length(to_mid) + {eps});
        let md = length(to_mid) + 0.01;
        let pull = a.strength * {share} * merge_k / (md + 0.2);
        f.delta = dir * pull * u.dt + cross(dir, vec3<f32>(0.0, 1.0, 0.0)) * {orbit} * merge_k * u.dt;
    }} else {{
        var to_a = to_right;
        var size = a.partner_orb_size;
        if (length(to_left) < length(to_right)) {{
            to_a = to_left;
            size = a.orb_size;
        }}
        let d = length(to_a) + 0.01;
        let dir = to_a / d;
        let surface = {base} + size * {growth};
        if (d > surface) {{
            f.delta = dir * (a.strength / (d + 0.3)) * {pull} * u.dt;
        }} else {{
            f.delta = -dir * (surface - d) * {push} * u.dt;
        }}
    }}
    return f;
"#,
        eps = eps(),
        damping = lit(TWIN_DAMPING),
        merge_distance = lit(TWIN_MERGE_DISTANCE),
        share = lit(TWIN_MERGE_SHARE),
        orbit = lit(TWIN_ORBIT),
        base = lit(ORB_BASE_RADIUS),
        growth = lit(TWIN_GROWTH_RADIUS),
        pull = lit(TWIN_PULL),
        push = lit(TWIN_SURFACE_PUSH),
    )
}

fn tornado(i: &ForceInput) -> ForceOutput {
    let (to, d) = i.offset();
    if d >= i.attractor.radius {
        return ForceOutput::default();
    }
    let n = to / d;
    let delta = Vec3::new(n.z, 0.0, -n.x) * TORNADO_SPIN * i.dt
        + Vec3::Y * TORNADO_LIFT * i.dt
        + Vec3::new(n.x, 0.0, n.z) * TORNADO_PULL * i.dt;
    ForceOutput::push(delta)
}

fn tornado_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    let to_a = a.position - pos;
    let d = length(to_a) + {eps};
    if (d >= a.radius) {{ return f; }}
    let n = to_a / d;
    f.delta = vec3<f32>(n.z, 0.0, -n.x) * {spin} * u.dt
        + vec3<f32>(0.0, 1.0, 0.0) * {lift} * u.dt
        + vec3<f32>(n.x, 0.0, n.z) * {pull} * u.dt;
    return f;
"#,
        eps = eps(),
        spin = lit(TORNADO_SPIN),
        lift = lit(TORNADO_LIFT),
        pull = lit(TORNADO_PULL),
    )
}

fn fountain(i: &ForceInput) -> ForceOutput {
    let (to, d) = i.offset();
    if d >= i.attractor.radius {
        return ForceOutput::default();
    }
    let n = to / d;
    let delta = Vec3::Y * FOUNTAIN_SPRAY * i.dt - Vec3::new(n.x, 0.0, n.z) * FOUNTAIN_SPREAD * i.dt;
    ForceOutput::push(delta)
}

fn fountain_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    let to_a = a.position - pos;
    let d = length(to_a) + {eps};
    if (d >= a.radius) {{ return f; }}
    let n = to_a / d;
    f.delta = vec3<f32>(0.0, 1.0, 0.0) * {spray} * u.dt - vec3<f32>(n.x, 0.0, n.z) * {spread} * u.dt;
    return f;
"#,
        eps = eps(),
        spray = lit(FOUNTAIN_SPRAY),
        spread = lit(FOUNTAIN_SPREAD),
    )
}

fn paint(i: &ForceInput) -> ForceOutput {
    let a = i.attractor;
    let (_, d) = i.offset();
    if a.radius <= 0.0 || d >= a.radius {
        return ForceOutput::default();
    }
    ForceOutput {
        heat: PAINT_HEAT * (1.0 - d / a.radius),
        ..ForceOutput::default()
    }
}

fn paint_wgsl() -> String {
    format!(
        r#"    var f = no_force();
    let d = length(a.position - pos) + {eps};
    if (a.radius <= 0.0 || d >= a.radius) {{ return f; }}
    f.heat = {heat} * (1.0 - d / a.radius);
    return f;
"#,
        eps = eps(),
        heat = lit(PAINT_HEAT),
    )
}
