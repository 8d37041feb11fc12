use flux_core::attractor::{Attractor, AttractorMode};
use flux_core::forces::{self, ForceInput};
use flux_core::sim::{containment, integrate, is_strongly_pulled, ParticleSample, StepInputs};
use flux_core::constants::WALL_TOLERANCE;
use flux_core::{AudioBands, ParticleField, SimParams, SimulationContext, SpawnParams};
use glam::Vec3;

const DT: f32 = 1.0 / 60.0;

fn center() -> Vec3 {
    Vec3::new(0.0, 1.1, 0.0)
}

fn spawn(count: usize, seed: u64) -> ParticleField {
    ParticleField::spawn(&SpawnParams {
        count,
        seed,
        ..SpawnParams::default()
    })
    .expect("spawn")
}

#[test]
fn spawn_is_deterministic_per_seed() {
    let a = spawn(256, 7);
    let b = spawn(256, 7);
    let c = spawn(256, 8);
    assert_eq!(a.homes, b.homes);
    assert_ne!(a.homes, c.homes);
    assert_eq!(a.positions, a.homes);
}

#[test]
fn spawn_places_particles_on_the_shells() {
    let field = spawn(4096, 1);
    for home in &field.homes {
        let r = home.distance(center());
        let on_shell = [2.5, 4.0, 5.5].iter().any(|s| (r - s).abs() <= 0.15 + 1e-4);
        assert!(on_shell, "home radius {r} is off every shell");
    }
}

#[test]
fn empty_pool_is_rejected() {
    assert!(ParticleField::from_homes(Vec::new()).is_err());
    assert!(ParticleField::spawn(&SpawnParams {
        count: 0,
        ..SpawnParams::default()
    })
    .is_err());
}

#[test]
fn idle_shell_stays_inside_the_wall_band() {
    let params = SimParams::default();
    let lo = params.inner_wall - WALL_TOLERANCE;
    let hi = params.outer_wall + WALL_TOLERANCE;
    let mut ctx = SimulationContext::new(spawn(2000, 11));
    for frame in 0..1800 {
        let stats = ctx.step(&params, DT);
        assert_eq!(stats.recovered, 0);
        if frame < 300 || frame % 60 != 0 {
            continue;
        }
        for (i, p) in ctx.particles.positions.iter().enumerate() {
            let r = p.distance(center());
            assert!(
                (lo..=hi).contains(&r),
                "frame {frame}: particle {i} at radius {r}, band {lo}..={hi}"
            );
        }
    }
}

#[test]
fn loud_audio_stirs_harder_than_silence() {
    let params = SimParams::default();
    let mut quiet = SimulationContext::new(spawn(500, 3));
    let mut loud = SimulationContext::new(spawn(500, 3));
    loud.audio = AudioBands {
        bass: 1.0,
        mid: 1.0,
        high: 1.0,
    };
    for _ in 0..30 {
        quiet.step(&params, DT);
        loud.step(&params, DT);
    }
    let drift = |ctx: &SimulationContext| -> f32 {
        ctx.particles
            .positions
            .iter()
            .zip(&ctx.particles.homes)
            .map(|(p, h)| p.distance(*h))
            .sum()
    };
    assert!(drift(&loud) > drift(&quiet));
}

#[test]
fn non_finite_state_snaps_home() {
    let params = SimParams::default();
    let homes = vec![
        Vec3::new(3.0, 1.1, 0.0),
        Vec3::new(0.0, 4.1, 0.0),
        Vec3::new(0.0, 1.1, -3.0),
        Vec3::new(-3.0, 1.1, 0.0),
        Vec3::new(0.0, 1.1, 3.0),
    ];
    let mut field = ParticleField::from_homes(homes.clone()).expect("field");
    field.velocities[0] = Vec3::splat(f32::MAX);
    field.velocities[1] = Vec3::splat(f32::INFINITY);
    field.velocities[2] = Vec3::new(f32::NAN, 0.0, 0.0);
    field.positions[3] = Vec3::new(f32::NAN, 1.0, 1.0);
    field.heat[0] = 0.7;
    let mut ctx = SimulationContext::new(field);
    let stats = ctx.step(&params, DT);

    assert_eq!(stats.recovered, 4);
    for i in 0..4 {
        assert_eq!(ctx.particles.positions[i], homes[i], "particle {i} not home");
        assert_eq!(ctx.particles.velocities[i], Vec3::ZERO);
        assert_eq!(ctx.particles.heat[i], 0.0);
    }
    assert!(ctx.particles.positions[4].is_finite());
    assert_ne!(ctx.particles.positions[4], homes[4], "healthy particle keeps moving");

    let stats = ctx.step(&params, DT);
    assert_eq!(stats.recovered, 0, "recovered particles integrate normally again");
}

#[test]
fn speed_and_reach_are_clamped() {
    let params = SimParams::default();
    let inputs = StepInputs {
        attractors: &[],
        dt: DT,
        time: 0.0,
        level: 0.0,
        reset_factor: 0.0,
    };
    let sample = ParticleSample {
        position: Vec3::new(19.5, 0.0, 0.0),
        velocity: Vec3::new(50.0, 0.0, 0.0),
        home: Vec3::new(19.5, 0.0, 0.0),
        heat: 0.0,
    };
    let (next, outcome) = integrate(&params, &inputs, sample);
    assert!(!outcome.recovered);
    assert!(next.velocity.length() <= params.max_speed + 1e-4);
    assert!(next.position.length() <= params.bound_radius + 1e-4);
}

#[test]
fn containment_pushes_back_into_the_band() {
    let params = SimParams::default();
    let inside = center() + Vec3::X * 0.5;
    let push = containment(&params, inside, inside, DT);
    assert!(push.x > 0.0, "inner wall pushes outward: {push:?}");

    let outside = center() + Vec3::X * 9.0;
    let pull = containment(&params, outside, outside, DT);
    assert!(pull.x < 0.0, "outer wall pulls inward: {pull:?}");

    let home = center() + Vec3::Z * 4.0;
    let spring = containment(&params, home + Vec3::X, home, DT);
    assert!(spring.x < 0.0, "home spring pulls back: {spring:?}");
    assert_eq!(containment(&params, home, home, DT), Vec3::ZERO);
}

#[test]
fn orb_class_attractors_suspend_containment() {
    let params = SimParams::default();
    let orb = Attractor::new(AttractorMode::Orb, Vec3::new(1.0, 1.0, 0.0), (65.0, 8.0));
    assert!(is_strongly_pulled(&params, &[orb.clone()], Vec3::new(2.0, 1.0, 0.0)));
    assert!(!is_strongly_pulled(&params, &[orb], Vec3::new(5.0, 1.0, 0.0)));

    let at_origin = Attractor::new(AttractorMode::Singularity, Vec3::ZERO, (80.0, 8.0));
    assert!(
        !is_strongly_pulled(&params, &[at_origin], Vec3::new(0.5, 0.0, 0.0)),
        "an anchor at the origin is treated as unset"
    );

    let vortex = Attractor::new(AttractorMode::Vortex, Vec3::new(1.0, 1.0, 0.0), (2.5, 8.0));
    assert!(!is_strongly_pulled(&params, &[vortex], Vec3::new(1.5, 1.0, 0.0)));

    let twin = Attractor::new(AttractorMode::TwinOrb, Vec3::new(-3.0, 1.0, 0.0), (80.0, 8.0))
        .with_partner(Vec3::new(3.0, 1.0, 0.0), 0.5);
    assert!(is_strongly_pulled(&params, &[twin], Vec3::new(4.0, 1.0, 0.0)));
}

#[test]
fn singularity_pulls_inward_and_heats_the_core() {
    let well = Vec3::new(0.0, 1.0, 0.0);
    let attractor = Attractor::new(AttractorMode::Singularity, well, (80.0, 8.0));
    let force_at = |position: Vec3| {
        forces::apply(&ForceInput {
            position,
            velocity: Vec3::ZERO,
            attractor: &attractor,
            dt: DT,
            time: 0.0,
        })
    };
    let far = force_at(well + Vec3::new(3.0, 0.5, 0.0));
    assert!(far.delta.dot(well - Vec3::new(3.0, 1.5, 0.0)) > 0.0);
    assert_eq!(far.heat, 0.0);
    assert_eq!(force_at(well + Vec3::new(9.0, 0.0, 0.0)).delta, Vec3::ZERO);

    let params = SimParams::default();
    let home = well + Vec3::new(0.2, 0.0, 0.0);
    let mut ctx = SimulationContext::new(ParticleField::from_homes(vec![home]).expect("field"));
    ctx.attractors.push(attractor.clone());
    ctx.step(&params, DT);
    assert!(ctx.particles.heat[0] > 0.0, "core particle should glow");
}

#[test]
fn freeze_damps_velocity() {
    let attractor = Attractor::new(AttractorMode::Freeze, Vec3::ZERO, (1.0, 8.0));
    for position in [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 40.0)] {
        let out = forces::apply(&ForceInput {
            position,
            velocity: Vec3::new(1.0, 0.0, 0.0),
            attractor: &attractor,
            dt: DT,
            time: 0.0,
        });
        assert!((out.damping - 0.1).abs() < 1e-6, "freeze missed {position}");
        assert_eq!(out.delta, Vec3::ZERO);
    }
}

#[test]
fn freeze_stills_particles_far_from_the_fist() {
    let params = SimParams::default();
    let home = Vec3::new(0.0, 1.1, 6.0);
    let mut ctx = SimulationContext::new(ParticleField::from_homes(vec![home]).expect("field"));
    ctx.particles.velocities[0] = Vec3::new(0.5, 0.0, 0.0);
    let fist = Vec3::new(0.3, 1.2, -3.0);
    ctx.attractors.push(Attractor::new(AttractorMode::Freeze, fist, (1.0, 8.0)));
    assert!(home.distance(fist) > 8.0);
    ctx.step(&params, DT);
    let speed = ctx.particles.velocities[0].length();
    assert!(speed < 0.1, "far particle kept speed {speed}");
}

#[test]
fn bounded_forces_vanish_beyond_radius() {
    let bounded = [
        AttractorMode::Center,
        AttractorMode::Singularity,
        AttractorMode::Beam,
        AttractorMode::Tornado,
        AttractorMode::Fountain,
        AttractorMode::Paint,
    ];
    for mode in bounded {
        let attractor = Attractor::new(mode, Vec3::ZERO, (50.0, 2.0)).with_direction(Vec3::X);
        let out = forces::apply(&ForceInput {
            position: Vec3::new(0.0, 0.0, 40.0),
            velocity: Vec3::ONE,
            attractor: &attractor,
            dt: DT,
            time: 1.0,
        });
        assert_eq!(out.delta, Vec3::ZERO, "{} still acts at distance", mode.as_str());
        assert_eq!(out.damping, 1.0);
        assert_eq!(out.heat, 0.0);
    }
}

#[test]
fn forces_stay_finite_on_the_anchor() {
    for mode in AttractorMode::ALL {
        let attractor = Attractor::new(mode, Vec3::ONE, (80.0, 8.0))
            .with_direction(Vec3::Y)
            .with_orb(1.0)
            .with_partner(Vec3::ONE, 1.0);
        let out = forces::apply(&ForceInput {
            position: Vec3::ONE,
            velocity: Vec3::ZERO,
            attractor: &attractor,
            dt: DT,
            time: 0.5,
        });
        assert!(out.delta.is_finite(), "{} blew up at its anchor", mode.as_str());
        assert!(out.damping.is_finite());
    }
}
