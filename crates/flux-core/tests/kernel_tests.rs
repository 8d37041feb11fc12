use flux_core::attractor::{Attractor, AttractorMode};
use flux_core::kernel::{build_kernel, pack_particles, unpack_particles, uniforms, GpuAttractor};
use flux_core::{ParticleField, SimParams, SimulationContext};
use glam::Vec3;

#[test]
fn kernel_defines_every_force_law_and_dispatches_by_mode() {
    let src = build_kernel(&SimParams::default());
    for mode in AttractorMode::ALL {
        let name = mode.as_str().replace('-', "_");
        assert!(
            src.contains(&format!("fn force_{name}(a: Attractor")),
            "missing force_{name}"
        );
        assert!(
            src.contains(&format!("case {}u: {{ return force_{name}(a, pos, vel); }}", mode as u32)),
            "missing dispatch arm for {name}"
        );
    }
    assert!(src.contains("fn apply_force("));
    assert!(src.contains("fn curl_noise("));
    assert!(src.contains("const CURL_EPSILON: f32 = 0.1;"));
}

#[test]
fn kernel_uses_configured_workgroup_and_noise_scale() {
    let params = SimParams {
        workgroup_size: 128,
        noise_scale: 0.25,
        ..SimParams::default()
    };
    let src = build_kernel(&params);
    assert!(src.contains("@workgroup_size(128)"));
    assert!(src.contains("const NOISE_SCALE: f32 = 0.25;"));
}

#[test]
fn strong_pull_test_covers_orb_class_modes_only() {
    let src = build_kernel(&SimParams::default());
    let line = src
        .lines()
        .find(|l| l.contains("continue;"))
        .expect("strong pull filter");
    for mode in [AttractorMode::Singularity, AttractorMode::Orb, AttractorMode::TwinOrb] {
        assert!(line.contains(&format!("a.mode == {}u", mode as u32)), "{line}");
    }
    assert!(!line.contains(&format!("a.mode == {}u", AttractorMode::Center as u32)));
}

#[test]
fn kernel_parses_and_validates() {
    for workgroup_size in [64, 256] {
        let params = SimParams {
            workgroup_size,
            ..SimParams::default()
        };
        let src = build_kernel(&params);
        let module = match naga::front::wgsl::parse_str(&src) {
            Ok(module) => module,
            Err(e) => panic!("kernel does not parse:\n{}", e.emit_to_string(&src)),
        };
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("kernel does not validate:\n{}", e.emit_to_string(&src));
        }
        assert!(module.entry_points.iter().any(|ep| ep.name == "main"));
    }
}

#[test]
fn attractor_packing_flags_optional_fields() {
    let plain = GpuAttractor::from(&Attractor::new(
        AttractorMode::Orb,
        Vec3::new(1.0, 2.0, 3.0),
        (65.0, 8.0),
    ));
    assert_eq!(plain.mode, AttractorMode::Orb as u32);
    assert_eq!(plain.has_direction, 0);
    assert_eq!(plain.has_partner, 0);
    assert_eq!(plain.partner, [1.0, 2.0, 3.0]);

    let twin = GpuAttractor::from(
        &Attractor::new(AttractorMode::TwinOrb, Vec3::ZERO, (80.0, 8.0))
            .with_partner(Vec3::X, 0.4)
            .with_direction(Vec3::new(0.0, 0.0, 2.0)),
    );
    assert_eq!(twin.has_partner, 1);
    assert_eq!(twin.partner, [1.0, 0.0, 0.0]);
    assert_eq!(twin.partner_orb_size, 0.4);
    assert_eq!(twin.has_direction, 1);
    assert_eq!(twin.direction, [0.0, 0.0, 1.0]);
}

#[test]
fn particle_packing_carries_heat_in_w() {
    let mut field = ParticleField::from_homes(vec![Vec3::new(1.0, 2.0, 3.0), Vec3::ONE])
        .expect("field");
    field.heat[1] = 0.5;
    field.velocities[0] = Vec3::new(0.1, 0.0, 0.0);
    let packed = pack_particles(&field);
    assert_eq!(packed[0].position, [1.0, 2.0, 3.0, 0.0]);
    assert_eq!(packed[0].velocity, [0.1, 0.0, 0.0, 0.0]);
    assert_eq!(packed[1].position[3], 0.5);

    let mut moved = packed.clone();
    moved[0].position = [4.0, 5.0, 6.0, 0.25];
    unpack_particles(&moved, &mut field);
    assert_eq!(field.positions[0], Vec3::new(4.0, 5.0, 6.0));
    assert_eq!(field.heat[0], 0.25);
    assert_eq!(field.homes[0], Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn uniforms_mirror_context_state() {
    let mut ctx = SimulationContext::new(ParticleField::from_homes(vec![Vec3::ONE; 3]).expect("field"));
    ctx.reset_factor = 0.4;
    ctx.time = 2.5;
    ctx.attractors
        .push(Attractor::new(AttractorMode::Vortex, Vec3::ONE, (2.5, 8.0)));
    let u = uniforms(&SimParams::default(), &ctx, 0.016);
    assert_eq!(u.particle_count, 3);
    assert_eq!(u.attractor_count, 1);
    assert_eq!(u.reset_factor, 0.4);
    assert_eq!(u.time, 2.5);
    assert_eq!(u.dt, 0.016);
    assert_eq!(u.center, [0.0, 1.1, 0.0]);
}
