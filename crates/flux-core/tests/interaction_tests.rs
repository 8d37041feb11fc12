use flux_core::attractor::{AttractorMode, AttractorSource};
use flux_core::hand::{sample_hand, FlatJointSource, Handedness, Joint};
use flux_core::interaction::{
    is_dual_pinch, is_pointing, select_primary, select_right, HandPose, HandsSnapshot,
    InteractionResolver, PrimaryMode, RightMode,
};
use flux_core::{GestureTracker, InteractionEvent, InteractionParams};
use glam::Vec3;

const DT: f32 = 1.0 / 60.0;

fn pose(wrist: Vec3) -> HandPose {
    HandPose {
        wrist,
        index_tip: Some(wrist + Vec3::new(0.0, 0.0, -0.17)),
        palm_up: 0.0,
        pinching: false,
        fist: false,
        pointing: false,
        pinch_started_ms: None,
    }
}

fn pinching(mut p: HandPose, started_ms: f64) -> HandPose {
    p.pinching = true;
    p.pinch_started_ms = Some(started_ms);
    p
}

fn palm_up(mut p: HandPose, value: f32) -> HandPose {
    p.palm_up = value;
    p
}

fn pair(left: HandPose, right: HandPose) -> HandsSnapshot {
    HandsSnapshot {
        left: Some(left),
        right: Some(right),
    }
}

fn left_hand() -> HandPose {
    pose(Vec3::new(-0.3, 1.2, -0.3))
}

fn right_hand() -> HandPose {
    pose(Vec3::new(0.3, 1.2, -0.3))
}

#[test]
fn reset_outranks_every_other_mode() {
    let params = InteractionParams::default();
    let mut left = palm_up(left_hand(), 0.9);
    left.pointing = true;
    let right = palm_up(right_hand(), 0.9);
    assert_eq!(select_primary(&pair(left, right), &params), Some(PrimaryMode::Reset));
}

#[test]
fn reset_needs_both_palms_open() {
    let params = InteractionParams::default();
    let left = palm_up(left_hand(), 0.9);
    let mut right = palm_up(right_hand(), 0.9);
    right.fist = true;
    // The left palm alone still qualifies for levitation.
    assert_eq!(
        select_primary(&pair(left.clone(), right), &params),
        Some(PrimaryMode::Levitate)
    );

    let right = pinching(palm_up(right_hand(), 0.9), 0.0);
    assert_eq!(
        select_primary(&pair(left, right), &params),
        Some(PrimaryMode::Levitate)
    );
}

#[test]
fn priority_order_is_levitate_singularity_vortex_freeze_center() {
    let params = InteractionParams::default();

    let mut left = palm_up(left_hand(), 0.7);
    left.pointing = true;
    assert_eq!(select_primary(&pair(left, right_hand()), &params), Some(PrimaryMode::Levitate));

    let mut left = pinching(left_hand(), 0.0);
    left.pointing = true;
    assert_eq!(
        select_primary(&pair(left, right_hand()), &params),
        Some(PrimaryMode::Singularity)
    );

    let mut left = pinching(left_hand(), 0.0);
    left.fist = true;
    assert_eq!(select_primary(&pair(left, right_hand()), &params), Some(PrimaryMode::Vortex));

    let mut left = left_hand();
    left.fist = true;
    assert_eq!(select_primary(&pair(left, right_hand()), &params), Some(PrimaryMode::Freeze));

    assert_eq!(
        select_primary(&pair(left_hand(), right_hand()), &params),
        Some(PrimaryMode::Center)
    );
}

#[test]
fn vortex_yields_when_the_right_hand_also_pinches() {
    let params = InteractionParams::default();
    let snapshot = pair(pinching(left_hand(), 0.0), pinching(right_hand(), 900.0));
    assert_eq!(select_primary(&snapshot, &params), Some(PrimaryMode::Center));
}

#[test]
fn single_hand_modes_work_without_the_other_hand() {
    let params = InteractionParams::default();
    let only_left = |p: HandPose| HandsSnapshot {
        left: Some(p),
        right: None,
    };
    assert_eq!(
        select_primary(&only_left(palm_up(left_hand(), 0.7)), &params),
        Some(PrimaryMode::Levitate)
    );
    assert_eq!(
        select_primary(&only_left(pinching(left_hand(), 0.0)), &params),
        Some(PrimaryMode::Vortex)
    );
    assert_eq!(select_primary(&only_left(left_hand()), &params), None);
    assert_eq!(select_primary(&HandsSnapshot::default(), &params), None);
}

#[test]
fn right_hand_prefers_fist_then_pinch_then_point() {
    let mut p = pinching(right_hand(), 0.0);
    p.fist = true;
    p.pointing = true;
    assert_eq!(select_right(&p), Some(RightMode::Freeze));
    p.fist = false;
    assert_eq!(select_right(&p), Some(RightMode::Orb));
    p.pinching = false;
    assert_eq!(select_right(&p), Some(RightMode::Beam));
    p.pointing = false;
    assert_eq!(select_right(&p), None);
}

#[test]
fn dual_pinch_needs_rising_edges_inside_the_window() {
    let inside = pair(pinching(left_hand(), 1000.0), pinching(right_hand(), 1400.0));
    assert!(is_dual_pinch(&inside, 500.0));
    let outside = pair(pinching(left_hand(), 1000.0), pinching(right_hand(), 1600.0));
    assert!(!is_dual_pinch(&outside, 500.0));
    let one = pair(pinching(left_hand(), 1000.0), right_hand());
    assert!(!is_dual_pinch(&one, 500.0));
}

#[test]
fn center_scenario_settles_to_spread_radius() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let left = pose(Vec3::new(-0.3, 1.2, -0.3));
    let right = pose(Vec3::new(0.3, 1.2, -0.3));
    let snapshot = pair(left, right);
    let mut res = resolver.resolve(&snapshot, DT, 0.0, false, &mut events);
    for i in 1..100 {
        res = resolver.resolve(&snapshot, DT, i as f64 * 16.7, false, &mut events);
    }
    assert!((resolver.smoothed_distance() - 0.6).abs() < 1e-3);
    assert_eq!(res.primary, Some(PrimaryMode::Center));
    assert_eq!(res.attractors.len(), 1);
    let center = &res.attractors[0];
    assert_eq!(center.mode, AttractorMode::Center);
    assert_eq!(center.source, AttractorSource::Center);
    assert_eq!(center.strength, 10.0);
    assert!(
        (center.radius - 5.2).abs() < 0.01,
        "radius {} should approach 4 + 2 * 0.6",
        center.radius
    );
    assert!(center.position.distance(Vec3::new(0.0, 1.1, 0.0)) < 1e-6);
    assert!(events.is_empty());
}

#[test]
fn touching_hands_repel_from_center() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let snapshot = pair(pose(Vec3::new(-0.05, 1.2, 0.0)), pose(Vec3::new(0.05, 1.2, 0.0)));
    let mut res = resolver.resolve(&snapshot, DT, 0.0, false, &mut events);
    for _ in 0..100 {
        res = resolver.resolve(&snapshot, DT, 0.0, false, &mut events);
    }
    let center = res.attractor(AttractorMode::Center).expect("center attractor");
    assert_eq!((center.strength, center.radius), (-30.0, 2.0));
}

#[test]
fn both_pinching_out_of_sync_is_strong_center() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let snapshot = pair(pinching(left_hand(), 0.0), pinching(right_hand(), 600.0));
    let res = resolver.resolve(&snapshot, DT, 700.0, false, &mut events);
    assert!(!res.dual_pinch);
    let center = res.attractor(AttractorMode::Center).expect("center attractor");
    assert_eq!((center.strength, center.radius), (50.0, 8.0));
    assert_eq!(res.right, Some(RightMode::Orb));
    assert!(res.attractor(AttractorMode::Orb).is_some());
}

#[test]
fn synchronised_pinch_makes_a_single_twin_orb() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let snapshot = pair(pinching(left_hand(), 0.0), pinching(right_hand(), 400.0));
    let mut res = resolver.resolve(&snapshot, DT, 450.0, false, &mut events);
    for _ in 0..120 {
        res = resolver.resolve(&snapshot, DT, 450.0, false, &mut events);
    }
    assert!(res.dual_pinch);
    assert_eq!(res.attractors.len(), 1);
    let twin = &res.attractors[0];
    assert_eq!(twin.mode, AttractorMode::TwinOrb);
    assert_eq!(twin.source, AttractorSource::Both);
    assert_eq!(twin.position, left_hand().wrist);
    assert_eq!(twin.partner, Some(right_hand().wrist));
    assert!((twin.orb_size - 0.8).abs() < 1e-6, "orb caps at 0.8, got {}", twin.orb_size);
    assert!((twin.partner_orb_size - 0.8).abs() < 1e-6);
}

#[test]
fn singularity_scenario_sits_on_the_index_tip() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let mut left = left_hand();
    left.pointing = true;
    left.index_tip = Some(Vec3::new(0.0, 1.0, 0.0));
    let snapshot = HandsSnapshot {
        left: Some(left),
        right: None,
    };
    let res = resolver.resolve(&snapshot, DT, 0.0, false, &mut events);
    assert_eq!(res.primary, Some(PrimaryMode::Singularity));
    let s = res.attractor(AttractorMode::Singularity).expect("singularity attractor");
    assert_eq!(s.position, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!((s.strength, s.radius), (80.0, 8.0));
    assert_eq!(s.source, AttractorSource::Left);
}

#[test]
fn extended_index_over_curled_middle_becomes_singularity() {
    let hand = Handedness::Left;
    let mut source = FlatJointSource::new();
    source.set_joint(hand, Joint::Wrist, Some(Vec3::new(0.0, 0.8, 0.0)));
    source.set_joint(hand, Joint::IndexTip, Some(Vec3::new(0.0, 1.0, 0.0)));
    source.set_joint(hand, Joint::MiddleTip, Some(Vec3::new(0.0, 0.85, 0.0)));
    // Palm faces sideways so levitation stays out of the way.
    source.set_joint(hand, Joint::IndexProximal, Some(Vec3::new(0.02, 0.9, 0.0)));
    source.set_joint(hand, Joint::PinkyProximal, Some(Vec3::new(-0.02, 0.9, 0.0)));
    let frame = sample_hand(&source, hand).expect("tracked hand");
    assert!(is_pointing(&frame, 0.03), "index reaches 15 cm past the middle tip");
    assert!(frame.palm_up().abs() < 1e-4);

    let params = InteractionParams::default();
    let gestures = GestureTracker::default();
    let snapshot = HandsSnapshot::from_frames(Some(&frame), None, &gestures, &params);
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let res = resolver.resolve(&snapshot, DT, 0.0, false, &mut events);
    assert_eq!(res.primary, Some(PrimaryMode::Singularity));
    let s = res.attractor(AttractorMode::Singularity).expect("singularity attractor");
    assert_eq!(s.position, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!((s.strength, s.radius), (80.0, 8.0));
}

#[test]
fn beam_points_from_wrist_through_index_tip() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let mut right = right_hand();
    right.pointing = true;
    let snapshot = HandsSnapshot {
        left: None,
        right: Some(right.clone()),
    };
    let res = resolver.resolve(&snapshot, DT, 0.0, false, &mut events);
    let beam = res.attractor(AttractorMode::Beam).expect("beam attractor");
    assert_eq!(Some(beam.position), right.index_tip);
    let dir = beam.direction.expect("beam direction");
    assert!(dir.distance(Vec3::new(0.0, 0.0, -1.0)) < 1e-5);
    assert_eq!((beam.strength, beam.radius), (50.0, 15.0));
}

#[test]
fn right_orb_grows_while_pinched_and_decays_after() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let pinched = HandsSnapshot {
        left: None,
        right: Some(pinching(right_hand(), 0.0)),
    };
    let mut size = 0.0;
    for _ in 0..30 {
        let res = resolver.resolve(&pinched, DT, 0.0, false, &mut events);
        let orb = res.attractor(AttractorMode::Orb).expect("orb attractor");
        assert!(orb.orb_size >= size);
        size = orb.orb_size;
    }
    assert!((size - 0.75).abs() < 1e-3, "30 frames at 1.5/s, got {size}");

    let released = HandsSnapshot {
        left: None,
        right: Some(right_hand()),
    };
    let res = resolver.resolve(&released, DT, 0.0, false, &mut events);
    assert!(res.attractors.is_empty());
    let res = resolver.resolve(&pinched, 0.0, 0.0, false, &mut events);
    let orb = res.attractor(AttractorMode::Orb).expect("orb attractor");
    assert!((orb.orb_size - size * 0.85).abs() < 1e-4);
}

#[test]
fn reset_fires_once_per_cooldown_and_ramps() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let snapshot = pair(palm_up(left_hand(), 0.9), palm_up(right_hand(), 0.9));

    let res = resolver.resolve(&snapshot, 0.1, 0.0, false, &mut events);
    assert_eq!(events, vec![InteractionEvent::ResetTriggered { at_ms: 0.0 }]);
    assert!((res.reset_factor - 0.2).abs() < 1e-6);
    assert!(res.attractors.is_empty(), "reset adds no attractor");

    let mut now = 0.0;
    for _ in 0..19 {
        now += 100.0;
        resolver.resolve(&snapshot, 0.1, now, false, &mut events);
    }
    assert_eq!(events.len(), 1, "still inside the 2 s cooldown");
    assert!((resolver.reset_factor() - 1.0).abs() < 1e-6);

    now += 200.0;
    resolver.resolve(&snapshot, 0.1, now, false, &mut events);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], InteractionEvent::ResetTriggered { at_ms: 2100.0 });
}

#[test]
fn reset_factor_decays_after_the_ramp() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    resolver.trigger_reset(0.0, &mut events);
    let empty = HandsSnapshot::default();
    for _ in 0..21 {
        resolver.resolve(&empty, 0.1, 0.0, false, &mut events);
    }
    assert!(!resolver.is_resetting());
    let settled = resolver.reset_factor();
    resolver.resolve(&empty, 0.1, 0.0, false, &mut events);
    assert!((resolver.reset_factor() - settled * 0.95).abs() < 1e-6);
}

#[test]
fn beat_nudges_reset_factor() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let res = resolver.resolve(&HandsSnapshot::default(), DT, 0.0, true, &mut events);
    assert!((res.reset_factor - 0.1).abs() < 1e-6);
    assert!(res.attractors.is_empty());
}

#[test]
fn distance_average_only_moves_with_both_hands() {
    let mut resolver = InteractionResolver::default();
    let mut events = Vec::new();
    let only_left = HandsSnapshot {
        left: Some(left_hand()),
        right: None,
    };
    for _ in 0..50 {
        resolver.resolve(&only_left, DT, 0.0, false, &mut events);
    }
    assert_eq!(resolver.smoothed_distance(), 0.5);
}
