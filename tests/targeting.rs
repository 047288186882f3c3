//! Target acquisition: overlap, FOV, line of sight, scoring and hysteresis.

mod common;

use std::sync::Arc;

use bevy::prelude::*;
use common::*;
use tethered_core::aim_assist::{
    scan_targets, AimAssist, AimAssistProfile, ScanSettings, ScoreWeights,
};
use tethered_core::world::CollisionChannel;

/// Point `distance` away from the origin, `degrees` from +X toward +Z.
fn polar(distance: f32, degrees: f32) -> Vec3 {
    let rad = degrees.to_radians();
    Vec3::new(distance * rad.cos(), 0.0, distance * rad.sin())
}

fn origin_agent() -> tethered_core::world::AgentState {
    agent_at(Vec3::ZERO, Vec2::X)
}

/// Score is purely `1000 / distance`, which makes thresholds easy to place.
fn distance_only() -> ScanSettings {
    ScanSettings {
        weights: ScoreWeights {
            distance: 1000.0,
            angle: 0.0,
            velocity: 0.0,
            sticky: 0.0,
        },
        ..default()
    }
}

/// Small-bodied target so neighbouring targets never shadow each other.
fn add_small_target(world: &mut TestWorld, raw: u32, position: Vec3) -> Entity {
    world.add_actor(TestActor {
        entity: Entity::from_raw(raw),
        position,
        aim_offset: Vec3::Y * 60.0,
        radius: 5.0,
        object_type: CollisionChannel::Pawn,
        targetable: true,
        aimable: true,
        velocity: Vec3::ZERO,
    })
}

// ============================================================
// Selection
// ============================================================

#[test]
fn target_straight_ahead_is_selected_and_kept() {
    let mut world = TestWorld::empty();
    let target = world.add_target(10, Vec3::new(500.0, 0.0, 0.0));
    let mut assist = AimAssist::new(Arc::new(AimAssistProfile::default()));
    let agent = origin_agent();

    assert_eq!(assist.periodic_scan(&agent, &world, &world), Some(target));
    let first = assist.last_scan().clone();
    assert_eq!(first.processed, 1);
    assert_eq!(first.valid, 1);
    assert_eq!(first.in_fov, 1);
    assert_eq!(first.with_los, 1);
    assert!(first.baseline.is_infinite());

    assert_eq!(assist.periodic_scan(&agent, &world, &world), Some(target));
    let second = assist.last_scan();
    assert_eq!(second.previous, Some(target));
    assert!(second.baseline.is_finite());
    assert!(!second.kept_by_hysteresis);
}

#[test]
fn repeated_scans_agree() {
    let mut world = TestWorld::empty();
    world.add_target(10, polar(700.0, 12.0));
    world.add_target(11, polar(400.0, -8.0));
    let profile = AimAssistProfile::default();
    let settings = ScanSettings::default();
    let agent = origin_agent();

    let a = scan_targets(&agent, &profile, &settings, None, &world, &world);
    let b = scan_targets(&agent, &profile, &settings, None, &world, &world);

    assert_eq!(a, b);
    assert!(a.selected.is_some());
}

#[test]
fn better_aligned_target_wins() {
    let mut world = TestWorld::empty();
    let ahead = world.add_target(10, polar(600.0, 1.0));
    world.add_target(11, polar(600.0, 18.0));

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.selected, Some(ahead));
}

#[test]
fn velocity_along_facing_breaks_ties() {
    let mut world = TestWorld::empty();
    let still = world.add_target(10, polar(500.0, 10.0));
    let moving = world.add_target(11, polar(500.0, -10.0));
    world.actor_mut(moving).unwrap().velocity = Vec3::new(300.0, 0.0, 0.0);

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.selected, Some(moving));
    let gap = report.candidate(moving).unwrap().score - report.candidate(still).unwrap().score;
    assert!((gap - 0.2).abs() < 1e-3);
}

// ============================================================
// Filters
// ============================================================

#[test]
fn fov_limits_selection() {
    let mut world = TestWorld::empty();
    let inside = world.add_target(10, polar(500.0, 20.0));
    let outside = world.add_target(11, polar(300.0, -25.0));

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert!(report.candidate(inside).unwrap().in_fov);
    assert!(!report.candidate(outside).unwrap().in_fov);
    assert_eq!(report.in_fov, 1);
    assert_eq!(report.selected, Some(inside));
}

#[test]
fn behind_the_agent_is_never_selected() {
    let mut world = TestWorld::empty();
    world.add_target(10, Vec3::new(-300.0, 0.0, 0.0));
    let profile = AimAssistProfile {
        query_fov_deg: 180.0,
        ..default()
    };

    let report = scan_targets(
        &origin_agent(),
        &profile,
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.processed, 1);
    assert_eq!(report.selected, None);
}

#[test]
fn wall_blocks_line_of_sight() {
    let mut world = TestWorld::empty();
    let target = world.add_target(10, Vec3::new(500.0, 0.0, 0.0));
    world.add_block(Block::new(
        Vec3::new(250.0, 50.0, 0.0),
        Vec3::new(10.0, 200.0, 200.0),
        &[CollisionChannel::Visibility],
    ));

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    let candidate = report.candidate(target).unwrap();
    assert!(candidate.in_fov);
    assert!(!candidate.has_los);
    assert_eq!(report.with_los, 0);
    assert_eq!(report.selected, None);
}

#[test]
fn sight_only_checks_the_configured_channel() {
    let mut world = TestWorld::empty();
    let target = world.add_target(10, Vec3::new(500.0, 0.0, 0.0));
    world.add_block(Block::new(
        Vec3::new(250.0, 50.0, 0.0),
        Vec3::new(10.0, 200.0, 200.0),
        &[CollisionChannel::Pawn],
    ));

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.selected, Some(target));
}

#[test]
fn out_of_range_is_not_processed() {
    let mut world = TestWorld::empty();
    world.add_target(10, Vec3::new(2500.0, 0.0, 0.0));

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.processed, 0);
    assert_eq!(report.selected, None);
}

#[test]
fn object_types_filter_the_overlap() {
    let mut world = TestWorld::empty();
    world.add_actor(TestActor {
        entity: Entity::from_raw(10),
        position: Vec3::new(500.0, 0.0, 0.0),
        aim_offset: Vec3::Y * 60.0,
        radius: 40.0,
        object_type: CollisionChannel::WorldStatic,
        targetable: true,
        aimable: true,
        velocity: Vec3::ZERO,
    });

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.processed, 0);
}

#[test]
fn refusing_and_unaimable_actors_are_skipped() {
    let mut world = TestWorld::empty();
    let refusing = world.add_target(10, polar(400.0, 5.0));
    world.actor_mut(refusing).unwrap().targetable = false;
    let plain = world.add_target(11, polar(400.0, -5.0));
    world.actor_mut(plain).unwrap().aimable = false;

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.processed, 2);
    assert_eq!(report.valid, 0);
    assert!(report.candidates.is_empty());
    assert_eq!(report.selected, None);
}

#[test]
fn target_on_top_of_agent_is_skipped_after_validation() {
    let mut world = TestWorld::empty();
    world.add_target(10, Vec3::new(0.0, 300.0, 0.0));

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &ScanSettings::default(),
        None,
        &world,
        &world,
    );

    assert_eq!(report.processed, 1);
    assert_eq!(report.valid, 1);
    assert!(report.candidates.is_empty());
}

// ============================================================
// Hysteresis
// ============================================================

fn hysteresis_world(challenger_distance: f32) -> (TestWorld, Entity, Entity) {
    let mut world = TestWorld::empty();
    let current = add_small_target(&mut world, 10, polar(100.0, 20.0));
    let challenger = add_small_target(&mut world, 11, polar(challenger_distance, -20.0));
    (world, current, challenger)
}

#[test]
fn challenger_inside_margin_is_rejected() {
    // Baseline 10, challenger 11.0, threshold 10 * 1.15
    let (world, current, challenger) = hysteresis_world(1000.0 / 11.0);

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &distance_only(),
        Some(current),
        &world,
        &world,
    );

    assert!((report.baseline - 10.0).abs() < 1e-3);
    assert!((report.candidate(challenger).unwrap().score - 11.0).abs() < 1e-3);
    assert_eq!(report.selected, Some(current));
    assert!(report.kept_by_hysteresis);
}

#[test]
fn challenger_past_margin_switches() {
    let (world, current, challenger) = hysteresis_world(1000.0 / 11.6);

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &distance_only(),
        Some(current),
        &world,
        &world,
    );

    assert_eq!(report.selected, Some(challenger));
    assert!(!report.kept_by_hysteresis);
}

#[test]
fn zero_stickiness_switches_to_any_better_score() {
    let (world, current, challenger) = hysteresis_world(1000.0 / 10.5);
    let profile = AimAssistProfile {
        stickiness: 0.0,
        ..default()
    };

    let report = scan_targets(
        &origin_agent(),
        &profile,
        &distance_only(),
        Some(current),
        &world,
        &world,
    );

    assert_eq!(report.selected, Some(challenger));
}

#[test]
fn current_outside_fov_gives_no_baseline() {
    let mut world = TestWorld::empty();
    let current = add_small_target(&mut world, 10, polar(100.0, 40.0));
    let challenger = add_small_target(&mut world, 11, polar(500.0, 0.0));

    let report = scan_targets(
        &origin_agent(),
        &AimAssistProfile::default(),
        &distance_only(),
        Some(current),
        &world,
        &world,
    );

    assert!(report.baseline.is_infinite() && report.baseline < 0.0);
    assert_eq!(report.selected, Some(challenger));
}

// ============================================================
// Target lifetime
// ============================================================

#[test]
fn empty_overlap_clears_the_target() {
    let mut world = TestWorld::empty();
    let target = world.add_target(10, Vec3::new(500.0, 0.0, 0.0));
    let mut assist = AimAssist::new(Arc::new(AimAssistProfile::default()));
    let agent = origin_agent();
    assert_eq!(assist.periodic_scan(&agent, &world, &world), Some(target));

    let far_agent = agent_at(Vec3::new(-5000.0, 0.0, 0.0), Vec2::X);
    assert_eq!(assist.periodic_scan(&far_agent, &world, &world), None);
    assert_eq!(assist.current_target(), None);
    assert_eq!(assist.last_scan().processed, 0);
}

#[test]
fn despawned_target_is_replaced() {
    let mut world = TestWorld::empty();
    let first = world.add_target(10, polar(300.0, 0.0));
    let second = world.add_target(11, polar(900.0, 15.0));
    let mut assist = AimAssist::new(Arc::new(AimAssistProfile::default()));
    let agent = origin_agent();
    assert_eq!(assist.periodic_scan(&agent, &world, &world), Some(first));

    world.despawn(first);

    assert_eq!(assist.periodic_scan(&agent, &world, &world), Some(second));
    assert!(assist.last_scan().baseline.is_infinite());
}

#[test]
fn target_leaving_sight_is_dropped() {
    let mut world = TestWorld::empty();
    let target = world.add_target(10, Vec3::new(500.0, 0.0, 0.0));
    let mut assist = AimAssist::new(Arc::new(AimAssistProfile::default()));
    let agent = origin_agent();
    assist.periodic_scan(&agent, &world, &world);

    world.add_wall(Vec3::new(250.0, 50.0, 0.0), Vec3::new(10.0, 200.0, 200.0));

    assert_eq!(assist.periodic_scan(&agent, &world, &world), None);
    assert!(assist.last_scan().candidate(target).is_some());
}

#[test]
fn scan_without_profile_changes_nothing() {
    let mut world = TestWorld::empty();
    world.add_target(10, Vec3::new(500.0, 0.0, 0.0));
    let mut assist = AimAssist::default();

    assert_eq!(assist.periodic_scan(&origin_agent(), &world, &world), None);
    assert_eq!(assist.last_scan().processed, 0);
}

#[test]
fn profile_swap_applies_on_next_scan() {
    let mut world = TestWorld::empty();
    let target = world.add_target(10, polar(1500.0, 0.0));
    let mut assist = AimAssist::new(Arc::new(AimAssistProfile {
        assist_range_cm: 1000.0,
        ..default()
    }));
    let agent = origin_agent();
    assert_eq!(assist.periodic_scan(&agent, &world, &world), None);

    assist.set_profile(Arc::new(AimAssistProfile::default()));

    assert_eq!(assist.periodic_scan(&agent, &world, &world), Some(target));
}
