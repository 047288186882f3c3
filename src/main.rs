//! Sandbox for the gameplay core: one player, a few dummies and some walls.
//!
//! Controls: A/D turn, Space dash, F melee commit, E fire, F3 toggle debug draw.
//! An optional first argument names a `CoreConfig` file (RON or JSON).

use std::path::PathBuf;

use anyhow::Context;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use tethered_core::aim_assist::handle_ranged_fire;
use tethered_core::config::CoreConfig;
use tethered_core::logging::LoggingPlugin;
use tethered_core::math;
use tethered_core::physics::{
    character_physics_bundle, dash_barrier_bundle, projectile_physics_bundle, wall_physics_bundle,
};
use tethered_core::prelude::*;

const TURN_DEG_PER_SEC: f32 = 120.0;
const PROJECTILE_SPEED: f32 = 3000.0;
const PROJECTILE_LIFETIME: f32 = 1.5;

#[derive(Component)]
struct SandboxPlayer;

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            CoreConfig::load(&path).with_context(|| format!("loading config {:?}", path))?
        }
        None => CoreConfig {
            profile_path: Some(PathBuf::from("assets/profiles/default.ron")),
            ..default()
        },
    };

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Tethered - Gameplay Sandbox".into(),
                        resolution: (1280., 720.).into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<LogPlugin>(),
        )
        .add_plugins(LoggingPlugin {
            config: config.tracing.clone(),
        })
        // Scene units are centimetres
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().with_length_unit(100.0))
        .add_plugins(RapierDebugRenderPlugin::default())
        .add_plugins(TetheredCorePlugin {
            config,
            ..default()
        })
        .add_plugins(AimAssistDebugPlugin)
        .add_systems(Startup, setup_scene)
        .add_systems(Update, player_input.before(handle_ranged_fire))
        .run();

    Ok(())
}

fn setup_scene(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 2200.0, 1600.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Floor and navigation
    commands.spawn((
        wall_physics_bundle(Vec3::new(2500.0, 10.0, 2500.0)),
        Transform::from_xyz(0.0, -10.0, 0.0),
    ));
    commands.spawn(NavArea::new(Vec2::splat(-2400.0), Vec2::splat(2400.0), 0.0));

    // Walls and a dash barrier
    commands.spawn((
        wall_physics_bundle(Vec3::new(50.0, 200.0, 400.0)),
        Transform::from_xyz(700.0, 200.0, 0.0),
    ));
    commands.spawn((
        dash_barrier_bundle(Vec3::new(400.0, 150.0, 20.0)),
        Transform::from_xyz(0.0, 150.0, -600.0),
    ));

    let capsule = CharacterCapsule::default();
    commands.spawn((
        SandboxPlayer,
        character_physics_bundle(capsule),
        AimAssist::default(),
        Transform::from_xyz(0.0, capsule.half_height, 0.0),
    ));

    for (x, z) in [(1000.0, 200.0), (-600.0, -900.0), (300.0, -1300.0)] {
        commands.spawn((
            character_physics_bundle(capsule),
            Targetable::default(),
            Velocity::zero(),
            Transform::from_xyz(x, capsule.half_height, z),
        ));
    }
}

#[allow(clippy::too_many_arguments)]
fn player_input(
    mut commands: Commands,
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mut diagnostics: ResMut<Diagnostics>,
    mut players: Query<(Entity, &mut Transform, &mut AimAssist), With<SandboxPlayer>>,
    mut dashes: EventWriter<DashRequest>,
    mut melee: EventWriter<MeleeCommit>,
    mut fired: EventWriter<RangedFire>,
) {
    if keys.just_pressed(KeyCode::F3) {
        diagnostics.enabled = !diagnostics.enabled;
        info!(enabled = diagnostics.enabled, "debug draw toggled");
    }

    let Ok((player, mut transform, mut assist)) = players.get_single_mut() else {
        return;
    };

    let mut turn: f32 = 0.0;
    if keys.pressed(KeyCode::KeyA) {
        turn += 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        turn -= 1.0;
    }
    assist.set_aim_input_magnitude(turn.abs());
    if turn != 0.0 {
        let yaw = math::yaw_of(transform.rotation)
            + (turn * TURN_DEG_PER_SEC * time.delta_secs()).to_radians();
        transform.rotation = math::yaw_rotation(yaw);
    }

    if keys.just_pressed(KeyCode::Space) {
        dashes.send(DashRequest {
            agent: player,
            params: DashQueryParams {
                desired_direction: transform.forward().as_vec3(),
                debug_seconds: 2.0,
                ..default()
            },
        });
    }

    if keys.just_pressed(KeyCode::KeyF) {
        melee.send(MeleeCommit { agent: player });
    }

    if keys.just_pressed(KeyCode::KeyE) {
        let muzzle = transform.translation + transform.forward().as_vec3() * 80.0;
        let projectile = commands
            .spawn((
                projectile_physics_bundle(8.0),
                ProjectileMotion::new(PROJECTILE_SPEED, PROJECTILE_LIFETIME),
                Transform::from_translation(muzzle).with_rotation(transform.rotation),
            ))
            .id();
        fired.send(RangedFire {
            shooter: player,
            projectile,
        });
    }
}
