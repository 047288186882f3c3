//! Debug visualisation for dash queries and aim assist.
//!
//! Timed shapes go through [`DebugDrawQueue`]; the per-frame aim-assist view
//! is drawn straight from the [`AimAssist`] components. Nothing is drawn
//! unless [`Diagnostics::enabled`] is set.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use crate::aim_assist::AimAssist;
use crate::config::Diagnostics;
use crate::dash::DashSample;
use crate::math;
use crate::world::CharacterCapsule;

/// Draws queued shapes and aim-assist overlays with gizmos.
/// Requires Bevy's gizmo plugin (part of `DefaultPlugins`).
pub struct AimAssistDebugPlugin;

impl Plugin for AimAssistDebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Diagnostics>()
            .init_resource::<DebugDrawQueue>()
            .add_systems(Update, (draw_debug_queue, draw_aim_assist).chain());
    }
}

const VALID_COLOR: Color = Color::srgb(0.1, 0.9, 0.2);
const REJECTED_COLOR: Color = Color::srgb(0.9, 0.15, 0.1);
const RANGE_COLOR: Color = Color::srgb(0.2, 0.3, 1.0);
const FOV_COLOR: Color = Color::srgb(0.1, 0.9, 0.2);
const FRICTION_COLOR: Color = Color::srgb(1.0, 0.55, 0.0);
const SNAP_COLOR: Color = Color::srgb(1.0, 0.1, 0.1);

const FOV_ARC_SEGMENTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugShape {
    Sphere { center: Vec3, radius: f32, color: Color },
    Line { from: Vec3, to: Vec3, color: Color },
}

impl DebugShape {
    /// Green sphere on a valid capsule centre, red on a rejected candidate.
    pub fn dash_sample(sample: &DashSample, capsule: CharacterCapsule) -> Self {
        match sample.outcome {
            Ok(center) => DebugShape::Sphere {
                center,
                radius: capsule.radius,
                color: VALID_COLOR,
            },
            Err(_) => DebugShape::Sphere {
                center: sample.candidate,
                radius: capsule.radius * 0.5,
                color: REJECTED_COLOR,
            },
        }
    }

    fn draw(&self, gizmos: &mut Gizmos) {
        match *self {
            DebugShape::Sphere {
                center,
                radius,
                color,
            } => {
                gizmos.sphere(Isometry3d::from_translation(center), radius, color);
            }
            DebugShape::Line { from, to, color } => gizmos.line(from, to, color),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct QueuedShape {
    shape: DebugShape,
    remaining: f32,
}

/// Shapes that stay on screen for a fixed number of seconds.
#[derive(Resource, Debug, Default)]
pub struct DebugDrawQueue {
    shapes: Vec<QueuedShape>,
}

impl DebugDrawQueue {
    pub fn push(&mut self, shape: DebugShape, seconds: f32) {
        if seconds > 0.0 {
            self.shapes.push(QueuedShape {
                shape,
                remaining: seconds,
            });
        }
    }

    /// Age every shape by `dt` and drop the expired ones.
    pub fn tick(&mut self, dt: f32) {
        for queued in &mut self.shapes {
            queued.remaining -= dt;
        }
        self.shapes.retain(|queued| queued.remaining > 0.0);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &DebugShape> {
        self.shapes.iter().map(|queued| &queued.shape)
    }
}

/// System: expire timed debug shapes.
pub fn expire_debug_shapes(time: Res<Time>, mut queue: ResMut<DebugDrawQueue>) {
    if !queue.is_empty() {
        queue.tick(time.delta_secs());
    }
}

fn draw_debug_queue(
    mut gizmos: Gizmos,
    diagnostics: Res<Diagnostics>,
    queue: Res<DebugDrawQueue>,
) {
    if !diagnostics.enabled {
        return;
    }
    for shape in queue.shapes() {
        shape.draw(&mut gizmos);
    }
}

/// Edges of a horizontal cone of `full_angle_deg` around `forward`.
fn cone_edges(forward: Vec3, full_angle_deg: f32) -> (Vec3, Vec3) {
    let half = (full_angle_deg * 0.5).to_radians();
    (
        Quat::from_rotation_y(half) * forward,
        Quat::from_rotation_y(-half) * forward,
    )
}

fn draw_cone(gizmos: &mut Gizmos, center: Vec3, forward: Vec3, full_angle_deg: f32, length: f32, color: Color) {
    let (left, right) = cone_edges(forward, full_angle_deg);
    gizmos.line(center, center + left * length, color);
    gizmos.line(center, center + right * length, color);
}

fn draw_aim_assist(
    mut gizmos: Gizmos,
    diagnostics: Res<Diagnostics>,
    agents: Query<(&Transform, &AimAssist)>,
) {
    if !diagnostics.enabled {
        return;
    }
    for (transform, assist) in &agents {
        let Some(profile) = assist.profile() else {
            continue;
        };
        let center = transform.translation;
        let forward = math::unplanar(math::forward_from_yaw(math::yaw_of(transform.rotation)), 0.0);
        let range = profile.assist_range_cm;

        gizmos.circle(
            Isometry3d::new(center, Quat::from_rotation_x(FRAC_PI_2)),
            range,
            RANGE_COLOR,
        );

        let cone_length = range * 0.8;
        draw_cone(&mut gizmos, center, forward, profile.query_fov_deg, cone_length, FOV_COLOR);
        gizmos.line(center, center + forward * cone_length, FOV_COLOR);
        let half = profile.query_fov_deg * 0.5;
        for i in 0..FOV_ARC_SEGMENTS {
            let a = -half + profile.query_fov_deg * i as f32 / FOV_ARC_SEGMENTS as f32;
            let b = -half + profile.query_fov_deg * (i + 1) as f32 / FOV_ARC_SEGMENTS as f32;
            gizmos.line(
                center + Quat::from_rotation_y(a.to_radians()) * forward * cone_length,
                center + Quat::from_rotation_y(b.to_radians()) * forward * cone_length,
                FOV_COLOR,
            );
        }

        let assist_length = range * 0.5;
        draw_cone(&mut gizmos, center, forward, profile.friction_cone_deg, assist_length, FRICTION_COLOR);
        draw_cone(&mut gizmos, center, forward, profile.snap_cone_deg, assist_length, SNAP_COLOR);

        let eye = center + Vec3::Y * assist.settings.los_height_offset;
        let report = assist.last_scan();
        for candidate in &report.candidates {
            let color = if candidate.has_los { VALID_COLOR } else { REJECTED_COLOR };
            let radius = if Some(candidate.actor) == assist.current_target() {
                25.0
            } else {
                15.0
            };
            gizmos.line(eye, candidate.aim_point, color);
            gizmos.sphere(Isometry3d::from_translation(candidate.aim_point), radius, color);
        }
    }
}
