//! Planar (yaw-only) geometry helpers.
//!
//! All targeting and dash math happens on the horizontal XZ plane. A planar
//! `Vec2` stores world `(x, z)`; yaw is measured about +Y and faces along the
//! Bevy forward axis (`rotation * -Z`).

use bevy::prelude::*;

use crate::constants::DEGENERATE_DISTANCE;

/// Drop the vertical component: world `(x, y, z)` -> planar `(x, z)`.
pub fn planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Lift a planar vector back into the world at height `y`.
pub fn unplanar(v: Vec2, y: f32) -> Vec3 {
    Vec3::new(v.x, y, v.y)
}

/// Normalised horizontal part of `v`, or `None` when it is degenerate.
pub fn planar_direction(v: Vec3) -> Option<Vec2> {
    let flat = planar(v);
    if !flat.is_finite() || flat.length_squared() <= DEGENERATE_DISTANCE * DEGENERATE_DISTANCE {
        return None;
    }
    flat.try_normalize()
}

/// Planar distance between two world points.
pub fn distance_2d(a: Vec3, b: Vec3) -> f32 {
    planar(b - a).length()
}

/// Facing direction for a yaw angle (radians).
pub fn forward_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(-yaw.sin(), -yaw.cos())
}

/// Yaw (radians) whose facing is `direction`. `direction` need not be unit length.
pub fn yaw_from_direction(direction: Vec2) -> f32 {
    (-direction.x).atan2(-direction.y)
}

/// Read the yaw out of a rotation, discarding pitch and roll.
pub fn yaw_of(rotation: Quat) -> f32 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    yaw
}

/// Yaw-only rotation. Pitch is always flattened to zero.
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

/// Unsigned angle between two planar directions in degrees.
pub fn angle_between_deg(a: Vec2, b: Vec2) -> f32 {
    let dot = a
        .normalize_or_zero()
        .dot(b.normalize_or_zero())
        .clamp(-1.0, 1.0);
    dot.acos().to_degrees()
}

/// Sign of the yaw delta that turns `from` toward `to`.
///
/// Ties (parallel or anti-parallel) resolve to a positive turn.
pub fn turn_sign(from: Vec2, to: Vec2) -> f32 {
    if from.perp_dot(to) <= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Turn `yaw` toward `to` by `degrees` (already clamped by the caller).
pub fn yaw_toward(yaw: f32, to: Vec2, degrees: f32) -> f32 {
    let sign = turn_sign(forward_from_yaw(yaw), to);
    yaw + (degrees * sign).to_radians()
}
