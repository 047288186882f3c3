//! Facing correction toward a selected target.

use bevy::prelude::*;

use super::AimAssistProfile;
use crate::constants::*;
use crate::math;
use crate::world::{AgentState, ProjectileControl};

/// Assist strength for a stick deflection: full at rest, a quarter at full tilt.
pub fn assist_strength(input_magnitude: f32) -> f32 {
    let t = if input_magnitude.is_nan() {
        0.0
    } else {
        input_magnitude.clamp(0.0, 1.0)
    };
    ASSIST_STRENGTH_MAX + (ASSIST_STRENGTH_MIN - ASSIST_STRENGTH_MAX) * t
}

/// Planar direction and distance from `from` to `to`, if not degenerate.
fn planar_toward(from: Vec3, to: Vec3) -> Option<(Vec2, f32)> {
    let delta = math::planar(to - from);
    let distance = delta.length();
    if !distance.is_finite() || distance <= DEGENERATE_DISTANCE {
        return None;
    }
    Some((delta / distance, distance))
}

/// One frame of soft snap plus rate-limited turn. Writes the new yaw into
/// `agent` and returns the yaw change in degrees.
pub fn apply_assist(
    agent: &mut AgentState,
    aim_point: Vec3,
    profile: &AimAssistProfile,
    input_magnitude: f32,
    dt: f32,
) -> f32 {
    let Some((to_target, _)) = planar_toward(agent.position, aim_point) else {
        return 0.0;
    };
    let start_yaw = agent.yaw;
    let mut angle = math::angle_between_deg(agent.forward_2d(), to_target);

    if angle <= profile.snap_cone_deg {
        let snap = angle.min(profile.max_snap_deg);
        if snap > 0.0 {
            agent.yaw = math::yaw_toward(agent.yaw, to_target, snap);
            angle = math::angle_between_deg(agent.forward_2d(), to_target);
        }
    }

    let max_step = profile.max_yaw_deg_per_sec * dt.max(0.0) * assist_strength(input_magnitude);
    if max_step > 0.0 && angle > MIN_ASSIST_STEP_DEG {
        agent.yaw = math::yaw_toward(agent.yaw, to_target, angle.min(max_step));
    }

    (agent.yaw - start_yaw).to_degrees()
}

/// Lunge requested by a melee commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeLunge {
    /// Unit planar direction toward the target
    pub direction: Vec3,
    /// cm/s
    pub speed: f32,
    /// cm, never past the target
    pub distance: f32,
}

/// Turn toward the target (capped) and produce the lunge.
pub fn melee_commit(
    agent: &mut AgentState,
    aim_point: Vec3,
    profile: &AimAssistProfile,
) -> Option<MeleeLunge> {
    let (to_target, distance) = planar_toward(agent.position, aim_point)?;
    let angle = math::angle_between_deg(agent.forward_2d(), to_target);
    let turn = angle.min(profile.melee_max_turn_on_attack);
    if turn > 0.0 {
        agent.yaw = math::yaw_toward(agent.yaw, to_target, turn);
    }
    Some(MeleeLunge {
        direction: math::unplanar(to_target, 0.0),
        speed: profile.melee_lunge_speed,
        distance: profile.melee_lunge_dist_cm.min(distance),
    })
}

/// Steer a freshly fired projectile toward `aim_point` and arm homing on
/// `target` for the profile's initial homing time.
pub fn ranged_fire<P: ProjectileControl + ?Sized>(
    projectile: &mut P,
    target: Entity,
    aim_point: Vec3,
    profile: &AimAssistProfile,
) {
    if let Some((to_target, _)) = planar_toward(projectile.position(), aim_point) {
        let forward = math::forward_from_yaw(projectile.yaw());
        let step = math::angle_between_deg(forward, to_target).min(profile.projectile_steer_deg);
        if step > 0.0 {
            projectile.set_yaw(math::yaw_toward(projectile.yaw(), to_target, step));
        }
    }

    if profile.initial_homing_time > 0.0 {
        let acceleration = projectile.homing_acceleration().max(MIN_HOMING_ACCELERATION);
        projectile.enable_homing(target, acceleration, profile.initial_homing_time);
    }
}

/// Whether `aim_point` lies inside the friction cone of `agent`'s facing.
pub fn in_friction_cone(agent: &AgentState, aim_point: Vec3, profile: &AimAssistProfile) -> bool {
    planar_toward(agent.position, aim_point).is_some_and(|(to_target, _)| {
        math::angle_between_deg(agent.forward_2d(), to_target) <= profile.friction_cone_deg * 0.5
    })
}
