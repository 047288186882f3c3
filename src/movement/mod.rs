//! Motion drivers started by the dash resolver and melee assist.
//!
//! Both are transient components: the system that drives one removes it
//! once the motion is finished. A dashing agent rides as a dash ghost and
//! gets its collision groups back on arrival.

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionGroups;

use crate::physics::dash_ghost_groups;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (apply_dash_motion, apply_lunge).chain());
    }
}

/// Carries an agent to a resolved dash endpoint at constant speed.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DashMotion {
    pub target: Vec3,
    /// Travel speed (cm/s)
    pub speed: f32,
    /// Groups to put back on the collider when the dash ends
    pub restore_groups: Option<CollisionGroups>,
}

impl DashMotion {
    pub fn new(target: Vec3, speed: f32) -> Self {
        Self {
            target,
            speed: speed.max(0.0),
            restore_groups: None,
        }
    }

    /// Turn the agent into a dash ghost for this motion. `groups` are the
    /// collider's current groups and `active` the dash it may be cutting
    /// short, whose saved groups win so a chained dash still restores the
    /// pre-dash state. Returns the motion and the groups to insert now.
    pub fn ghosted(
        mut self,
        groups: Option<CollisionGroups>,
        active: Option<&DashMotion>,
    ) -> (Self, Option<CollisionGroups>) {
        let saved = active.and_then(|motion| motion.restore_groups).or(groups);
        self.restore_groups = saved;
        (self, saved.map(dash_ghost_groups))
    }

    /// Advance `from` toward the target by one step. Returns the new position
    /// and whether the target has been reached.
    pub fn step(&self, from: Vec3, dt: f32) -> (Vec3, bool) {
        let to_target = self.target - from;
        let remaining = to_target.length();
        let travel = self.speed * dt;
        if remaining <= travel || remaining <= f32::EPSILON {
            (self.target, true)
        } else {
            (from + to_target / remaining * travel, false)
        }
    }
}

/// Melee commit lunge: constant planar velocity for a fixed time.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Lunge {
    /// Current lunge velocity (cm/s)
    pub velocity: Vec3,
    /// Time remaining (seconds)
    pub remaining: f32,
}

impl Lunge {
    /// Lunge along `direction` at `speed` until `distance` is covered.
    pub fn new(direction: Vec3, speed: f32, distance: f32) -> Self {
        let speed = speed.max(0.0);
        let remaining = if speed > 0.0 {
            distance.max(0.0) / speed
        } else {
            0.0
        };
        Self {
            velocity: direction.normalize_or_zero() * speed,
            remaining,
        }
    }
}

/// System: move dashing agents and drop [`DashMotion`] on arrival.
pub fn apply_dash_motion(
    time: Res<Time>,
    mut commands: Commands,
    mut agents: Query<(Entity, &mut Transform, &DashMotion)>,
) {
    let dt = time.delta_secs();
    for (entity, mut transform, motion) in &mut agents {
        let (next, arrived) = motion.step(transform.translation, dt);
        transform.translation = next;
        if arrived {
            debug!(agent = ?entity, "dash motion finished");
            let mut agent = commands.entity(entity);
            agent.remove::<DashMotion>();
            if let Some(groups) = motion.restore_groups {
                agent.insert(groups);
            }
        }
    }
}

/// System: apply lunge movement and remove it when the time runs out.
pub fn apply_lunge(
    time: Res<Time>,
    mut commands: Commands,
    mut agents: Query<(Entity, &mut Transform, &mut Lunge)>,
) {
    let dt = time.delta_secs();
    for (entity, mut transform, mut lunge) in &mut agents {
        let step = dt.min(lunge.remaining.max(0.0));
        transform.translation += lunge.velocity * step;
        lunge.remaining -= dt;
        if lunge.remaining <= 0.0 {
            commands.entity(entity).remove::<Lunge>();
        }
    }
}
