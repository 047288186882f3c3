//! World-facing contracts consumed by the dash and aim-assist cores.
//!
//! The cores never touch physics or ECS storage directly. They ask a
//! [`WorldQuery`] for spatial answers and an [`ActorRegistry`] to turn an
//! [`Entity`] handle back into something [`Aimable`]. Handles are never
//! owned: a registry lookup that fails means the actor is gone.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math;

/// Collision channels a query can be issued against.
///
/// Mirrors the channel set the game's collision profiles are authored in.
/// The physics backend maps each channel to a collision group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionChannel {
    WorldStatic,
    WorldDynamic,
    Pawn,
    Visibility,
    /// Blockers that only stop dashes, such as dash-proof barriers
    DashGhost,
    SoftCollision,
}

/// Character collision capsule. `half_height` includes the hemispherical caps.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterCapsule {
    pub radius: f32,
    pub half_height: f32,
}

impl CharacterCapsule {
    pub fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius: radius.max(0.0),
            half_height: half_height.max(0.0),
        }
    }

    /// Same capsule with `extra` added to the radius.
    pub fn inflated(&self, extra: f32) -> Self {
        Self::new(self.radius + extra, self.half_height)
    }
}

impl Default for CharacterCapsule {
    fn default() -> Self {
        // Default third-person character: 42cm radius, 96cm half height
        Self::new(42.0, 96.0)
    }
}

/// First blocking hit of a line trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub location: Vec3,
    /// Actor owning the hit collider, if the collider belongs to one
    pub actor: Option<Entity>,
}

/// Snapshot of the agent performing a query. Rebuilt by the caller each call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentState {
    pub entity: Entity,
    pub position: Vec3,
    /// Yaw about +Y in radians
    pub yaw: f32,
    pub capsule: CharacterCapsule,
}

impl AgentState {
    pub fn new(entity: Entity, position: Vec3, yaw: f32, capsule: CharacterCapsule) -> Self {
        Self {
            entity,
            position,
            yaw,
            capsule,
        }
    }

    pub fn from_transform(entity: Entity, transform: &Transform, capsule: CharacterCapsule) -> Self {
        Self::new(
            entity,
            transform.translation,
            math::yaw_of(transform.rotation),
            capsule,
        )
    }

    /// Planar facing derived from yaw.
    pub fn forward_2d(&self) -> Vec2 {
        math::forward_from_yaw(self.yaw)
    }
}

/// Spatial queries supplied by the environment. All calls are synchronous.
pub trait WorldQuery {
    /// Project `point` onto walkable navigation. `None` when nothing is in reach.
    fn project_to_navigation(&self, point: Vec3) -> Option<Vec3>;

    /// First blocking hit along `from -> to` on `channel`.
    fn line_trace(
        &self,
        from: Vec3,
        to: Vec3,
        channel: CollisionChannel,
        ignore: Option<Entity>,
    ) -> Option<TraceHit>;

    /// Whether a capsule at `center` overlaps anything blocking `channel`.
    fn capsule_blocked(
        &self,
        center: Vec3,
        capsule: CharacterCapsule,
        channel: CollisionChannel,
        ignore: Option<Entity>,
    ) -> bool;

    /// Actors of any of `object_types` overlapping a sphere.
    fn overlap_actors(
        &self,
        center: Vec3,
        radius: f32,
        object_types: &[CollisionChannel],
        ignore: Option<Entity>,
    ) -> Vec<Entity>;
}

/// Capability of an actor that aim assist may lock onto.
pub trait Aimable {
    /// World position to aim at (head/torso), distinct from the actor origin.
    fn aim_point(&self) -> Vec3;

    /// Whether the actor accepts being targeted right now.
    fn can_be_targeted(&self) -> bool {
        true
    }

    /// Current world velocity, used for the velocity-alignment score term.
    fn velocity(&self) -> Vec3 {
        Vec3::ZERO
    }
}

impl<T: Aimable + ?Sized> Aimable for &T {
    fn aim_point(&self) -> Vec3 {
        (**self).aim_point()
    }

    fn can_be_targeted(&self) -> bool {
        (**self).can_be_targeted()
    }

    fn velocity(&self) -> Vec3 {
        (**self).velocity()
    }
}

/// Resolves weak actor handles. `None` means the actor no longer exists or
/// does not expose the [`Aimable`] capability.
pub trait ActorRegistry {
    type Target<'a>: Aimable
    where
        Self: 'a;

    fn resolve(&self, actor: Entity) -> Option<Self::Target<'_>>;
}

/// Projectile being launched, as seen by ranged-fire assist.
pub trait ProjectileControl {
    fn position(&self) -> Vec3;
    fn yaw(&self) -> f32;
    fn set_yaw(&mut self, yaw: f32);
    /// Homing acceleration currently configured on the projectile
    fn homing_acceleration(&self) -> f32;
    /// Home on `target` for `duration` seconds, then stop homing.
    fn enable_homing(&mut self, target: Entity, acceleration: f32, duration: f32);
}
