//! Rapier physics backend for the world queries.
//!
//! Provides:
//! - Collision groups for each [`CollisionChannel`]
//! - Collider bundles for characters, walls, dash barriers and projectiles
//! - [`NavArea`] walkable patches used for navigation projection
//! - [`RapierScene`], the [`WorldQuery`] implementation over a `RapierContext`
//!
//! A collider blocks a query channel when that channel's group is in the
//! collider's filters. A collider's memberships are its object type.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::constants::{NAV_QUERY_EXTENT_HORIZONTAL, NAV_QUERY_EXTENT_VERTICAL};
use crate::math;
use crate::world::{CharacterCapsule, CollisionChannel, TraceHit, WorldQuery};

// ============================================================================
// Collision Layers
// ============================================================================

/// Collision group constants, one per channel.
pub struct PhysicsLayers;

impl PhysicsLayers {
    /// Static level geometry
    pub const WORLD_STATIC: Group = Group::GROUP_1;
    /// Movable props
    pub const WORLD_DYNAMIC: Group = Group::GROUP_2;
    /// Characters
    pub const PAWN: Group = Group::GROUP_3;
    /// Sight blockers
    pub const VISIBILITY: Group = Group::GROUP_4;
    /// Dash-only blockers
    pub const DASH_GHOST: Group = Group::GROUP_5;
    /// Soft character separation volumes
    pub const SOFT_COLLISION: Group = Group::GROUP_6;
    /// Projectiles (never blocks queries)
    pub const PROJECTILE: Group = Group::GROUP_7;
}

impl CollisionChannel {
    pub fn group(self) -> Group {
        match self {
            CollisionChannel::WorldStatic => PhysicsLayers::WORLD_STATIC,
            CollisionChannel::WorldDynamic => PhysicsLayers::WORLD_DYNAMIC,
            CollisionChannel::Pawn => PhysicsLayers::PAWN,
            CollisionChannel::Visibility => PhysicsLayers::VISIBILITY,
            CollisionChannel::DashGhost => PhysicsLayers::DASH_GHOST,
            CollisionChannel::SoftCollision => PhysicsLayers::SOFT_COLLISION,
        }
    }

    /// Query groups for a trace or sweep on this channel.
    pub fn query_groups(self) -> CollisionGroups {
        CollisionGroups::new(self.group(), Group::ALL)
    }
}

/// Query groups matching colliders whose object type is any of `object_types`.
pub fn object_type_groups(object_types: &[CollisionChannel]) -> CollisionGroups {
    let filters = object_types
        .iter()
        .fold(Group::NONE, |acc, channel| acc | channel.group());
    CollisionGroups::new(Group::ALL, filters)
}

// ============================================================================
// Physics Component Bundles
// ============================================================================

/// Rapier collider for a character capsule. Rapier measures the cylinder
/// part only, so the caps are taken off the half height.
pub fn capsule_collider(capsule: CharacterCapsule) -> Collider {
    Collider::capsule_y(
        (capsule.half_height - capsule.radius).max(0.0),
        capsule.radius,
    )
}

/// Physics components for a character (player or enemy).
/// Blocks pawn movement, sight and projectiles.
pub fn character_physics_bundle(
    capsule: CharacterCapsule,
) -> (RigidBody, Collider, CollisionGroups, CharacterCapsule) {
    (
        RigidBody::KinematicPositionBased,
        capsule_collider(capsule),
        CollisionGroups::new(
            PhysicsLayers::PAWN,
            PhysicsLayers::PAWN | PhysicsLayers::VISIBILITY | PhysicsLayers::PROJECTILE,
        ),
        capsule,
    )
}

/// Physics components for a static wall. Blocks every channel.
pub fn wall_physics_bundle(half_extents: Vec3) -> (RigidBody, Collider, CollisionGroups) {
    (
        RigidBody::Fixed,
        Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        CollisionGroups::new(PhysicsLayers::WORLD_STATIC, Group::ALL),
    )
}

/// Physics components for a barrier that stops dashes but not sight.
pub fn dash_barrier_bundle(half_extents: Vec3) -> (RigidBody, Collider, CollisionGroups) {
    (
        RigidBody::Fixed,
        Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        CollisionGroups::new(PhysicsLayers::WORLD_STATIC, PhysicsLayers::DASH_GHOST),
    )
}

/// Groups a collider rides with while dashing: its object type becomes
/// [`PhysicsLayers::DASH_GHOST`] so pawn queries pass through it, and its
/// filters are unchanged.
pub fn dash_ghost_groups(groups: CollisionGroups) -> CollisionGroups {
    CollisionGroups::new(PhysicsLayers::DASH_GHOST, groups.filters)
}

/// Physics components for a projectile. A sensor, so it never blocks queries.
pub fn projectile_physics_bundle(radius: f32) -> (RigidBody, Collider, Sensor, CollisionGroups) {
    (
        RigidBody::KinematicPositionBased,
        Collider::ball(radius.max(0.0)),
        Sensor,
        CollisionGroups::new(
            PhysicsLayers::PROJECTILE,
            PhysicsLayers::PAWN | PhysicsLayers::WORLD_STATIC,
        ),
    )
}

// ============================================================================
// Navigation
// ============================================================================

/// Axis-aligned walkable patch at a fixed height.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NavArea {
    /// Planar `(x, z)` corners
    pub min: Vec2,
    pub max: Vec2,
    /// Floor height (y)
    pub height: f32,
}

impl NavArea {
    pub fn new(a: Vec2, b: Vec2, height: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
            height,
        }
    }

    /// Closest point on this patch within the query extent of `point`.
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        if (point.y - self.height).abs() > NAV_QUERY_EXTENT_VERTICAL {
            return None;
        }
        let flat = math::planar(point);
        let clamped = flat.clamp(self.min, self.max);
        if clamped.distance(flat) > NAV_QUERY_EXTENT_HORIZONTAL {
            return None;
        }
        Some(math::unplanar(clamped, self.height))
    }
}

/// Project onto the nearest of `areas`. With no areas at all the point is
/// returned unchanged, so levels without navigation data still allow dashes.
pub fn project_onto_areas(areas: &[NavArea], point: Vec3) -> Option<Vec3> {
    if areas.is_empty() {
        return Some(point);
    }
    areas
        .iter()
        .filter_map(|area| area.project(point))
        .min_by(|a, b| a.distance_squared(point).total_cmp(&b.distance_squared(point)))
}

// ============================================================================
// Rapier-backed world queries
// ============================================================================

/// One frame's view of the rapier world plus navigation data.
pub struct RapierScene<'a> {
    context: &'a RapierContext,
    nav_areas: Vec<NavArea>,
}

impl<'a> RapierScene<'a> {
    pub fn new(context: &'a RapierContext, nav_areas: Vec<NavArea>) -> Self {
        Self { context, nav_areas }
    }
}

fn filter_for(groups: CollisionGroups, ignore: Option<Entity>) -> QueryFilter<'static> {
    let filter = QueryFilter::new().groups(groups).exclude_sensors();
    match ignore {
        Some(entity) => filter.exclude_collider(entity),
        None => filter,
    }
}

impl WorldQuery for RapierScene<'_> {
    fn project_to_navigation(&self, point: Vec3) -> Option<Vec3> {
        project_onto_areas(&self.nav_areas, point)
    }

    fn line_trace(
        &self,
        from: Vec3,
        to: Vec3,
        channel: CollisionChannel,
        ignore: Option<Entity>,
    ) -> Option<TraceHit> {
        let delta = to - from;
        let length = delta.length();
        let direction = delta.try_normalize()?;
        let (entity, toi) = self.context.cast_ray(
            from,
            direction,
            length,
            true,
            filter_for(channel.query_groups(), ignore),
        )?;
        Some(TraceHit {
            location: from + direction * toi,
            actor: Some(entity),
        })
    }

    fn capsule_blocked(
        &self,
        center: Vec3,
        capsule: CharacterCapsule,
        channel: CollisionChannel,
        ignore: Option<Entity>,
    ) -> bool {
        self.context
            .intersection_with_shape(
                center,
                Quat::IDENTITY,
                &capsule_collider(capsule),
                filter_for(channel.query_groups(), ignore),
            )
            .is_some()
    }

    fn overlap_actors(
        &self,
        center: Vec3,
        radius: f32,
        object_types: &[CollisionChannel],
        ignore: Option<Entity>,
    ) -> Vec<Entity> {
        let mut actors = Vec::new();
        if object_types.is_empty() || radius <= 0.0 {
            return actors;
        }
        self.context.intersections_with_shape(
            center,
            Quat::IDENTITY,
            &Collider::ball(radius),
            filter_for(object_type_groups(object_types), ignore),
            |entity| {
                if !actors.contains(&entity) {
                    actors.push(entity);
                }
                true
            },
        );
        actors
    }
}

// ============================================================================
// Tests
// ============================================================================
