//! Synthetic world for integration tests and benches.
//!
//! Geometry is a list of axis-aligned boxes, each blocking a set of
//! channels and optionally owned by an actor. Actors are spheres for
//! overlap purposes and carry a box body that blocks sight.

#![allow(dead_code)]

use bevy::prelude::*;
use tethered_core::physics::{project_onto_areas, NavArea};
use tethered_core::world::{
    ActorRegistry, AgentState, Aimable, CharacterCapsule, CollisionChannel, TraceHit, WorldQuery,
};

pub const ALL_CHANNELS: [CollisionChannel; 6] = [
    CollisionChannel::WorldStatic,
    CollisionChannel::WorldDynamic,
    CollisionChannel::Pawn,
    CollisionChannel::Visibility,
    CollisionChannel::DashGhost,
    CollisionChannel::SoftCollision,
];

#[derive(Debug, Clone)]
pub struct Block {
    pub min: Vec3,
    pub max: Vec3,
    pub blocks: Vec<CollisionChannel>,
    pub owner: Option<Entity>,
}

impl Block {
    pub fn new(center: Vec3, half_extents: Vec3, blocks: &[CollisionChannel]) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
            blocks: blocks.to_vec(),
            owner: None,
        }
    }

    /// Ray/box slab test; returns the entry parameter in [0, 1].
    fn segment_hit(&self, from: Vec3, to: Vec3) -> Option<f32> {
        let delta = to - from;
        let mut t_min: f32 = 0.0;
        let mut t_max: f32 = 1.0;
        for axis in 0..3 {
            let (o, d, lo, hi) = (from[axis], delta[axis], self.min[axis], self.max[axis]);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }

    /// Distance between a vertical capsule segment and this box.
    fn capsule_distance(&self, center: Vec3, capsule: CharacterCapsule) -> f32 {
        let segment_half = (capsule.half_height - capsule.radius).max(0.0);
        let (seg_lo, seg_hi) = (center.y - segment_half, center.y + segment_half);
        let dy = if seg_hi < self.min.y {
            self.min.y - seg_hi
        } else if seg_lo > self.max.y {
            seg_lo - self.max.y
        } else {
            0.0
        };
        let dx = (self.min.x - center.x).max(0.0).max(center.x - self.max.x);
        let dz = (self.min.z - center.z).max(0.0).max(center.z - self.max.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TestActor {
    pub entity: Entity,
    pub position: Vec3,
    pub aim_offset: Vec3,
    pub radius: f32,
    pub object_type: CollisionChannel,
    pub targetable: bool,
    pub aimable: bool,
    pub velocity: Vec3,
}

impl Aimable for TestActor {
    fn aim_point(&self) -> Vec3 {
        self.position + self.aim_offset
    }

    fn can_be_targeted(&self) -> bool {
        self.targetable
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

#[derive(Debug, Default, Clone)]
pub struct TestWorld {
    pub blocks: Vec<Block>,
    pub actors: Vec<TestActor>,
    pub nav_areas: Vec<NavArea>,
    /// Every navigation projection fails
    pub nav_broken: bool,
}

impl TestWorld {
    /// Open world with no floor or navigation data.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Large floor whose top surface sits at `height`.
    pub fn with_floor(height: f32) -> Self {
        let mut world = Self::default();
        world.add_block(Block::new(
            Vec3::new(0.0, height - 50.0, 0.0),
            Vec3::new(50_000.0, 50.0, 50_000.0),
            &ALL_CHANNELS,
        ));
        world
    }

    pub fn add_block(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Wall blocking every channel.
    pub fn add_wall(&mut self, center: Vec3, half_extents: Vec3) -> &mut Self {
        self.add_block(Block::new(center, half_extents, &ALL_CHANNELS))
    }

    /// Spawn a targetable pawn standing at `position`, aiming 60cm above it.
    pub fn add_target(&mut self, raw: u32, position: Vec3) -> Entity {
        self.add_actor(TestActor {
            entity: Entity::from_raw(raw),
            position,
            aim_offset: Vec3::Y * 60.0,
            radius: 40.0,
            object_type: CollisionChannel::Pawn,
            targetable: true,
            aimable: true,
            velocity: Vec3::ZERO,
        })
    }

    pub fn add_actor(&mut self, actor: TestActor) -> Entity {
        let mut body = Block::new(
            actor.aim_point(),
            Vec3::splat(actor.radius.max(1.0)),
            &[CollisionChannel::Pawn, CollisionChannel::Visibility],
        );
        body.owner = Some(actor.entity);
        self.blocks.push(body);
        self.actors.push(actor);
        actor.entity
    }

    pub fn actor_mut(&mut self, entity: Entity) -> Option<&mut TestActor> {
        self.actors.iter_mut().find(|a| a.entity == entity)
    }

    /// Remove an actor and its body, as if it was despawned.
    pub fn despawn(&mut self, entity: Entity) {
        self.actors.retain(|a| a.entity != entity);
        self.blocks.retain(|b| b.owner != Some(entity));
    }
}

impl WorldQuery for TestWorld {
    fn project_to_navigation(&self, point: Vec3) -> Option<Vec3> {
        if self.nav_broken {
            return None;
        }
        project_onto_areas(&self.nav_areas, point)
    }

    fn line_trace(
        &self,
        from: Vec3,
        to: Vec3,
        channel: CollisionChannel,
        ignore: Option<Entity>,
    ) -> Option<TraceHit> {
        self.blocks
            .iter()
            .filter(|b| b.blocks.contains(&channel))
            .filter(|b| ignore.is_none() || b.owner != ignore)
            .filter_map(|b| b.segment_hit(from, to).map(|t| (t, b.owner)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, owner)| TraceHit {
                location: from.lerp(to, t),
                actor: owner,
            })
    }

    fn capsule_blocked(
        &self,
        center: Vec3,
        capsule: CharacterCapsule,
        channel: CollisionChannel,
        ignore: Option<Entity>,
    ) -> bool {
        self.blocks
            .iter()
            .filter(|b| b.blocks.contains(&channel))
            .filter(|b| ignore.is_none() || b.owner != ignore)
            .any(|b| b.capsule_distance(center, capsule) < capsule.radius)
    }

    fn overlap_actors(
        &self,
        center: Vec3,
        radius: f32,
        object_types: &[CollisionChannel],
        ignore: Option<Entity>,
    ) -> Vec<Entity> {
        self.actors
            .iter()
            .filter(|a| Some(a.entity) != ignore)
            .filter(|a| object_types.contains(&a.object_type))
            .filter(|a| a.position.distance(center) <= radius + a.radius)
            .map(|a| a.entity)
            .collect()
    }
}

impl ActorRegistry for TestWorld {
    type Target<'a> = &'a TestActor;

    fn resolve(&self, actor: Entity) -> Option<&TestActor> {
        self.actors.iter().find(|a| a.entity == actor && a.aimable)
    }
}

pub const AGENT: u32 = 1;

pub fn agent_capsule() -> CharacterCapsule {
    CharacterCapsule::new(40.0, 90.0)
}

/// Agent standing on a floor at height 0 (capsule centre at half height + 1).
pub fn agent_at(position: Vec3, facing: Vec2) -> AgentState {
    AgentState::new(
        Entity::from_raw(AGENT),
        position,
        tethered_core::math::yaw_from_direction(facing),
        agent_capsule(),
    )
}

pub fn standing_agent(facing: Vec2) -> AgentState {
    agent_at(Vec3::new(0.0, 91.0, 0.0), facing)
}
