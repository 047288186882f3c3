//! Dash endpoint queries.
//!
//! A dash is requested with [`DashRequest`]; the resolver samples the path
//! (see [`query`]) against the rapier scene and answers with [`DashResolved`].
//! Long enough results start a [`DashMotion`] on the agent.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

pub mod query;

pub use query::{resolve_dash_endpoint, resolve_dash_endpoint_traced, DashSample, SampleRejection};

use crate::config::{DashSettings, Diagnostics};
use crate::constants::*;
use crate::debug::{expire_debug_shapes, DebugDrawQueue, DebugShape};
use crate::math;
use crate::movement::DashMotion;
use crate::physics::{NavArea, RapierScene};
use crate::world::{AgentState, CharacterCapsule, CollisionChannel};

pub struct DashPlugin;

impl Plugin for DashPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DashRequest>()
            .add_event::<DashResolved>()
            .init_resource::<DashSettings>()
            .init_resource::<Diagnostics>()
            .init_resource::<DebugDrawQueue>()
            .add_systems(Update, (resolve_dash_requests, expire_debug_shapes).chain());
    }
}

/// Parameters of a single dash query.
#[derive(Debug, Clone, PartialEq)]
pub struct DashQueryParams {
    pub max_distance: f32,
    pub num_samples: u32,
    /// Zero (or vertical) falls back to the agent's forward
    pub desired_direction: Vec3,
    pub project_to_nav: bool,
    pub snap_to_ground: bool,
    pub max_height_delta: f32,
    pub clearance_buffer: f32,
    /// A candidate is invalid if blocked on ANY of these
    pub channels: Vec<CollisionChannel>,
    /// Lifetime of debug shapes; 0 draws nothing
    pub debug_seconds: f32,
}

impl Default for DashQueryParams {
    fn default() -> Self {
        Self {
            max_distance: DASH_DEFAULT_MAX_DISTANCE,
            num_samples: DASH_DEFAULT_SAMPLES,
            desired_direction: Vec3::ZERO,
            project_to_nav: true,
            snap_to_ground: true,
            max_height_delta: DASH_DEFAULT_MAX_HEIGHT_DELTA,
            clearance_buffer: DASH_DEFAULT_CLEARANCE,
            channels: vec![CollisionChannel::Pawn, CollisionChannel::DashGhost],
            debug_seconds: 0.0,
        }
    }
}

impl DashQueryParams {
    pub fn toward(direction: Vec3) -> Self {
        Self {
            desired_direction: direction,
            ..default()
        }
    }

    /// Copy with the caller-boundary clamps applied.
    pub fn sanitized(&self) -> Self {
        let mut channels = self.channels.clone();
        if channels.is_empty() {
            channels.push(CollisionChannel::Pawn);
        }
        Self {
            max_distance: non_negative(self.max_distance),
            num_samples: self.num_samples.clamp(DASH_MIN_SAMPLES, DASH_MAX_SAMPLES),
            desired_direction: self.desired_direction,
            project_to_nav: self.project_to_nav,
            snap_to_ground: self.snap_to_ground,
            max_height_delta: non_negative(self.max_height_delta),
            clearance_buffer: non_negative(self.clearance_buffer),
            channels,
            debug_seconds: non_negative(self.debug_seconds),
        }
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

/// Outcome of a dash query. `end_location` and `facing` are meaningless when
/// `found` is false.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashQueryResult {
    pub found: bool,
    /// Validated capsule centre
    pub end_location: Vec3,
    /// Rotation of the travel direction
    pub facing: Quat,
    /// Planar distance from start to end
    pub travel: f32,
}

impl DashQueryResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            end_location: Vec3::ZERO,
            facing: Quat::IDENTITY,
            travel: 0.0,
        }
    }
}

/// Ask for a dash endpoint for `agent`.
#[derive(Event, Debug, Clone)]
pub struct DashRequest {
    pub agent: Entity,
    pub params: DashQueryParams,
}

/// Answer to a [`DashRequest`], for movement and animation consumers.
#[derive(Event, Debug, Clone, Copy)]
pub struct DashResolved {
    pub agent: Entity,
    pub result: DashQueryResult,
}

/// System: resolve pending dash requests and start dash motion.
#[allow(clippy::too_many_arguments)]
pub fn resolve_dash_requests(
    mut commands: Commands,
    mut requests: EventReader<DashRequest>,
    mut resolved: EventWriter<DashResolved>,
    rapier: ReadDefaultRapierContext,
    nav_areas: Query<&NavArea>,
    mut agents: Query<(
        &mut Transform,
        Option<&CharacterCapsule>,
        Option<&CollisionGroups>,
        Option<&DashMotion>,
    )>,
    settings: Res<DashSettings>,
    diagnostics: Res<Diagnostics>,
    mut debug_queue: ResMut<DebugDrawQueue>,
) {
    if requests.is_empty() {
        return;
    }
    let scene = RapierScene::new(rapier.single(), nav_areas.iter().copied().collect());

    for request in requests.read() {
        let Ok((mut transform, capsule, groups, active)) = agents.get_mut(request.agent) else {
            warn!(agent = ?request.agent, "dash request for missing agent");
            continue;
        };
        let agent = AgentState::from_transform(
            request.agent,
            &transform,
            capsule.copied().unwrap_or_default(),
        );

        let draw_seconds = if diagnostics.enabled {
            request.params.debug_seconds.max(0.0)
        } else {
            0.0
        };
        let result = resolve_dash_endpoint_traced(&agent, &request.params, &scene, |sample| {
            if draw_seconds > 0.0 {
                debug_queue.push(DebugShape::dash_sample(&sample, agent.capsule), draw_seconds);
            }
        });

        resolved.send(DashResolved {
            agent: request.agent,
            result,
        });

        if !result.found {
            continue;
        }
        if result.travel < settings.min_distance {
            info!(
                agent = ?request.agent,
                travel = result.travel,
                "dash cancelled: no landing spot far enough away"
            );
            continue;
        }

        transform.rotation = math::yaw_rotation(math::yaw_of(result.facing));
        let (motion, ghost) = DashMotion::new(result.end_location, settings.speed)
            .ghosted(groups.copied(), active);
        let mut dasher = commands.entity(request.agent);
        dasher.insert(motion);
        if let Some(ghost) = ghost {
            dasher.insert(ghost);
        }
    }
}
